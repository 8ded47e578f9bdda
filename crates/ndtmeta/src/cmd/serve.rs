use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ndtmeta_frame::FrameConfig;
use ndtmeta_session::{manage_test_with_config, metrics, FramedMessager, MetaConfig, TestScope};

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{io_error, meta_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_meta_result, print_metrics, OutputFormat};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.max_messages == 0 {
        return Err(CliError::new(USAGE, "--max-messages must be at least 1"));
    }
    let config = MetaConfig {
        max_client_messages: args.max_messages,
        timeout: parse_duration(&args.timeout)?,
        ..MetaConfig::default()
    };
    let message_timeout = parse_duration(&args.message_timeout)?;
    let frame_config = FrameConfig {
        read_timeout: Some(message_timeout),
        write_timeout: Some(message_timeout),
        ..FrameConfig::default()
    };

    let listener = TcpListener::bind(&args.addr).map_err(|err| io_error("bind failed", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| io_error("bind failed", err))?;
    let local_addr = listener
        .local_addr()
        .map_err(|err| io_error("bind failed", err))?;
    tracing::info!(addr = %local_addr, "listening for meta test clients");

    let root = TestScope::new();
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), root.clone())?;

    let mut exchanges = 0usize;
    let mut last_failure = None;
    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| exchanges >= count) {
            break;
        }

        let (stream, client) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
                continue;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("accept failed", err)),
        };

        if let Err(err) = stream.set_nonblocking(false) {
            tracing::warn!(client = %client, error = %err, "dropping client");
            continue;
        }
        let mut messager =
            match FramedMessager::from_tcp(stream, frame_config.clone(), args.encoding.into()) {
                Ok(messager) => messager,
                Err(err) => {
                    tracing::warn!(client = %client, error = %err, "dropping client");
                    continue;
                }
            };
        exchanges += 1;

        let span = tracing::info_span!("meta", client = %client);
        let _entered = span.enter();
        let result = manage_test_with_config(&root, &mut messager, &config, metrics::global());
        match &result {
            Ok(data) => tracing::info!(values = data.len(), "meta test finished"),
            Err(err) => tracing::info!(step = err.step(), "meta test aborted"),
        }
        print_meta_result(client, &result, format);
        if let Err(err) = result {
            last_failure = Some(err);
        }
    }

    if args.metrics {
        print_metrics(&metrics::global().snapshot(), format);
    }

    // Only bounded runs report exchange failures through the exit code.
    match last_failure {
        Some(err) if args.count.is_some() => Err(meta_error("meta test failed", err)),
        _ => Ok(SUCCESS),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>, root: TestScope) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        root.cancel();
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
