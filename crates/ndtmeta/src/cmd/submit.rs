use std::net::{TcpStream, ToSocketAddrs};

use ndtmeta_frame::FrameConfig;
use ndtmeta_session::{submit_meta, FramedMessager};

use crate::cmd::{parse_duration, SubmitArgs};
use crate::exit::{io_error, protocol_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_submitted, OutputFormat};

pub fn run(args: SubmitArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let addr = args
        .addr
        .to_socket_addrs()
        .map_err(|err| io_error("resolve failed", err))?
        .next()
        .ok_or_else(|| CliError::new(USAGE, format!("no address for {}", args.addr)))?;

    let stream =
        TcpStream::connect_timeout(&addr, timeout).map_err(|err| io_error("connect failed", err))?;
    let frame_config = FrameConfig {
        read_timeout: Some(timeout),
        write_timeout: Some(timeout),
        ..FrameConfig::default()
    };
    let mut messager = FramedMessager::from_tcp(stream, frame_config, args.encoding.into())
        .map_err(|err| protocol_error("connect failed", err))?;

    let lines = args
        .lines
        .iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    for line in &lines {
        if !line.contains(':') {
            tracing::warn!(line = %line, "line has no ':' and will be ignored by the server");
        }
    }

    submit_meta(&mut messager, lines.as_slice())
        .map_err(|err| protocol_error("meta test failed", err))?;
    print_submitted(&args.addr, lines.len(), format);

    Ok(SUCCESS)
}
