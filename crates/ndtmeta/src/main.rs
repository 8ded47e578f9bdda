mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "ndtmeta", version, about = "NDT5 meta test server and client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). `RUST_LOG` takes precedence when set.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_subcommand() {
        let cli = Cli::try_parse_from([
            "ndtmeta",
            "serve",
            "127.0.0.1:3001",
            "--max-messages",
            "5",
            "--timeout",
            "500ms",
            "--encoding",
            "json",
        ])
        .expect("serve args should parse");

        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.max_messages, 5);
                assert_eq!(args.timeout, "500ms");
                assert!(matches!(args.encoding, cmd::EncodingArg::Json));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_repeated_submit_lines() {
        let cli = Cli::try_parse_from([
            "ndtmeta",
            "submit",
            "127.0.0.1:3001",
            "--line",
            "client.os:linux",
            "--line",
            "client.browser:firefox",
        ])
        .expect("submit args should parse");

        match cli.command {
            Command::Submit(args) => assert_eq!(args.lines.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_encoding() {
        let err = Cli::try_parse_from([
            "ndtmeta",
            "serve",
            "127.0.0.1:3001",
            "--encoding",
            "xml",
        ])
        .expect_err("unknown encoding should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
