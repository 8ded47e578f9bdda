use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use ndtmeta_session::Encoding;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod serve;
pub mod submit;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept clients and run the meta test on each connection.
    Serve(ServeArgs),
    /// Connect to a server and submit meta data lines.
    Submit(SubmitArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Submit(args) => submit::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Payload encoding on the control connection.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum EncodingArg {
    Plain,
    Json,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Plain => Encoding::Plain,
            EncodingArg::Json => Encoding::Json,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (e.g. 127.0.0.1:3001).
    pub addr: String,
    /// Maximum number of meta lines accepted per client.
    #[arg(long, default_value = "20")]
    pub max_messages: usize,
    /// Deadline for the whole meta exchange (e.g. 15s, 500ms).
    #[arg(long, default_value = "15s")]
    pub timeout: String,
    /// Read/write timeout for each message on the connection.
    #[arg(long, default_value = "10s")]
    pub message_timeout: String,
    /// Payload encoding.
    #[arg(long, value_enum, default_value = "plain")]
    pub encoding: EncodingArg,
    /// Exit after N exchanges, successful or not.
    #[arg(long)]
    pub count: Option<usize>,
    /// Print collected metrics before exiting.
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Server address to connect to.
    pub addr: String,
    /// Meta line to send, `name:value`. Repeatable.
    #[arg(long = "line", short = 'l', value_name = "NAME:VALUE")]
    pub lines: Vec<String>,
    /// Payload encoding.
    #[arg(long, value_enum, default_value = "plain")]
    pub encoding: EncodingArg,
    /// Connect and per-message timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
