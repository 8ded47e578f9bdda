use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ndtmeta_session::{ArchivalData, MetaError, MetricsSnapshot};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MetaOutput<'a> {
    client: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a ArchivalData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: String,
}

#[derive(Serialize)]
struct SubmitOutput<'a> {
    server: &'a str,
    submitted: usize,
    finalized: bool,
}

/// Print the outcome of one meta test exchange.
pub fn print_meta_result(
    client: SocketAddr,
    result: &Result<ArchivalData, MetaError>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = match result {
                Ok(data) => MetaOutput {
                    client: client.to_string(),
                    ok: true,
                    meta: Some(data),
                    step: None,
                    error: None,
                    timestamp: now_unix_seconds(),
                },
                Err(err) => MetaOutput {
                    client: client.to_string(),
                    ok: false,
                    meta: None,
                    step: Some(err.step()),
                    error: Some(err.to_string()),
                    timestamp: now_unix_seconds(),
                },
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => match result {
            Ok(data) => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["CLIENT", "NAME", "VALUE"]);
                for (name, value) in data {
                    table.add_row(vec![client.to_string(), name.clone(), value.clone()]);
                }
                println!("{table}");
            }
            Err(err) => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["CLIENT", "STEP", "ERROR"])
                    .add_row(vec![client.to_string(), err.step().to_string(), err.to_string()]);
                println!("{table}");
            }
        },
        OutputFormat::Pretty => match result {
            Ok(data) => {
                println!("client={} values={}", client, data.len());
                for (name, value) in data {
                    println!("  {name}={value}");
                }
            }
            Err(err) => println!("client={} step={} error={}", client, err.step(), err),
        },
    }
}

pub fn print_submitted(server: &str, submitted: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SubmitOutput {
                server,
                submitted,
                finalized: true,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SERVER", "SUBMITTED", "FINALIZED"])
                .add_row(vec![server.to_string(), submitted.to_string(), "yes".to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("server={server} submitted={submitted} finalized=yes"),
    }
}

pub fn print_metrics(snapshot: &MetricsSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["METRIC", "LABELS", "VALUE"]);
            for error in &snapshot.errors {
                table.add_row(vec![
                    "error_count".to_string(),
                    format!("test={} step={}", error.test, error.step),
                    error.count.to_string(),
                ]);
            }
            let histogram = &snapshot.submitted_meta_values;
            table.add_row(vec![
                "submitted_meta_values".to_string(),
                format!("count={}", histogram.count),
                format!("sum={}", histogram.sum),
            ]);
            println!("{table}");
        }
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
