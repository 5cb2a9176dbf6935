mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::{error, info};

use output::json::JsonSink;
use output::raw::RawSink;
use output::summary::SummarySink;
use output::{CanonicalEvent, OutputSink};
use sqlshape::digest::DigestCollector;
use sqlshape::get_canonical_query;
use sqlshape::source::{run_source, SourceMessage};
use sqlshape::splitter::SplitMode;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Raw,
    Summary,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sqlshape", about = "Canonicalize SQL statements and group them by shape")]
struct Cli {
    /// Input file; reads stdin when omitted
    file: Option<PathBuf>,

    /// Canonicalize a single statement and exit
    #[arg(short = 'e', long = "execute", conflicts_with = "file")]
    execute: Option<String>,

    /// Output mode: raw (one shape per statement), summary (digest table) or json
    #[arg(short = 'm', long = "mode", value_enum, default_value = "raw")]
    mode: Mode,

    /// How input is split into statements
    #[arg(short = 's', long = "split", value_enum, default_value = "script")]
    split: SplitMode,

    /// Number of shapes in summary and json reports
    #[arg(short = 'n', long = "top", default_value = "20")]
    top: usize,

    /// Raw mode: also print timing and the raw statement
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sqlshape=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(sql) = cli.execute {
        println!("{}", get_canonical_query(&sql));
        return Ok(());
    }

    let (tx, rx) = mpsc::channel::<SourceMessage>(1024);
    let split = cli.split;

    let source_handle = match cli.file {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            info!("Reading {} ({split:?} mode)", path.display());
            tokio::spawn(async move {
                if let Err(e) = run_source(file, split, tx).await {
                    error!("Input error: {e}");
                }
            })
        }
        None => {
            info!("Reading stdin ({split:?} mode)");
            tokio::spawn(async move {
                if let Err(e) = run_source(tokio::io::stdin(), split, tx).await {
                    error!("Input error: {e}");
                }
            })
        }
    };

    let sink: Box<dyn OutputSink> = match cli.mode {
        Mode::Raw => Box::new(RawSink::new(cli.verbose)),
        Mode::Summary => Box::new(SummarySink::new(cli.top)),
        Mode::Json => Box::new(JsonSink::new(cli.top)),
    };

    run_consumer(rx, sink).await;
    source_handle.abort();

    Ok(())
}

/// Canonicalize incoming statements until input ends or Ctrl-C, then let
/// the sink print its report.
async fn run_consumer(mut rx: mpsc::Receiver<SourceMessage>, mut sink: Box<dyn OutputSink>) {
    let mut digests = DigestCollector::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(SourceMessage::Statement(statement)) => {
                    let canonical = digests
                        .record(&statement.sql, statement.duration)
                        .canonical
                        .clone();
                    sink.handle_event(&CanonicalEvent {
                        wall_time: chrono::Local::now(),
                        seq: statement.seq,
                        sql: statement.sql,
                        canonical,
                        duration: statement.duration,
                    });
                }
                Some(SourceMessage::Finished { statements }) => {
                    info!(
                        "{statements} statements, {} distinct shapes",
                        digests.distinct_shapes()
                    );
                    break;
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                info!("Interrupted, flushing report...");
                break;
            }
        }
    }

    sink.shutdown(&digests);
}
