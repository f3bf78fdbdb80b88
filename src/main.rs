use std::{process, sync::Arc};

use filmow_export::{ExportError, ExportSummary, Exporter, HttpFetcher, ProgressLine, cli::Cli};
use tracing_subscriber::{filter::LevelFilter, fmt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose));

    match run(&cli).await {
        Ok(_) => println!("Done!"),
        Err(err) => {
            eprintln!("{err}");
            process::exit(err.exit_code());
        }
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

/// Warnings are always shown; each `-v` adds a level
fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

async fn run(cli: &Cli) -> Result<ExportSummary, ExportError> {
    let config = cli.to_config()?;
    let fetcher = HttpFetcher::new().map_err(ExportError::Client)?;

    let mut exporter = Exporter::new(config, Arc::new(fetcher))?;
    exporter.register_observer(Arc::new(ProgressLine::new()));

    let target = exporter.resolve(cli.target())?;
    exporter.run(&target).await
}
