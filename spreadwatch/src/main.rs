use std::process::ExitCode;

use spreadwatch::{SpreadConfig, Spreadwatch};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cfg = match SpreadConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("spreadwatch: {e}");
            return ExitCode::FAILURE;
        }
    };
    let app = match Spreadwatch::from_config(&cfg) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("spreadwatch: {e}");
            return ExitCode::FAILURE;
        }
    };

    match app.run().await {
        Ok(report) => {
            for (source, err) in report
                .sources
                .iter()
                .filter_map(|s| s.error.as_ref().map(|e| (&s.name, e)))
            {
                eprintln!("spreadwatch: warning: {source}: {err}");
            }
            let span = match (report.first_ts, report.last_ts) {
                (Some(first), Some(last)) => format!(" from {first} to {last}"),
                _ => String::new(),
            };
            println!(
                "wrote {} rows{span} to {} and {}",
                report.rows_written,
                cfg.output.csv_path().display(),
                cfg.output.json_path().display(),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("spreadwatch: {e}");
            ExitCode::FAILURE
        }
    }
}
