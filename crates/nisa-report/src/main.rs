use anyhow::{Context, Result};
use nisa_calculator::NisaSettings;

mod snapshot;

use snapshot::LedgerSnapshot;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // logs go to stderr so stdout stays valid JSON
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1).filter(|a| !a.starts_with("--")) else {
        eprintln!("Usage:");
        eprintln!("  nisa-report <snapshot.json>                 Print the NISA report as JSON");
        eprintln!("  nisa-report <snapshot.json> --tax-year N    Report on tax year N");
        std::process::exit(2);
    };
    let tax_year: Option<i32> = args
        .iter()
        .position(|a| a == "--tax-year")
        .and_then(|i| args.get(i + 1))
        .map(|v| v.parse())
        .transpose()
        .context("--tax-year must be a year")?;

    let settings = NisaSettings::from_env()?;
    tracing::info!(
        "Settings loaded: tax rate {:.5}, alerts at {}%/{}%",
        settings.assumed_tax_rate,
        settings.alerts.warning_rate,
        settings.alerts.critical_rate
    );

    let mut snapshot = LedgerSnapshot::load(path)?;
    if tax_year.is_some() {
        snapshot.tax_year = tax_year;
    }
    tracing::info!(
        "Loaded {} transactions and {} prices from {}",
        snapshot.transactions.len(),
        snapshot.prices.len(),
        path
    );

    let (calculator, summary) = snapshot.into_calculator(settings)?;
    tracing::info!(
        "Imported {} transactions ({} failed validation, {} skipped)",
        summary.imported,
        summary.flagged,
        summary.skipped
    );

    let report = calculator.report();
    for alert in &report.alerts {
        tracing::info!("[{:?}] {}", alert.alert_type, alert.message);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
