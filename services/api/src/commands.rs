use crate::infra::build_service;
use clap::Args;
use eligibility_lookup::config::AppConfig;
use eligibility_lookup::error::AppError;
use eligibility_lookup::telemetry;
use eligibility_lookup::workflows::eligibility::parse_addresses;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with an `address` column
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write the results CSV
    #[arg(long, default_value = "batch_results.csv")]
    pub(crate) output: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// Free-text street address; multiple words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    words: Vec<String>,
}

impl LookupArgs {
    pub(crate) fn address(&self) -> String {
        self.words.join(" ")
    }
}

fn prepare() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

pub(crate) async fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let addresses = parse_addresses(File::open(&args.input)?)?;
    let service = build_service(&config)?;

    let report = service.process_batch(&addresses).await;
    report.write_csv(BufWriter::new(File::create(&args.output)?))?;

    println!("Batch lookup complete");
    println!("  Input: {}", args.input.display());
    println!("  Rows processed: {}", report.rows.len());
    println!("  Rows failed: {}", report.failed_count());
    println!("  Results written to {}", args.output.display());
    Ok(())
}

pub(crate) async fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let service = build_service(&config)?;

    let report = service.lookup(&args.address()).await?;
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Lookup outcome unavailable: {err}"),
    }
    Ok(())
}
