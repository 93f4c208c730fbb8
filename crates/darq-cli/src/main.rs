//! darq — Data-at-Rest Quarantine runner
//!
//! Invoked per incident by the DLP scanner's policy action:
//!
//! ```bash
//! darq process /incidents/4211337.xml
//! darq process /incidents/4211337.xml --dry-run
//! darq check-config --config /etc/darq/policy.toml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use darq_core::pipeline::PipelineOutcome;
use darq_core::{
    IncidentPipeline, IncidentRecord, PolicyConfig, RuleCatalog, ShareMap,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "darq")]
#[command(version = "0.1.0")]
#[command(about = "Data-at-rest quarantine policy runner", long_about = None)]
struct Cli {
    /// Policy configuration file
    #[arg(long, env = "DARQ_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one incident document
    Process {
        /// Incident XML file emitted by the scanner
        incident: PathBuf,

        /// Parse and enrich only; report the decision without moving
        /// files or sending mail
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the configuration and the share map
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PolicyConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PolicyConfig::default(),
    };
    config.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Process { incident, dry_run } => process(config, &incident, dry_run).await,
        Commands::CheckConfig => check_config(config),
    }
}

async fn process(config: PolicyConfig, incident_path: &PathBuf, dry_run: bool) -> anyhow::Result<()> {
    let record = IncidentRecord::from_xml_file(incident_path)
        .with_context(|| format!("parsing incident {}", incident_path.display()))?;

    let share_map = ShareMap::load(&config.share_map_path)
        .with_context(|| format!("loading share map {}", config.share_map_path.display()))?;

    if dry_run {
        return report_dry_run(&config, record, share_map);
    }

    let resolver = Arc::new(darq_core::directory::RestDirectory::new(
        config.directory_endpoints.clone(),
    ));
    let mailer = Arc::new(darq_core::notify::SmtpMailer::new(
        &config.relay_host,
        config.relay_port,
    ));
    let pipeline = IncidentPipeline::new(
        config,
        RuleCatalog::production(),
        share_map,
        resolver,
        mailer,
    );

    let report = pipeline.process(record).await?;
    match &report.outcome {
        PipelineOutcome::Skipped(reason) => {
            println!("incident {}: skipped ({reason:?})", report.incident_id);
        }
        PipelineOutcome::Processed { quarantine, notification } => {
            println!(
                "incident {}: quarantine moved={}, notification {notification:?}",
                report.incident_id,
                quarantine.moved()
            );
        }
    }
    Ok(())
}

/// Enrichment-only pass: shows what the pipeline would decide.
fn report_dry_run(
    config: &PolicyConfig,
    record: IncidentRecord,
    share_map: ShareMap,
) -> anyhow::Result<()> {
    let catalog = RuleCatalog::production();
    let (rules, classifiers) = catalog.classify(&record.rule_ids);
    let (folder, file) = share_map.translate(&record.file_path);
    let severity = darq_core::Severity::from_match_count(record.max_matches());
    let region = darq_core::Region::from_path(&record.file_path, &config.site_tokens);

    println!("incident:    {}", record.incident_id);
    println!("severity:    {severity}");
    println!("region:      {}", region.map(|r| r.to_string()).unwrap_or_else(|| "undetermined".into()));
    println!("owner:       {}", record.owner_id);
    println!("resource:    {}", record.resource_type);
    println!("display:     {folder} / {file}");
    println!("rules:       {}", rules.join(", "));
    println!("classifiers: {}", classifiers.join(", "));
    Ok(())
}

fn check_config(config: PolicyConfig) -> anyhow::Result<()> {
    ShareMap::load(&config.share_map_path)
        .with_context(|| format!("loading share map {}", config.share_map_path.display()))?;
    println!("configuration OK");
    Ok(())
}
