//! Terminal entry point: argument parsing, logging and command dispatch.

pub mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{Level, info};

use lokiprobe_adapter_kube::{KubeConfigStore, KubeProcessGroups};
use lokiprobe_adapter_loki::LokiClient;
use lokiprobe_application::{ConfigPatcher, PortSet, RolloutWaiter, Workflow};
use lokiprobe_domain::{ProbeConfig, RunReport, VariantConfig};
use lokiprobe_ports::TracingEventSink;

pub use cli::{Cli, Command, OutputFormat};

pub async fn run() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli::config_path(cli.config.as_deref());
    let config = ProbeConfig::load_from_path(&config_path)?;
    info!("Loaded config from {}", config_path.display());

    let ports = connect_ports(&config).await?;
    let sink = TracingEventSink;

    match cli.command {
        Command::Run { variants } => {
            let selected = select_variants(&config.variants, &variants)?;
            let workflow = Workflow::new(&config, ports);
            let reports = workflow.run(&selected, &sink).await?;
            print_reports(&reports, cli.output)?;
        }
        Command::Patch { fragment } => {
            let patcher = ConfigPatcher::new(ports.config_store);
            patcher
                .merge_and_publish(&config.document_ref(), &fragment, &sink)
                .await?;
        }
        Command::Restart => {
            Workflow::new(&config, ports).roll_groups(&sink).await?;
        }
        Command::Wait {
            group,
            timeout_secs,
        } => {
            let waiter =
                RolloutWaiter::new(ports.process_groups, config.rollout.poll_interval());
            let timeout = timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.rollout.timeout());
            let groups: Vec<_> = config
                .process_groups
                .iter()
                .filter(|candidate| group.as_deref().is_none_or(|name| candidate.name == name))
                .collect();
            if groups.is_empty() {
                bail!("no configured process group matches");
            }
            for target in groups {
                waiter.wait_for_ready(target, timeout, &sink).await?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

async fn connect_ports(config: &ProbeConfig) -> Result<PortSet> {
    let client = lokiprobe_adapter_kube::connect().await?;
    let loki = LokiClient::from_config(&config.loki)?;
    Ok(PortSet {
        config_store: Arc::new(KubeConfigStore::new(client.clone())),
        process_groups: Arc::new(KubeProcessGroups::new(client)),
        queries: Arc::new(loki),
    })
}

/// Keep configuration order; every requested name must exist.
pub fn select_variants(
    variants: &[VariantConfig],
    requested: &[String],
) -> Result<Vec<VariantConfig>> {
    if requested.is_empty() {
        return Ok(variants.to_vec());
    }
    if let Some(unknown) = requested
        .iter()
        .find(|name| !variants.iter().any(|variant| &variant.name == *name))
    {
        bail!("unknown variant `{unknown}`");
    }
    Ok(variants
        .iter()
        .filter(|variant| requested.contains(&variant.name))
        .cloned()
        .collect())
}

fn print_reports(reports: &[RunReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for report in reports {
                print!("{}", report.render());
            }
        }
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(reports).context("failed to encode reports")?;
            println!("{json}");
        }
    }
    Ok(())
}
