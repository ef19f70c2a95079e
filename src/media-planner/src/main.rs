//! Media Planner: campaign metrics engine and plan workspace.
//!
//! `serve` starts the REST API and the Prometheus exporter. The other
//! subcommands run the engine over JSON files and print JSON to stdout.

use anyhow::Context;
use clap::{Parser, Subcommand};
use planner_api::{ApiServer, AppState};
use planner_core::config::AppConfig;
use planner_core::plan::{MonthlyCampaigns, PlanDraft, PlanSnapshot};
use planner_core::types::CampaignDraft;
use planner_metrics::{
    calculate_kpis, calculate_plan_summary, recalculate_campaign_metrics, KpiTemplateCatalog,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "media-planner")]
#[command(about = "Campaign metrics engine and media plan workspace")]
#[command(version)]
struct Cli {
    /// Config file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "MEDIA_PLANNER_CONFIG")]
    config: Option<String>,

    /// KPI template file (overrides config)
    #[arg(long, global = true, env = "MEDIA_PLANNER__ENGINE__TEMPLATES_PATH")]
    templates: Option<String>,

    /// Coerce invalid input to zero instead of rejecting it
    #[arg(long, global = true, default_value_t = false)]
    lenient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the REST API and metrics exporter
    Serve {
        /// Node identifier (overrides config)
        #[arg(long, env = "MEDIA_PLANNER__NODE_ID")]
        node_id: Option<String>,

        /// HTTP port (overrides config)
        #[arg(long, env = "MEDIA_PLANNER__API__HTTP_PORT")]
        http_port: Option<u16>,

        /// Metrics port (overrides config)
        #[arg(long, env = "MEDIA_PLANNER__METRICS__PORT")]
        metrics_port: Option<u16>,
    },
    /// Recalculate every metric of one campaign or an array of campaigns
    Recalculate {
        #[arg(long, short)]
        input: PathBuf,
    },
    /// Build campaigns from drafts, applying objective templates
    Kpis {
        #[arg(long, short)]
        input: PathBuf,
    },
    /// Summarize a plan (month -> campaigns)
    Summarize {
        #[arg(long, short)]
        input: PathBuf,

        /// Input holds drafts; build them through the templates first
        #[arg(long, default_value_t = false)]
        from_drafts: bool,
    },
    /// List the KPI template catalog
    Templates,
}

/// A file holding either a single value or an array of them.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn map<U>(self, mut f: impl FnMut(T) -> U) -> OneOrMany<U> {
        match self {
            Self::Many(items) => OneOrMany::Many(items.into_iter().map(f).collect()),
            Self::One(item) => OneOrMany::One(f(item)),
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Self::Many(items) => Box::new(items.iter()),
            Self::One(item) => Box::new(std::iter::once(item)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays pure JSON for the file commands.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "media_planner=info,planner_api=info,planner_metrics=info,tower_http=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(path) = cli.templates {
        config.engine.templates_path = Some(path);
    }
    if cli.lenient {
        config.engine.strict_validation = false;
    }

    let catalog = load_catalog(&config)?;

    match cli.command {
        Command::Serve {
            node_id,
            http_port,
            metrics_port,
        } => {
            if let Some(node_id) = node_id {
                config.node_id = node_id;
            }
            if let Some(port) = http_port {
                config.api.http_port = port;
            }
            if let Some(port) = metrics_port {
                config.metrics.port = port;
            }
            serve(config, catalog).await
        }
        Command::Recalculate { input } => {
            let drafts: OneOrMany<CampaignDraft> = read_json(&input)?;
            check_drafts(&config, drafts.iter())?;
            let campaigns = drafts.map(|d| recalculate_campaign_metrics(&d.into_campaign()));
            print_json(&campaigns)
        }
        Command::Kpis { input } => {
            let drafts: OneOrMany<CampaignDraft> = read_json(&input)?;
            check_drafts(&config, drafts.iter())?;
            let campaigns = drafts.map(|d| calculate_kpis(d, &catalog));
            print_json(&campaigns)
        }
        Command::Summarize { input, from_drafts } => {
            let months = if from_drafts {
                let draft: PlanDraft = read_json(&input)?;
                build_months(&config, &catalog, &draft)?
            } else {
                let snapshot: PlanSnapshot = read_json(&input)?;
                snapshot.months
            };
            print_json(&calculate_plan_summary(&months))
        }
        Command::Templates => {
            let entries: Vec<_> = catalog.entries().collect();
            print_json(&entries)
        }
    }
}

async fn serve(config: AppConfig, catalog: KpiTemplateCatalog) -> anyhow::Result<()> {
    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        strict_validation = config.engine.strict_validation,
        "Media Planner starting up"
    );

    let state = AppState::new(
        catalog,
        config.engine.strict_validation,
        config.node_id.clone(),
    );
    let api_server = ApiServer::new(config, state);

    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Media Planner is ready to serve traffic");
    api_server.start_http().await
}

fn load_catalog(config: &AppConfig) -> anyhow::Result<KpiTemplateCatalog> {
    match config.engine.templates_path.as_deref() {
        Some(path) => Ok(KpiTemplateCatalog::from_file(path)?),
        None => {
            info!("Using built-in KPI template catalog");
            Ok(KpiTemplateCatalog::builtin())
        }
    }
}

fn check_drafts<'a>(
    config: &AppConfig,
    drafts: impl Iterator<Item = &'a CampaignDraft>,
) -> anyhow::Result<()> {
    if !config.engine.strict_validation {
        return Ok(());
    }
    for (index, draft) in drafts.enumerate() {
        draft
            .validate()
            .with_context(|| format!("campaign {index} is invalid"))?;
    }
    Ok(())
}

fn build_months(
    config: &AppConfig,
    catalog: &KpiTemplateCatalog,
    draft: &PlanDraft,
) -> anyhow::Result<MonthlyCampaigns> {
    let parsed = if config.engine.strict_validation {
        draft.validate()?
    } else {
        draft.parse_months()?
    };
    Ok(parsed
        .into_iter()
        .map(|(month, drafts)| {
            let campaigns = drafts
                .iter()
                .cloned()
                .map(|d| calculate_kpis(d, catalog))
                .collect();
            (month, campaigns)
        })
        .collect())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
