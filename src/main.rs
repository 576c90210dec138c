use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use downscope_auth::{DownscopedCredentialSource, ReqwestTransport, StaticTokenCredential};
use downscope_config::{Config, LogConfig};
use downscope_types::{
    AccessBoundary, AccessBoundaryRule, AvailabilityCondition, BearerToken, DownscopedOptions,
};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(
    name = "downscope",
    about = "downscope: mint access-boundary restricted tokens from a root token"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exchange a root access token for a downscoped one and print it as JSON.
    Mint {
        /// Root access token to downscope.
        #[arg(long, env = "DOWNSCOPE_ROOT_TOKEN", hide_env_values = true)]
        token: String,
        /// Label identifying the root credential in logs.
        #[arg(long, default_value = "cli")]
        identity: String,
        #[command(flatten)]
        rule: RuleArgs,
    },
    /// Validate the access boundary and print the `options` document.
    Policy {
        #[command(flatten)]
        rule: RuleArgs,
    },
}

/// A single rule given on the command line; replaces the configured boundary.
#[derive(Args, Debug)]
struct RuleArgs {
    /// Resource name, e.g. //storage.googleapis.com/projects/_/buckets/NAME.
    #[arg(long)]
    resource: Option<String>,
    /// Permission on the resource (repeatable), e.g. inRole:roles/storage.objectViewer.
    #[arg(long = "permission", value_name = "PERMISSION", requires = "resource")]
    permissions: Vec<String>,
    /// Availability condition expression.
    #[arg(long, requires = "resource")]
    condition: Option<String>,
}

impl RuleArgs {
    fn options(&self, config: &Config) -> Result<DownscopedOptions> {
        let Some(resource) = &self.resource else {
            return config
                .downscoped_options()
                .context("no access boundary: set access_boundary in the config or pass --resource");
        };
        let mut rule = self
            .permissions
            .iter()
            .fold(AccessBoundaryRule::new(resource), |r, p| r.with_permission(p));
        if let Some(expr) = &self.condition {
            rule = rule.with_condition(AvailabilityCondition::new(expr));
        }
        Ok(DownscopedOptions::new(AccessBoundary::new(vec![rule])))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    init_logging(&config.log);

    match cli.command {
        Commands::Mint {
            token,
            identity,
            rule,
        } => cmd_mint(&config, token, identity, &rule).await,
        Commands::Policy { rule } => cmd_policy(&config, &rule),
    }
}

async fn cmd_mint(config: &Config, token: String, identity: String, rule: &RuleArgs) -> Result<()> {
    let options = rule.options(config)?;
    let transport = ReqwestTransport::with_timeout(config.timeout())
        .context("failed to build HTTP client")?;
    let root = StaticTokenCredential::from_access_token(identity, token, None);

    let source = DownscopedCredentialSource::with_transport(
        Arc::new(root),
        options,
        Arc::new(transport),
        config.exchange_config(),
    )?;
    let minted = source
        .get_token()
        .await
        .context("failed to mint downscoped token")?;

    println!("{}", render_token(&minted)?);
    Ok(())
}

/// `{"access_token": ..., "expiry": ...}` as printed by `mint`.
fn render_token(token: &BearerToken) -> Result<String> {
    Ok(serde_json::to_string_pretty(token)?)
}

fn cmd_policy(config: &Config, rule: &RuleArgs) -> Result<()> {
    let options = rule.options(config)?;
    println!("{}", options.to_json()?);
    Ok(())
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let json = log.json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text = (!log.json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}
