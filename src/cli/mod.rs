//! Command-line surface.
//!
//! # Usage
//!
//! ```bash
//! # One-time browser consent; stores config/google_ads_token.json
//! adsctl authorize
//!
//! # Reports
//! adsctl accounts
//! adsctl performance --customer-id 123-456-7890 --days 7
//! adsctl query --customer-id 1234567890 --sample campaigns --format csv
//! adsctl optimize --customer-id 1234567890 --target-roas 4 --target-ctr 2.5
//!
//! # Simulated mutations
//! adsctl create-campaign --customer-id 1234567890 --name "Spring" --budget 25 \
//!     --keywords "running shoes,trail shoes"
//! adsctl campaign pause --customer-id 1234567890 --campaign-id 42
//! ```

mod auth;
mod campaign;
mod context;
mod data;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use context::Context;

use crate::config::AdsConfig;
use crate::domain::ReportFormat;
use crate::error::AdsError;

/// Google Ads reporting from the command line
#[derive(Parser, Debug)]
#[command(name = "adsctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Output format: table, csv or json
    #[arg(short, long, global = true, default_value = "table")]
    pub format: ReportFormat,

    /// Directory for result artifacts (overrides GOOGLE_ADS_RESULTS_DIR)
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    /// Directory holding .env and the credential file (overrides GOOGLE_ADS_CONFIG_DIR)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Print results without writing artifacts
    #[arg(long, global = true)]
    pub no_save: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    /// Default log filter for the chosen verbosity.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the OAuth2 consent flow and store credentials
    Authorize(auth::AuthorizeArgs),

    /// List accounts accessible with the stored credentials
    Accounts,

    /// Campaign or ad performance over the last N days
    Performance(data::PerformanceArgs),

    /// Run a GAQL query or one of the sample queries
    Query(data::QueryArgs),

    /// List the sample queries
    Samples,

    /// Simulate creating a search campaign (nothing is sent)
    CreateCampaign(campaign::CreateCampaignArgs),

    /// Inspect a campaign or simulate budget/status changes
    Campaign(campaign::CampaignArgs),

    /// Analyze campaign performance against ROAS and CTR targets
    Optimize(data::OptimizeArgs),

    /// Delete the stored credentials
    Logout,

    /// Check configuration and stored credentials
    Doctor,
}

/// Loads configuration, applies global overrides and runs the command.
///
/// # Errors
///
/// Returns the command's error; the binary maps it to an exit code.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(dir) = &cli.global.config_dir {
        let env_file = dir.join(".env");
        if env_file.exists() {
            dotenvy::from_path(&env_file)
                .map_err(|e| AdsError::Config(format!("cannot load {}: {e}", env_file.display())))?;
        }
    }
    let mut config = AdsConfig::from_env()?;
    if let Some(dir) = &cli.global.config_dir {
        config.config_dir.clone_from(dir);
    }
    if let Some(dir) = &cli.global.results_dir {
        config.results_dir.clone_from(dir);
    }
    let ctx = Context::new(config, &cli.global);
    tracing::debug!(format = %ctx.format(), config_dir = %ctx.config().config_dir.display(), "starting command");

    match cli.command {
        Command::Authorize(args) => auth::authorize(&ctx, &args).await,
        Command::Accounts => data::accounts(&ctx).await,
        Command::Performance(args) => data::performance(&ctx, &args).await,
        Command::Query(args) => data::query(&ctx, &args).await,
        Command::Samples => data::samples(&ctx),
        Command::CreateCampaign(args) => campaign::create(&ctx, &args),
        Command::Campaign(args) => campaign::run(&ctx, &args).await,
        Command::Optimize(args) => data::optimize(&ctx, &args).await,
        Command::Logout => auth::logout(&ctx),
        Command::Doctor => auth::doctor(&ctx),
    }
}
