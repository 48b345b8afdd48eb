//! adsctl entry point.
//!
//! Parses the command line, sets up logging on stderr and maps failures to
//! the exit codes of [`AdsError`].

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use adsctl::cli::{self, Cli, GlobalArgs};
use adsctl::error::AdsError;

fn init_logging(global: &GlobalArgs) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(global.log_level()));

    let registry = tracing_subscriber::registry().with(filter);
    if global.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Before parsing, so `.env` can supply GOOGLE_ADS_CUSTOMER_ID.
    adsctl::config::load_env_files();
    let cli = Cli::parse();
    init_logging(&cli.global);

    if let Err(e) = cli::run(cli).await {
        let code = match e.downcast_ref::<AdsError>() {
            Some(ads) => {
                eprintln!("error: {ads}");
                eprintln!("{}", ads.remediation());
                ads.exit_code()
            }
            None => {
                eprintln!("error: {e:#}");
                1
            }
        };
        tracing::debug!(code, "exiting with failure");
        std::process::exit(code);
    }
}
