//! Credential commands: authorize, logout and doctor.

use std::time::Duration;

use chrono::Utc;
use clap::Args;

use crate::auth::{AuthSettings, ConsoleReceiver, CredentialStore, LoopbackReceiver, OAuthClient};
use crate::error::AdsError;

use super::Context;

/// Arguments of `authorize`.
#[derive(Args, Debug)]
pub struct AuthorizeArgs {
    /// Paste the redirected URL instead of running a local listener
    #[arg(long)]
    pub console: bool,

    /// Port of the local redirect listener (overrides GOOGLE_ADS_CALLBACK_PORT)
    #[arg(long, conflicts_with = "console")]
    pub port: Option<u16>,
}

pub(super) async fn authorize(ctx: &Context, args: &AuthorizeArgs) -> anyhow::Result<()> {
    let config = ctx.config();
    let (client_id, client_secret) = config.require_client()?;
    let settings = AuthSettings {
        client: OAuthClient {
            client_id,
            client_secret,
        },
        developer_token: config.require_developer_token()?,
        login_customer_id: config.login_customer_id.clone(),
        auth_url: config.auth_url.clone(),
    };
    let authenticator = ctx.authenticator()?;

    let credentials = if args.console {
        let mut receiver = ConsoleReceiver::default();
        authenticator
            .authorize_interactive(&settings, &mut receiver)
            .await?
    } else {
        let port = args.port.unwrap_or(config.callback_port);
        let timeout = Duration::from_secs(config.callback_timeout_secs);
        let mut receiver = LoopbackReceiver::bind(port, timeout).await?;
        authenticator
            .authorize_interactive(&settings, &mut receiver)
            .await?
    };

    println!("Authorization complete.");
    println!("Credentials saved to {}", config.token_path().display());
    println!(
        "Access token valid until {}",
        credentials.access_token_expiry.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

pub(super) fn logout(ctx: &Context) -> anyhow::Result<()> {
    if ctx.authenticator()?.logout()? {
        println!("Removed {}", ctx.config().token_path().display());
    } else {
        println!("No stored credentials.");
    }
    Ok(())
}

pub(super) fn doctor(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.config();
    let missing = config.missing_required();
    for name in [
        "GOOGLE_ADS_CLIENT_ID",
        "GOOGLE_ADS_CLIENT_SECRET",
        "GOOGLE_ADS_DEVELOPER_TOKEN",
    ] {
        let status = if missing.contains(&name) { "missing" } else { "set" };
        println!("{name:<28} {status}");
    }
    let login = config
        .login_customer_id
        .as_ref()
        .map_or_else(|| "not set".to_string(), ToString::to_string);
    println!("{:<28} {login}", "GOOGLE_ADS_LOGIN_CUSTOMER_ID");
    println!("{:<28} {}", "API base URL", config.api_base_url);
    println!("{:<28} {}", "Results directory", config.results_dir.display());

    let token_path = config.token_path();
    match ctx.store().load()? {
        Some(credentials) => {
            let remaining = credentials.remaining_secs(Utc::now());
            let access = if remaining > 0 {
                format!("access token valid for {remaining}s")
            } else {
                "access token expired; it will be refreshed on next use".to_string()
            };
            println!("{:<28} {} ({access})", "Credentials", token_path.display());
        }
        None => println!(
            "{:<28} none at {} (run `adsctl authorize`)",
            "Credentials",
            token_path.display()
        ),
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AdsError::Config(format!("missing {}", missing.join(", "))).into())
    }
}
