//! Campaign commands. Details are read from the API; every mutation is a
//! simulation.

use chrono::Utc;
use clap::{Args, Subcommand};

use crate::campaign::{
    CampaignPlan, SimulationReport, simulate_budget_update, simulate_creation, simulate_enable,
    simulate_pause,
};
use crate::client::{DateRange, QueryRequest, queries};
use crate::domain::{CustomerId, Report, ReportFormat};
use crate::report::format;

use super::Context;

/// Arguments of `create-campaign`.
#[derive(Args, Debug)]
pub struct CreateCampaignArgs {
    /// Account id, with or without dashes
    #[arg(long, env = "GOOGLE_ADS_CUSTOMER_ID")]
    pub customer_id: CustomerId,

    /// Campaign name
    #[arg(long)]
    pub name: String,

    /// Daily budget in account currency units
    #[arg(long)]
    pub budget: f64,

    /// Comma-separated keywords
    #[arg(long, value_delimiter = ',', required = true)]
    pub keywords: Vec<String>,

    /// Ad group name (default: "<name> - Ad Group 1")
    #[arg(long)]
    pub ad_group: Option<String>,

    /// Geo target code (default: US)
    #[arg(long)]
    pub location: Option<String>,
}

/// Arguments of `campaign`.
#[derive(Args, Debug)]
pub struct CampaignArgs {
    /// Campaign action
    #[command(subcommand)]
    pub action: CampaignAction,
}

/// Campaign subcommands.
#[derive(Subcommand, Debug)]
pub enum CampaignAction {
    /// Show settings and budget of a campaign
    Show {
        /// Target campaign
        #[command(flatten)]
        target: CampaignTarget,

        /// Also list keyword metrics
        #[arg(long)]
        keywords: bool,

        /// Days of keyword metrics, ending yesterday
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Simulate a daily budget change
    SetBudget {
        /// Target campaign
        #[command(flatten)]
        target: CampaignTarget,

        /// New daily budget in account currency units
        #[arg(long)]
        budget: f64,
    },

    /// Simulate pausing a campaign
    Pause {
        /// Target campaign
        #[command(flatten)]
        target: CampaignTarget,
    },

    /// Simulate enabling a campaign
    Enable {
        /// Target campaign
        #[command(flatten)]
        target: CampaignTarget,
    },
}

/// Account and campaign a subcommand acts on.
#[derive(Args, Debug, Clone)]
pub struct CampaignTarget {
    /// Account id, with or without dashes
    #[arg(long, env = "GOOGLE_ADS_CUSTOMER_ID")]
    pub customer_id: CustomerId,

    /// Numeric campaign id
    #[arg(long)]
    pub campaign_id: u64,
}

pub(super) fn create(ctx: &Context, args: &CreateCampaignArgs) -> anyhow::Result<()> {
    let report = simulate_creation(CampaignPlan {
        customer_id: args.customer_id.clone(),
        name: args.name.clone(),
        daily_budget: args.budget,
        keywords: args.keywords.clone(),
        ad_group_name: args.ad_group.clone(),
        target_location: args.location.clone(),
    })?;
    print_simulation(ctx, &report)
}

pub(super) async fn run(ctx: &Context, args: &CampaignArgs) -> anyhow::Result<()> {
    match &args.action {
        CampaignAction::Show {
            target,
            keywords,
            days,
        } => show(ctx, target, *keywords, *days).await,
        CampaignAction::SetBudget { target, budget } => {
            let report =
                simulate_budget_update(target.customer_id.clone(), target.campaign_id, *budget)?;
            print_simulation(ctx, &report)
        }
        CampaignAction::Pause { target } => {
            let report = simulate_pause(target.customer_id.clone(), target.campaign_id)?;
            print_simulation(ctx, &report)
        }
        CampaignAction::Enable { target } => {
            let report = simulate_enable(target.customer_id.clone(), target.campaign_id)?;
            print_simulation(ctx, &report)
        }
    }
}

async fn show(
    ctx: &Context,
    target: &CampaignTarget,
    with_keywords: bool,
    days: u32,
) -> anyhow::Result<()> {
    let details = QueryRequest::new(
        target.customer_id.clone(),
        queries::campaign_details(target.campaign_id),
    )?;
    // Validated before any network call.
    let keyword_query = if with_keywords {
        let range = DateRange::last_days(days, Utc::now().date_naive())?;
        Some(QueryRequest::new(
            target.customer_id.clone(),
            queries::campaign_keywords(target.campaign_id, &range),
        )?)
    } else {
        None
    };

    let client = ctx.client()?;
    let credentials = ctx.credentials(&client)?;
    let (response, credentials) = client.run_query(&details, credentials).await?;
    if response.rows.is_empty() {
        println!(
            "No campaign {} in account {}.",
            target.campaign_id, target.customer_id
        );
        return Ok(());
    }
    let report = Report::with_columns(response.rows, &response.columns, ctx.format());
    let formatted = format(&report);
    println!("{formatted}");
    ctx.save(&format!("campaign_{}", target.campaign_id), &response.raw, &formatted)?;

    if let Some(request) = keyword_query {
        let (response, _) = client.run_query(&request, credentials).await?;
        let report = Report::with_columns(response.rows, &response.columns, ctx.format());
        let formatted = format(&report);
        if report.rows().is_empty() {
            println!("\nNo keyword data for campaign {}.", target.campaign_id);
        } else {
            println!("\n{formatted}");
        }
        ctx.save(
            &format!("campaign_{}_keywords", target.campaign_id),
            &response.raw,
            &formatted,
        )?;
    }
    Ok(())
}

fn print_simulation(ctx: &Context, report: &SimulationReport) -> anyhow::Result<()> {
    if ctx.format() == ReportFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}
