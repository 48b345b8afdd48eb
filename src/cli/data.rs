//! Read-only reporting commands: accounts, performance, query, samples and
//! optimize.

use std::fmt::Write as _;

use chrono::Utc;
use clap::{Args, ValueEnum};
use serde_json::json;

use crate::analysis::{
    CampaignAnalysis, DEFAULT_TARGET_CTR, DEFAULT_TARGET_ROAS, analyze_campaigns, validate_targets,
};
use crate::client::{DateRange, QueryRequest, SampleQuery, queries};
use crate::domain::{CustomerId, Recommendation, Report, ReportFormat, Row};
use crate::error::AdsError;
use crate::report::{PerformanceSummary, format, format_rows};

use super::Context;

/// Reporting level of `performance`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// One row per campaign.
    Campaign,
    /// One row per ad.
    Ad,
}

impl Level {
    const fn subject(self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::Ad => "ad",
        }
    }
}

/// Arguments of `performance`.
#[derive(Args, Debug)]
pub struct PerformanceArgs {
    /// Account id, with or without dashes
    #[arg(long, env = "GOOGLE_ADS_CUSTOMER_ID")]
    pub customer_id: CustomerId,

    /// Number of complete days to report, ending yesterday
    #[arg(long, default_value_t = 30)]
    pub days: u32,

    /// Report per campaign or per ad
    #[arg(long, value_enum, default_value_t = Level::Campaign)]
    pub level: Level,
}

/// Arguments of `query`.
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("source").required(true).args(["query", "sample"])
))]
pub struct QueryArgs {
    /// Account id, with or without dashes
    #[arg(long, env = "GOOGLE_ADS_CUSTOMER_ID")]
    pub customer_id: CustomerId,

    /// GAQL query text
    #[arg(short, long)]
    pub query: Option<String>,

    /// Name of a sample query (see `adsctl samples`)
    #[arg(short, long)]
    pub sample: Option<SampleQuery>,

    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<u32>,
}

/// Arguments of `optimize`.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Account id, with or without dashes
    #[arg(long, env = "GOOGLE_ADS_CUSTOMER_ID")]
    pub customer_id: CustomerId,

    /// Target return on ad spend
    #[arg(long, default_value_t = DEFAULT_TARGET_ROAS)]
    pub target_roas: f64,

    /// Target click-through rate, in percent
    #[arg(long, default_value_t = DEFAULT_TARGET_CTR)]
    pub target_ctr: f64,

    /// Number of complete days to analyze, ending yesterday
    #[arg(long, default_value_t = 30)]
    pub days: u32,
}

pub(super) async fn accounts(ctx: &Context) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let credentials = ctx.credentials(&client)?;
    let (rows, _) = client.list_accounts(credentials).await?;

    if rows.is_empty() {
        println!("No accessible accounts found.");
        return Ok(());
    }
    let columns = ["customer.id".to_string(), "customer.resource_name".to_string()];
    let formatted = format(&Report::with_columns(rows.clone(), &columns, ctx.format()));
    println!("{formatted}");

    let raw = json!({
        "fetched_at": Utc::now().to_rfc3339(),
        "total_results": rows.len(),
        "resource_names": rows
            .iter()
            .map(|row| row.render("customer.resource_name"))
            .collect::<Vec<_>>(),
    });
    ctx.save("accounts", &raw, &formatted)?;
    Ok(())
}

pub(super) async fn performance(ctx: &Context, args: &PerformanceArgs) -> anyhow::Result<()> {
    let range = DateRange::last_days(args.days, Utc::now().date_naive())?;
    let query = match args.level {
        Level::Campaign => queries::campaign_performance(&range),
        Level::Ad => queries::ad_performance(&range),
    };
    let request = QueryRequest::new(args.customer_id.clone(), query)?;

    let client = ctx.client()?;
    let credentials = ctx.credentials(&client)?;
    let (response, credentials) = client.run_query(&request, credentials).await?;
    let (currency, _) = client.account_currency(&args.customer_id, credentials).await?;

    let subject = args.level.subject();
    let summary = PerformanceSummary::from_rows(&response.rows);
    let report = Report::with_columns(response.rows, &response.columns, ctx.format());
    let formatted = format(&report);

    if ctx.format() == ReportFormat::Table {
        print!(
            "{}",
            summary.render(subject, &args.customer_id, &currency, report.generated_at())
        );
        if !report.rows().is_empty() {
            println!();
            println!("{formatted}");
        }
    } else {
        println!("{formatted}");
    }

    ctx.save(&format!("{subject}_performance"), &response.raw, &formatted)?;
    Ok(())
}

pub(super) async fn query(ctx: &Context, args: &QueryArgs) -> anyhow::Result<()> {
    let (label, text) = match (&args.query, args.sample) {
        (Some(text), _) => ("query".to_string(), text.clone()),
        (None, Some(sample)) => (sample.name().to_string(), sample.query().to_string()),
        (None, None) => {
            return Err(AdsError::InvalidInput("either --query or --sample is required".to_string()).into());
        }
    };
    let mut request = QueryRequest::new(args.customer_id.clone(), text)?;
    if let Some(limit) = args.limit {
        request = request.with_limit(limit)?;
    }

    let client = ctx.client()?;
    let credentials = ctx.credentials(&client)?;
    let (response, _) = client.run_query(&request, credentials).await?;

    let report = Report::with_columns(response.rows, &response.columns, ctx.format());
    let formatted = format(&report);
    if report.rows().is_empty() && ctx.format() == ReportFormat::Table {
        println!("No results.");
    } else {
        println!("{formatted}");
    }
    ctx.save(&label, &response.raw, &formatted)?;
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
pub(super) fn samples(ctx: &Context) -> anyhow::Result<()> {
    let rows: Vec<Row> = SampleQuery::ALL
        .iter()
        .map(|sample| {
            Row::new()
                .with("name", sample.name())
                .with("query", sample.query())
        })
        .collect();
    println!("{}", format_rows(&rows, ctx.format()));
    Ok(())
}

pub(super) async fn optimize(ctx: &Context, args: &OptimizeArgs) -> anyhow::Result<()> {
    validate_targets(args.target_roas, args.target_ctr)?;
    let range = DateRange::last_days(args.days, Utc::now().date_naive())?;
    let request = QueryRequest::new(args.customer_id.clone(), queries::campaign_performance(&range))?;

    let client = ctx.client()?;
    let credentials = ctx.credentials(&client)?;
    let (response, _) = client.run_query(&request, credentials).await?;

    match analyze_campaigns(&response.rows, args.target_roas, args.target_ctr) {
        Ok(analysis) => {
            let formatted = format_rows(&recommendation_rows(&analysis.recommendations), ctx.format());
            println!("{formatted}");
            if ctx.format() == ReportFormat::Table {
                print!("{}", performers_text(&analysis));
            }
            ctx.save("optimization", &response.raw, &formatted)?;
            let document = json!({
                "customer_id": args.customer_id.as_str(),
                "target_roas": args.target_roas,
                "target_ctr": args.target_ctr,
                "analysis": serde_json::to_value(&analysis)?,
            });
            ctx.save_json("optimization_analysis", &document)?;
            Ok(())
        }
        Err(e) if e.is_warning() => {
            tracing::warn!(customer_id = %args.customer_id, error = %e, "no recommendations");
            eprintln!("warning: {e}");
            eprintln!("{}", e.remediation());
            let report = Report::with_columns(response.rows, &response.columns, ctx.format());
            ctx.save("optimization", &response.raw, &format(&report))?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn recommendation_rows(recommendations: &[Recommendation]) -> Vec<Row> {
    recommendations
        .iter()
        .map(|rec| {
            Row::new()
                .with("metric", rec.metric_name.as_str())
                .with("observed", format!("{:.2}", rec.observed_value))
                .with("target", format!("{:.2}", rec.target_value))
                .with("verdict", rec.verdict.to_string())
                .with("advice", rec.advice.as_str())
        })
        .collect()
}

fn performers_text(analysis: &CampaignAnalysis) -> String {
    let mut out = String::new();
    for (title, names) in [
        ("Low performers (ROAS below half the target)", &analysis.low_performers),
        ("High performers (ROAS above target)", &analysis.high_performers),
    ] {
        if !names.is_empty() {
            let _ = writeln!(out, "\n{title}:");
            for name in names {
                let _ = writeln!(out, "  - {name}");
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Verdict;

    #[test]
    fn recommendations_become_rows() {
        let recs = vec![Recommendation {
            metric_name: "roas".to_string(),
            observed_value: 2.0,
            target_value: 4.0,
            verdict: Verdict::Below,
            advice: "raise bids".to_string(),
        }];
        let rows = recommendation_rows(&recs);
        let Some(row) = rows.first() else {
            panic!("one row expected");
        };
        assert_eq!(row.render("metric"), "roas");
        assert_eq!(row.render("observed"), "2.00");
        assert_eq!(row.render("target"), "4.00");
        assert_eq!(row.render("verdict"), Verdict::Below.to_string());
    }

    #[test]
    fn performers_text_skips_empty_lists() {
        let analysis = CampaignAnalysis {
            metrics: crate::analysis::AggregateMetrics::default(),
            recommendations: Vec::new(),
            low_performers: vec!["Losing".to_string()],
            high_performers: Vec::new(),
        };
        let text = performers_text(&analysis);
        assert!(text.contains("Low performers"));
        assert!(text.contains("  - Losing"));
        assert!(!text.contains("High performers"));
    }

    #[tokio::test]
    async fn optimize_rejects_bad_target_before_any_request() {
        use httpmock::prelude::*;

        use crate::auth::{CredentialStore, FileCredentialStore};
        use crate::cli::GlobalArgs;
        use crate::config::AdsConfig;
        use crate::domain::credentials::fixtures::credentials;

        let server = MockServer::start_async().await;
        let search = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).body("{}");
            })
            .await;
        let Ok(dir) = tempfile::tempdir() else {
            panic!("temp dir");
        };
        let config_dir = dir.path().to_string_lossy().into_owned();
        let api_url = server.url("/v19");
        let token_url = server.url("/token");
        let Ok(config) = AdsConfig::from_lookup(|key| match key {
            "GOOGLE_ADS_CONFIG_DIR" => Some(config_dir.clone()),
            "GOOGLE_ADS_API_BASE_URL" => Some(api_url.clone()),
            "GOOGLE_ADS_TOKEN_URL" => Some(token_url.clone()),
            _ => None,
        }) else {
            panic!("config should load");
        };
        if FileCredentialStore::new(config.token_path()).save(&credentials(3600)).is_err() {
            panic!("credentials should save");
        }
        let global = GlobalArgs {
            format: ReportFormat::Table,
            results_dir: None,
            config_dir: None,
            no_save: true,
            verbose: 0,
            log_json: false,
        };
        let ctx = Context::new(config, &global);
        let Ok(customer_id) = CustomerId::parse("1234567890") else {
            panic!("valid id");
        };
        let args = OptimizeArgs {
            customer_id,
            target_roas: 0.0,
            target_ctr: DEFAULT_TARGET_CTR,
            days: 30,
        };

        let Err(err) = optimize(&ctx, &args).await else {
            panic!("zero ROAS target should be rejected");
        };
        assert!(matches!(err.downcast_ref::<AdsError>(), Some(AdsError::InvalidInput(_))));
        search.assert_hits_async(0).await;
    }

    #[test]
    fn level_subjects() {
        assert_eq!(Level::Campaign.subject(), "campaign");
        assert_eq!(Level::Ad.subject(), "ad");
    }
}
