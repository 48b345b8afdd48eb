//! Simulated campaign mutations.
//!
//! Nothing here talks to the network. Each function validates its input
//! and returns the change that *would* be submitted, so the CLI can show it
//! for review.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::CustomerId;
use crate::error::AdsError;

/// Warning attached to every simulated result.
pub const SIMULATION_WARNING: &str =
    "This is a simulation. No change was sent to the Ads API.";

/// Input of [`simulate_creation`].
#[derive(Debug, Clone)]
pub struct CampaignPlan {
    /// Target account.
    pub customer_id: CustomerId,
    /// Campaign name.
    pub name: String,
    /// Daily budget in account currency units.
    pub daily_budget: f64,
    /// Keywords for the first ad group.
    pub keywords: Vec<String>,
    /// Ad group name; defaults to `"<name> - Ad Group 1"`.
    pub ad_group_name: Option<String>,
    /// Geo target code; defaults to `US`.
    pub target_location: Option<String>,
}

/// Campaign as it would be created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignDraft {
    /// Target account.
    pub customer_id: CustomerId,
    /// Campaign name.
    pub campaign_name: String,
    /// Daily budget in account currency units.
    pub daily_budget: f64,
    /// First ad group.
    pub ad_group_name: String,
    /// Normalized keyword list.
    pub keywords: Vec<String>,
    /// Geo target code.
    pub target_location: String,
    /// Advertising channel.
    pub campaign_type: &'static str,
    /// Initial status; campaigns start paused for review.
    pub status: &'static str,
}

/// The mutation a simulation stands in for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SimulatedAction {
    /// New search campaign.
    Create(CampaignDraft),
    /// New daily budget for an existing campaign.
    UpdateBudget {
        /// Target account.
        customer_id: CustomerId,
        /// Campaign to update.
        campaign_id: u64,
        /// New daily budget in account currency units.
        new_budget: f64,
    },
    /// Pause an existing campaign.
    Pause {
        /// Target account.
        customer_id: CustomerId,
        /// Campaign to pause.
        campaign_id: u64,
    },
    /// Enable an existing campaign.
    Enable {
        /// Target account.
        customer_id: CustomerId,
        /// Campaign to enable.
        campaign_id: u64,
    },
}

/// Outcome of a simulated mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    /// One-line summary.
    pub message: String,
    /// What would be submitted.
    #[serde(flatten)]
    pub action: SimulatedAction,
    /// Manual follow-ups.
    pub next_steps: Vec<String>,
    /// Always [`SIMULATION_WARNING`].
    pub warning: &'static str,
    /// When the simulation ran.
    pub simulated_at: DateTime<Utc>,
}

impl SimulationReport {
    fn new(message: impl Into<String>, action: SimulatedAction, next_steps: &[&str]) -> Self {
        Self {
            message: message.into(),
            action,
            next_steps: next_steps.iter().map(|s| (*s).to_string()).collect(),
            warning: SIMULATION_WARNING,
            simulated_at: Utc::now(),
        }
    }

    /// Human-readable rendering for the terminal.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.message);
        let _ = writeln!(out, "{}", "=".repeat(50));
        match &self.action {
            SimulatedAction::Create(draft) => {
                let _ = writeln!(out, "Customer ID:     {}", draft.customer_id);
                let _ = writeln!(out, "Campaign:        {}", draft.campaign_name);
                let _ = writeln!(out, "Daily budget:    {:.2}", draft.daily_budget);
                let _ = writeln!(out, "Ad group:        {}", draft.ad_group_name);
                let _ = writeln!(out, "Keywords:        {}", draft.keywords.join(", "));
                let _ = writeln!(out, "Location:        {}", draft.target_location);
                let _ = writeln!(out, "Type / status:   {} / {}", draft.campaign_type, draft.status);
            }
            SimulatedAction::UpdateBudget {
                customer_id,
                campaign_id,
                new_budget,
            } => {
                let _ = writeln!(out, "Customer ID:     {customer_id}");
                let _ = writeln!(out, "Campaign ID:     {campaign_id}");
                let _ = writeln!(out, "New budget:      {new_budget:.2}");
            }
            SimulatedAction::Pause {
                customer_id,
                campaign_id,
            }
            | SimulatedAction::Enable {
                customer_id,
                campaign_id,
            } => {
                let _ = writeln!(out, "Customer ID:     {customer_id}");
                let _ = writeln!(out, "Campaign ID:     {campaign_id}");
            }
        }
        if !self.next_steps.is_empty() {
            let _ = writeln!(out, "\nNext steps:");
            for (i, step) in self.next_steps.iter().enumerate() {
                let _ = writeln!(out, "  {}. {step}", i + 1);
            }
        }
        let _ = writeln!(out, "\nWARNING: {}", self.warning);
        out
    }
}

/// Validates `plan` and returns the campaign that would be created.
///
/// # Errors
///
/// Returns [`AdsError::InvalidInput`] for an empty name, a non-positive
/// budget or an empty keyword list.
pub fn simulate_creation(plan: CampaignPlan) -> Result<SimulationReport, AdsError> {
    let name = plan.name.trim().to_string();
    if name.is_empty() {
        return Err(AdsError::InvalidInput("campaign name is empty".to_string()));
    }
    validate_budget(plan.daily_budget)?;

    let mut keywords: Vec<String> = Vec::new();
    for keyword in plan.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if !keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            keywords.push(keyword.to_string());
        }
    }
    if keywords.is_empty() {
        return Err(AdsError::InvalidInput("at least one keyword is required".to_string()));
    }

    let ad_group_name = plan
        .ad_group_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{name} - Ad Group 1"));
    let target_location = plan
        .target_location
        .map(|l| l.trim().to_ascii_uppercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "US".to_string());

    tracing::info!(customer_id = %plan.customer_id, campaign = %name, keywords = keywords.len(), "simulating campaign creation");
    Ok(SimulationReport::new(
        "Campaign creation simulated (not actually created)",
        SimulatedAction::Create(CampaignDraft {
            customer_id: plan.customer_id,
            campaign_name: name,
            daily_budget: plan.daily_budget,
            ad_group_name,
            keywords,
            target_location,
            campaign_type: "SEARCH",
            status: "PAUSED",
        }),
        &[
            "Review campaign settings",
            "Create ad copy",
            "Set up conversion tracking",
            "Enable campaign when ready",
        ],
    ))
}

/// Simulates a daily budget change.
///
/// # Errors
///
/// Returns [`AdsError::InvalidInput`] for a zero campaign id or a
/// non-positive budget.
pub fn simulate_budget_update(
    customer_id: CustomerId,
    campaign_id: u64,
    new_budget: f64,
) -> Result<SimulationReport, AdsError> {
    validate_campaign_id(campaign_id)?;
    validate_budget(new_budget)?;
    Ok(SimulationReport::new(
        "Budget update simulated (not actually updated)",
        SimulatedAction::UpdateBudget {
            customer_id,
            campaign_id,
            new_budget,
        },
        &[],
    ))
}

/// Simulates pausing a campaign.
///
/// # Errors
///
/// Returns [`AdsError::InvalidInput`] for a zero campaign id.
pub fn simulate_pause(customer_id: CustomerId, campaign_id: u64) -> Result<SimulationReport, AdsError> {
    validate_campaign_id(campaign_id)?;
    Ok(SimulationReport::new(
        "Campaign pause simulated (not actually paused)",
        SimulatedAction::Pause {
            customer_id,
            campaign_id,
        },
        &[],
    ))
}

/// Simulates enabling a campaign.
///
/// # Errors
///
/// Returns [`AdsError::InvalidInput`] for a zero campaign id.
pub fn simulate_enable(customer_id: CustomerId, campaign_id: u64) -> Result<SimulationReport, AdsError> {
    validate_campaign_id(campaign_id)?;
    Ok(SimulationReport::new(
        "Campaign enable simulated (not actually enabled)",
        SimulatedAction::Enable {
            customer_id,
            campaign_id,
        },
        &[],
    ))
}

fn validate_budget(budget: f64) -> Result<(), AdsError> {
    if budget.is_finite() && budget > 0.0 {
        Ok(())
    } else {
        Err(AdsError::InvalidInput(format!(
            "budget must be a positive amount, got {budget}"
        )))
    }
}

fn validate_campaign_id(campaign_id: u64) -> Result<(), AdsError> {
    if campaign_id == 0 {
        Err(AdsError::InvalidInput("campaign id must be non-zero".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn customer() -> CustomerId {
        let Ok(id) = CustomerId::parse("123-456-7890") else {
            panic!("valid id");
        };
        id
    }

    fn plan() -> CampaignPlan {
        CampaignPlan {
            customer_id: customer(),
            name: " Spring Sale ".to_string(),
            daily_budget: 25.0,
            keywords: vec![
                "running shoes".to_string(),
                " ".to_string(),
                "Running Shoes".to_string(),
                "trail shoes".to_string(),
            ],
            ad_group_name: None,
            target_location: None,
        }
    }

    #[test]
    fn creation_fills_defaults() {
        let Ok(report) = simulate_creation(plan()) else {
            panic!("valid plan");
        };
        let SimulatedAction::Create(draft) = &report.action else {
            panic!("creation action expected");
        };
        assert_eq!(draft.campaign_name, "Spring Sale");
        assert_eq!(draft.ad_group_name, "Spring Sale - Ad Group 1");
        assert_eq!(draft.keywords, ["running shoes", "trail shoes"]);
        assert_eq!(draft.target_location, "US");
        assert_eq!(draft.campaign_type, "SEARCH");
        assert_eq!(draft.status, "PAUSED");
        assert_eq!(report.next_steps.len(), 4);
        assert_eq!(report.warning, SIMULATION_WARNING);
    }

    #[test]
    fn creation_rejects_bad_plans() {
        let mut empty_name = plan();
        empty_name.name = "  ".to_string();
        assert!(matches!(simulate_creation(empty_name), Err(AdsError::InvalidInput(_))));

        let mut no_budget = plan();
        no_budget.daily_budget = 0.0;
        assert!(matches!(simulate_creation(no_budget), Err(AdsError::InvalidInput(_))));

        let mut no_keywords = plan();
        no_keywords.keywords = vec![" ".to_string()];
        assert!(matches!(simulate_creation(no_keywords), Err(AdsError::InvalidInput(_))));
    }

    #[test]
    fn report_serializes_with_action_tag() {
        let Ok(report) = simulate_pause(customer(), 42) else {
            panic!("valid pause");
        };
        let Ok(value) = serde_json::to_value(&report) else {
            panic!("serializable");
        };
        assert_eq!(value.get("action"), Some(&Value::String("pause".to_string())));
        assert_eq!(value.get("campaign_id").and_then(Value::as_u64), Some(42));
        assert_eq!(value.get("customer_id").and_then(Value::as_str), Some("1234567890"));
    }

    #[test]
    fn budget_update_and_enable_validate_ids() {
        assert!(simulate_budget_update(customer(), 7, 50.0).is_ok());
        assert!(simulate_budget_update(customer(), 7, -1.0).is_err());
        assert!(simulate_enable(customer(), 0).is_err());
        assert!(simulate_enable(customer(), 9).is_ok());
    }

    #[test]
    fn text_rendering_mentions_simulation() {
        let Ok(report) = simulate_creation(plan()) else {
            panic!("valid plan");
        };
        let text = report.render_text();
        assert!(text.contains("Spring Sale - Ad Group 1"));
        assert!(text.contains("1. Review campaign settings"));
        assert!(text.contains(SIMULATION_WARNING));
    }
}
