//! Query requests and the canned GAQL catalog.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};

use crate::domain::CustomerId;
use crate::error::AdsError;

/// One query against one account. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    customer_id: CustomerId,
    query: String,
    limit: Option<u32>,
}

impl QueryRequest {
    /// Builds a request. Surrounding whitespace of the query is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::InvalidInput`] if the query is blank.
    pub fn new(customer_id: CustomerId, query: impl Into<String>) -> Result<Self, AdsError> {
        let query = query.into().trim().to_string();
        if query.is_empty() {
            return Err(AdsError::InvalidInput("query text is empty".to_string()));
        }
        Ok(Self {
            customer_id,
            query,
            limit: None,
        })
    }

    /// Caps the number of returned rows.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::InvalidInput`] for a zero limit.
    pub fn with_limit(self, limit: u32) -> Result<Self, AdsError> {
        if limit == 0 {
            return Err(AdsError::InvalidInput("row limit must be at least 1".to_string()));
        }
        Ok(Self {
            limit: Some(limit),
            ..self
        })
    }

    /// Target account.
    #[must_use]
    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Query text as given.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Requested row cap.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Whether the query text carries its own `LIMIT` clause. String
    /// literals are not searched.
    #[must_use]
    pub fn has_limit_clause(&self) -> bool {
        outside_literals(&self.query)
            .split_whitespace()
            .any(|token| token.eq_ignore_ascii_case("LIMIT"))
    }

    /// Query text sent to the endpoint: `LIMIT n` is appended when a limit
    /// was requested and the query has none.
    #[must_use]
    pub fn effective_query(&self) -> String {
        match self.limit {
            Some(limit) if !self.has_limit_clause() => {
                format!("{} LIMIT {limit}", self.query.trim_end_matches(';').trim_end())
            }
            _ => self.query.clone(),
        }
    }

    /// Field names of the SELECT clause, in order.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        columns_from_query(&self.query)
    }
}

/// Extracts the field list of a `SELECT ... FROM` query.
///
/// Returns an empty list when the text does not look like a SELECT.
#[must_use]
pub fn columns_from_query(query: &str) -> Vec<String> {
    let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ");
    let upper = normalized.to_ascii_uppercase();
    if !upper.starts_with("SELECT ") {
        return Vec::new();
    }
    let Some(end) = upper.find(" FROM ") else {
        return Vec::new();
    };
    normalized
        .get("SELECT ".len()..end)
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Inclusive date window for `segments.date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl DateRange {
    /// The `days` full days before `today` (today excluded).
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::InvalidInput`] unless `1 <= days <= 3650`.
    pub fn last_days(days: u32, today: NaiveDate) -> Result<Self, AdsError> {
        if !(1..=3650).contains(&days) {
            return Err(AdsError::InvalidInput(format!(
                "days must be between 1 and 3650, got {days}"
            )));
        }
        let end = today - Duration::days(1);
        let start = today - Duration::days(i64::from(days));
        Ok(Self { start, end })
    }

    /// GAQL condition selecting the window.
    #[must_use]
    pub fn condition(&self) -> String {
        format!(
            "segments.date BETWEEN '{}' AND '{}'",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Campaign metrics over `range`, most expensive first.
#[must_use]
pub fn campaign_performance(range: &DateRange) -> String {
    format!(
        "SELECT campaign.id, campaign.name, campaign.status, metrics.impressions, \
         metrics.clicks, metrics.cost_micros, metrics.conversions, \
         metrics.conversions_value, metrics.average_cpc \
         FROM campaign WHERE {} ORDER BY metrics.cost_micros DESC LIMIT 50",
        range.condition()
    )
}

/// Ad metrics over `range`, most impressions first.
#[must_use]
pub fn ad_performance(range: &DateRange) -> String {
    format!(
        "SELECT ad_group_ad.ad.id, ad_group_ad.ad.name, ad_group_ad.status, campaign.name, \
         ad_group.name, metrics.impressions, metrics.clicks, metrics.cost_micros, \
         metrics.conversions \
         FROM ad_group_ad WHERE {} ORDER BY metrics.impressions DESC LIMIT 50",
        range.condition()
    )
}

/// The account's currency.
pub const ACCOUNT_CURRENCY: &str =
    "SELECT customer.id, customer.currency_code FROM customer LIMIT 1";

/// Settings and budget of one campaign.
#[must_use]
pub fn campaign_details(campaign_id: u64) -> String {
    format!(
        "SELECT campaign.id, campaign.name, campaign.status, \
         campaign.advertising_channel_type, campaign.start_date, campaign.end_date, \
         campaign_budget.amount_micros, campaign_budget.delivery_method, \
         campaign.target_cpa.target_cpa_micros, campaign.target_roas.target_roas, \
         campaign.bidding_strategy_type \
         FROM campaign WHERE campaign.id = {campaign_id}"
    )
}

/// Keyword metrics of one campaign over `range`.
#[must_use]
pub fn campaign_keywords(campaign_id: u64, range: &DateRange) -> String {
    format!(
        "SELECT keyword.text, keyword.match_type, ad_group_criterion.status, \
         ad_group_criterion.quality_info.quality_score, metrics.impressions, \
         metrics.clicks, metrics.cost_micros, metrics.conversions, ad_group.name, \
         campaign.name \
         FROM keyword_view WHERE campaign.id = {campaign_id} AND {} \
         ORDER BY metrics.impressions DESC LIMIT 100",
        range.condition()
    )
}

/// Named example queries for `adsctl query --sample`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleQuery {
    /// Top campaigns by cost.
    Campaigns,
    /// Top keywords by clicks.
    Keywords,
    /// Ads with more than 100 impressions.
    Ads,
    /// Account id, currency and time zone.
    AccountInfo,
}

impl SampleQuery {
    /// Every sample, in listing order.
    pub const ALL: [Self; 4] = [Self::Campaigns, Self::Keywords, Self::Ads, Self::AccountInfo];

    /// Name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Campaigns => "campaigns",
            Self::Keywords => "keywords",
            Self::Ads => "ads",
            Self::AccountInfo => "account_info",
        }
    }

    /// GAQL text.
    #[must_use]
    pub const fn query(self) -> &'static str {
        match self {
            Self::Campaigns => {
                "SELECT campaign.id, campaign.name, campaign.status, metrics.impressions, \
                 metrics.clicks, metrics.cost_micros FROM campaign \
                 WHERE segments.date DURING LAST_30_DAYS \
                 ORDER BY metrics.cost_micros DESC LIMIT 10"
            }
            Self::Keywords => {
                "SELECT keyword.text, keyword.match_type, metrics.impressions, \
                 metrics.clicks, metrics.cost_micros, metrics.conversions FROM keyword_view \
                 WHERE segments.date DURING LAST_30_DAYS \
                 ORDER BY metrics.clicks DESC LIMIT 20"
            }
            Self::Ads => {
                "SELECT ad_group_ad.ad.id, ad_group_ad.ad.name, campaign.name, ad_group.name, \
                 metrics.impressions, metrics.clicks, metrics.conversions FROM ad_group_ad \
                 WHERE segments.date DURING LAST_30_DAYS AND metrics.impressions > 100 \
                 ORDER BY metrics.clicks DESC LIMIT 15"
            }
            Self::AccountInfo => {
                "SELECT customer.id, customer.currency_code, customer.time_zone, \
                 customer.descriptive_name FROM customer LIMIT 1"
            }
        }
    }
}

impl fmt::Display for SampleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleQuery {
    type Err = AdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|sample| sample.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|q| q.name()).collect();
                AdsError::InvalidInput(format!(
                    "unknown sample {s:?} (expected one of: {})",
                    names.join(", ")
                ))
            })
    }
}

/// `query` with every quoted literal blanked out. Backslash escapes
/// inside a literal are honoured.
fn outside_literals(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in query.chars() {
        match quote {
            Some(open) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == open {
                    quote = None;
                }
                out.push(' ');
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                out.push(' ');
            }
            None => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn customer() -> CustomerId {
        let Ok(id) = CustomerId::parse("123-456-7890") else {
            panic!("valid customer id");
        };
        id
    }

    #[test]
    fn limit_is_appended_when_absent() {
        let Ok(request) = QueryRequest::new(customer(), "SELECT campaign.id FROM campaign;")
            .and_then(|r| r.with_limit(5))
        else {
            panic!("valid request");
        };
        assert_eq!(request.effective_query(), "SELECT campaign.id FROM campaign LIMIT 5");
    }

    #[test]
    fn existing_limit_clause_is_kept() {
        let Ok(request) = QueryRequest::new(customer(), "SELECT campaign.id FROM campaign limit 50")
            .and_then(|r| r.with_limit(5))
        else {
            panic!("valid request");
        };
        assert!(request.has_limit_clause());
        assert_eq!(
            request.effective_query(),
            "SELECT campaign.id FROM campaign limit 50"
        );
    }

    #[test]
    fn limit_inside_string_literal_is_not_a_clause() {
        let query = "SELECT campaign.id FROM campaign WHERE campaign.name = 'NO LIMIT'";
        let Ok(request) = QueryRequest::new(customer(), query).and_then(|r| r.with_limit(5)) else {
            panic!("valid request");
        };
        assert!(!request.has_limit_clause());
        assert_eq!(request.effective_query(), format!("{query} LIMIT 5"));

        let Ok(escaped) = QueryRequest::new(
            customer(),
            r#"SELECT ad_group.id FROM ad_group WHERE ad_group.name = "it\"s LIMIT" LIMIT 3"#,
        ) else {
            panic!("valid request");
        };
        assert!(escaped.has_limit_clause());
    }

    #[test]
    fn blank_query_and_zero_limit_are_rejected() {
        assert!(QueryRequest::new(customer(), "  \n ").is_err());
        let Ok(request) = QueryRequest::new(customer(), "SELECT customer.id FROM customer") else {
            panic!("valid request");
        };
        assert!(request.with_limit(0).is_err());
    }

    #[test]
    fn columns_follow_select_order() {
        let columns = columns_from_query(
            "select\n  campaign.id,\n  campaign.name ,metrics.clicks\nFROM campaign WHERE x",
        );
        assert_eq!(columns, ["campaign.id", "campaign.name", "metrics.clicks"]);
        assert!(columns_from_query("DESCRIBE campaign").is_empty());
    }

    #[test]
    fn sample_columns_are_parsed() {
        for sample in SampleQuery::ALL {
            assert!(!columns_from_query(sample.query()).is_empty(), "{sample}");
        }
    }

    #[test]
    fn date_range_excludes_today() {
        let Some(today) = NaiveDate::from_ymd_opt(2024, 3, 31) else {
            panic!("valid date");
        };
        let Ok(range) = DateRange::last_days(30, today) else {
            panic!("valid range");
        };
        assert_eq!(
            range.condition(),
            "segments.date BETWEEN '2024-03-01' AND '2024-03-30'"
        );
        assert!(DateRange::last_days(0, today).is_err());
    }

    #[test]
    fn canned_queries_embed_window_and_ids() {
        let Some(today) = NaiveDate::from_ymd_opt(2024, 1, 8) else {
            panic!("valid date");
        };
        let Ok(range) = DateRange::last_days(7, today) else {
            panic!("valid range");
        };
        assert!(campaign_performance(&range).contains("BETWEEN '2024-01-01' AND '2024-01-07'"));
        assert!(ad_performance(&range).starts_with("SELECT ad_group_ad.ad.id"));
        assert!(campaign_details(42).ends_with("WHERE campaign.id = 42"));
        assert!(campaign_keywords(42, &range).contains("campaign.id = 42 AND segments.date"));
    }

    #[test]
    fn sample_names_parse() {
        assert!(matches!("account-info".parse::<SampleQuery>(), Ok(SampleQuery::AccountInfo)));
        assert!(matches!("Keywords".parse::<SampleQuery>(), Ok(SampleQuery::Keywords)));
        assert!("budgets".parse::<SampleQuery>().is_err());
    }
}
