//! Wire types for the campaign backend.
//!
//! Decoding is lenient: numeric nulls read as zero, dates accept either a
//! plain date or an ISO datetime, and ids may arrive as numbers or strings.
//! A field that cannot be read falls back to its default with a warning, so
//! one bad value never drops the whole campaign.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ad platforms accepted by the backend.
pub const PLATFORMS: &[&str] = &[
    "google_ads",
    "meta_ads",
    "tiktok_ads",
    "linkedin_ads",
    "twitter_ads",
    "pinterest_ads",
];

/// Budget types accepted by the backend.
pub const BUDGET_TYPES: &[&str] = &["daily", "lifetime"];

/// User roles accepted by `POST /auth/register`.
pub const ROLES: &[&str] = &["admin", "manager", "analyst", "viewer"];

/// Authenticated user as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "full_name")]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// `POST /auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Token plus the profile fetched with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: String,
    pub profile: UserProfile,
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
}

/// Campaign lifecycle status.
///
/// Only the first three are tracked by the dashboard; the backend also uses
/// `ended` and `archived`, which are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CampaignStatus {
    Active,
    Paused,
    #[default]
    Draft,
    Other(String),
}

impl CampaignStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Draft => "draft",
            CampaignStatus::Other(s) => s,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "active" => CampaignStatus::Active,
            "paused" => CampaignStatus::Paused,
            "draft" | "" => CampaignStatus::Draft,
            other => CampaignStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for CampaignStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CampaignStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(raw) => Self::parse(&raw),
            serde_json::Value::Null => Self::default(),
            other => {
                tracing::warn!("Unreadable campaign status {other}; using draft");
                Self::default()
            }
        })
    }
}

/// A campaign as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default, deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub platform: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default, deserialize_with = "de::text")]
    pub budget_type: String,
    #[serde(default, deserialize_with = "de::amount")]
    pub budget_amount: f64,
    #[serde(default, deserialize_with = "de::amount")]
    pub total_spent: f64,
    #[serde(default, deserialize_with = "de::date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::count")]
    pub impressions: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub conversions: u64,
}

/// `POST /campaigns/` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignDraft {
    pub name: String,
    pub platform: String,
    pub budget_type: String,
    pub budget_amount: f64,
    pub start_date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_url: Option<String>,
}

/// `PUT /campaigns/{id}` body. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
}

impl CampaignUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.budget_amount.is_none()
            && self.status.is_none()
            && self.end_date.is_none()
            && self.target_audience.is_none()
    }
}

/// Filters for `GET /campaigns/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<CampaignStatus>,
    pub platform: Option<String>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
}

impl CampaignQuery {
    /// Query-string pairs for the filters that are set.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(platform) = &self.platform {
            pairs.push(("platform", platform.clone()));
        }
        if let Some(from) = self.start_date_from {
            pairs.push(("start_date_from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.start_date_to {
            pairs.push(("start_date_to", to.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

/// Derived performance numbers for one campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricValues {
    #[serde(deserialize_with = "de::amount")]
    pub total_spent: f64,
    #[serde(deserialize_with = "de::count")]
    pub impressions: u64,
    #[serde(deserialize_with = "de::count")]
    pub clicks: u64,
    #[serde(deserialize_with = "de::count")]
    pub conversions: u64,
    #[serde(deserialize_with = "de::amount")]
    pub ctr: f64,
    #[serde(deserialize_with = "de::amount")]
    pub cpc: f64,
    #[serde(deserialize_with = "de::amount")]
    pub conversion_rate: f64,
    #[serde(deserialize_with = "de::amount")]
    pub budget_remaining: f64,
    #[serde(deserialize_with = "de::amount")]
    pub budget_utilization: f64,
}

/// `GET /campaigns/{id}/metrics` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    #[serde(deserialize_with = "de::id")]
    pub campaign_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub campaign_name: String,
    #[serde(default)]
    pub metrics: MetricValues,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default, deserialize_with = "de::text")]
    pub platform: String,
}

/// `GET /campaigns/platform/{platform}/summary` response.
///
/// A platform without campaigns only carries `total_campaigns: 0` and a
/// `message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSummary {
    #[serde(deserialize_with = "de::text")]
    pub platform: String,
    #[serde(deserialize_with = "de::count")]
    pub total_campaigns: u64,
    #[serde(deserialize_with = "de::count")]
    pub active_campaigns: u64,
    #[serde(deserialize_with = "de::amount")]
    pub total_spent: f64,
    #[serde(deserialize_with = "de::amount")]
    pub total_budget: f64,
    #[serde(deserialize_with = "de::amount")]
    pub budget_utilization: f64,
    #[serde(deserialize_with = "de::amount")]
    pub average_ctr: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

mod de {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::warn;

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Null => String::new(),
            other => {
                warn!("Unreadable id {other}; leaving it empty");
                String::new()
            }
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let parsed = match &value {
            Value::Null => Some(0.0),
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => Some(0.0),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(match parsed {
            Some(amount) if amount.is_finite() => amount,
            _ => {
                warn!("Unreadable amount {value}; using 0");
                0.0
            }
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = amount(deserializer)?;
        if value.is_finite() && value >= 0.0 {
            Ok(value as u64)
        } else {
            Ok(0)
        }
    }

    pub fn date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => parse_date(&s),
            _ => None,
        })
    }

    pub(super) fn parse_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt.date());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(dt.date());
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_profile_reads_full_name() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": 1,
            "email": "ana@example.com",
            "full_name": "Ana Souza",
            "role": "admin",
            "is_active": true
        }))
        .unwrap();

        assert_eq!(profile.name, "Ana Souza");
        assert_eq!(profile.role, "admin");
        assert_eq!(profile.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_profile_round_trips_through_storage_form() {
        let profile = UserProfile {
            name: "Ana".to_string(),
            role: "viewer".to_string(),
            email: None,
        };
        let stored = serde_json::to_string(&profile).unwrap();
        assert_eq!(stored, r#"{"name":"Ana","role":"viewer"}"#);
        let back: UserProfile = serde_json::from_str(&stored).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_campaign_lenient_decoding() {
        let campaign: Campaign = serde_json::from_value(json!({
            "id": 42,
            "name": "Black Friday",
            "platform": "google_ads",
            "status": null,
            "budget_amount": "1500.50",
            "total_spent": null,
            "start_date": "2024-11-01T00:00:00",
            "end_date": "not a date"
        }))
        .unwrap();

        assert_eq!(campaign.id, "42");
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert!((campaign.budget_amount - 1500.5).abs() < f64::EPSILON);
        assert!(campaign.total_spent.abs() < f64::EPSILON);
        assert_eq!(
            campaign.start_date,
            NaiveDate::from_ymd_opt(2024, 11, 1)
        );
        assert_eq!(campaign.end_date, None);
        assert_eq!(campaign.impressions, 0);
    }

    #[test]
    fn test_bad_fields_fall_back_to_defaults() {
        let campaign: Campaign = serde_json::from_value(json!({
            "name": "No id",
            "status": 3,
            "budget_amount": "n/a",
            "total_spent": 25.0,
            "clicks": [1]
        }))
        .unwrap();

        assert_eq!(campaign.id, "");
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert!(campaign.budget_amount.abs() < f64::EPSILON);
        assert!((campaign.total_spent - 25.0).abs() < f64::EPSILON);
        assert_eq!(campaign.clicks, 0);
    }

    #[test]
    fn test_status_buckets() {
        assert_eq!(CampaignStatus::parse("ACTIVE"), CampaignStatus::Active);
        assert_eq!(CampaignStatus::parse("paused"), CampaignStatus::Paused);
        assert_eq!(
            CampaignStatus::parse("ended"),
            CampaignStatus::Other("ended".to_string())
        );
        assert_eq!(CampaignStatus::parse("ended").as_str(), "ended");
    }

    #[test]
    fn test_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9);
        assert_eq!(de::parse_date("2025-03-09"), expected);
        assert_eq!(de::parse_date("2025-03-09T10:11:12.123456"), expected);
        assert_eq!(de::parse_date("2025-03-09T10:11:12Z"), expected);
        assert_eq!(de::parse_date("09/03/2025"), None);
    }

    #[test]
    fn test_update_sends_only_set_fields() {
        let update = CampaignUpdate {
            budget_amount: Some(250.0),
            status: Some(CampaignStatus::Paused),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"budget_amount": 250.0, "status": "paused"})
        );
        assert!(CampaignUpdate::default().is_empty());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_draft_serializes_datetime_and_skips_empty() {
        let draft = CampaignDraft {
            name: "Launch".to_string(),
            platform: "meta_ads".to_string(),
            budget_type: "daily".to_string(),
            budget_amount: 100.0,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            end_date: None,
            status: None,
            target_audience: None,
            keywords: Vec::new(),
            bid_strategy: None,
            creative_url: None,
        };
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({
                "name": "Launch",
                "platform": "meta_ads",
                "budget_type": "daily",
                "budget_amount": 100.0,
                "start_date": "2025-01-15T00:00:00"
            })
        );
    }

    #[test]
    fn test_query_pairs_only_when_set() {
        assert!(CampaignQuery::default().to_pairs().is_empty());

        let query = CampaignQuery {
            limit: Some(5),
            status: Some(CampaignStatus::Active),
            start_date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("limit", "5".to_string()),
                ("status", "active".to_string()),
                ("start_date_from", "2025-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_platform_summary() {
        let summary: PlatformSummary = serde_json::from_value(json!({
            "platform": "tiktok_ads",
            "total_campaigns": 0,
            "message": "Nenhuma campanha encontrada para esta plataforma"
        }))
        .unwrap();
        assert_eq!(summary.total_campaigns, 0);
        assert!(summary.message.is_some());
    }
}
