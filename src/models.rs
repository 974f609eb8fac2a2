use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OutreachError;

/// Lifecycle of one grid zone. Transitions are pending -> in_progress ->
/// completed, plus the bulk completed -> pending reset at cycle end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    Pending,
    InProgress,
    Completed,
}

impl ZoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneStatus::Pending => "pending",
            ZoneStatus::InProgress => "in_progress",
            ZoneStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ZoneStatus::Pending),
            "in_progress" => Some(ZoneStatus::InProgress),
            "completed" => Some(ZoneStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    pub status: ZoneStatus,
    pub last_worked_at: Option<DateTime<Utc>>,
    pub businesses_found: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Converted => "converted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "converted" => Some(LeadStatus::Converted),
            _ => None,
        }
    }
}

/// A qualified business without a website, as stored. Never deleted; only
/// soft-suppressed through the unsubscribe table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub has_website: bool,
    pub rating: Option<f64>,
    pub review_count: i64,
    pub priority_score: i64,
    pub status: LeadStatus,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// How a lead can be reached. Only `Email` is deliverable through the
/// Mailer; phone-only leads are surfaced as delivery failures rather than
/// mailed to a phone string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactMethod {
    Email(String),
    Phone(String),
    None,
}

impl Lead {
    pub fn contact_method(&self) -> ContactMethod {
        if let Some(email) = self.email.as_deref() {
            if !email.is_empty() {
                return ContactMethod::Email(email.to_string());
            }
        }
        if let Some(phone) = self.phone.as_deref() {
            if !phone.is_empty() {
                return ContactMethod::Phone(phone.to_string());
            }
        }
        ContactMethod::None
    }
}

/// One message kind in the outreach cadence. At most one event of each kind
/// exists per lead, and follow-ups require their predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachKind {
    Initial,
    FollowUp1,
    FollowUp2,
}

impl OutreachKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutreachKind::Initial => "initial",
            OutreachKind::FollowUp1 => "followup1",
            OutreachKind::FollowUp2 => "followup2",
        }
    }

    pub fn parse(s: &str) -> Result<Self, OutreachError> {
        match s {
            "initial" => Ok(OutreachKind::Initial),
            "followup1" => Ok(OutreachKind::FollowUp1),
            "followup2" => Ok(OutreachKind::FollowUp2),
            other => Err(OutreachError::InvalidTemplateKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachEvent {
    pub id: i64,
    pub lead_id: i64,
    pub kind: OutreachKind,
    pub subject: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// A raw discovery record as produced by an Extractor, before any
/// qualification. Empty name/address are possible and rejected downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBusiness {
    pub name: String,
    pub category: Option<String>,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub has_website: bool,
    pub rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: String,
    pub zones_scraped: i64,
    pub businesses_scraped: i64,
    pub leads_qualified: i64,
    pub emails_sent: i64,
    pub responses_received: i64,
    pub conversions: i64,
}
