use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Ticket Enums
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    Open,
    #[serde(rename = "In Review")]
    InReview,
    #[serde(rename = "Waiting for Approval")]
    WaitingForApproval,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InReview => "In Review",
            TicketStatus::WaitingForApproval => "Waiting for Approval",
            TicketStatus::Resolved => "Resolved",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket urgency, ordered from least to most urgent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
            TicketPriority::Critical => "Critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TicketType {
    Bug,
    #[default]
    Configuration,
    Styling,
    Migration,
    #[serde(rename = "Feature Request")]
    Feature,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Bug => "Bug",
            TicketType::Configuration => "Configuration",
            TicketType::Styling => "Styling",
            TicketType::Migration => "Migration",
            TicketType::Feature => "Feature Request",
        }
    }

    /// Sub-categories offered by the intake flow for this type
    pub fn subcategories(&self) -> &'static [&'static str] {
        match self {
            TicketType::Configuration => &[
                "Campaign Setup",
                "Targeting Rules",
                "Widget Placement",
                "Discount Logic",
            ],
            TicketType::Styling => &[
                "Colors & Fonts",
                "Mobile Layout",
                "Positioning/Z-Index",
                "Custom CSS",
            ],
            TicketType::Bug => &[
                "Cart Not Opening",
                "Widget Not Loading",
                "API Error",
                "Conflict with other App",
            ],
            TicketType::Migration => &["Rebuy", "Bold Commerce", "CartHook", "Zipify", "Other"],
            TicketType::Feature => &[
                "New Widget Type",
                "New Integration",
                "Dashboard Improvement",
            ],
        }
    }
}

impl std::fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Migration Tasks
// ============================================================================

/// Set by agents only; nothing advances it automatically
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Pending,
    Staging,
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationTask {
    pub id: String,
    /// Competitor widget being replaced (e.g., "Rebuy Smart Cart")
    pub source_widget: String,
    pub target_widget: String,
    pub status: MigrationStatus,
}

// ============================================================================
// Conversation
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Merchant,
    Agent,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Agent-only note, hidden from the merchant
    #[serde(default)]
    pub is_internal: bool,
}

// ============================================================================
// Ticket
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    pub description: String,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub merchant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_email: Option<String>,
    pub store_url: String,
    /// Page where the issue shows up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub migration_tasks: Vec<MigrationTask>,
    #[serde(default)]
    pub tags: Vec<String>,
}
