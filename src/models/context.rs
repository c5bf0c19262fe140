use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

// ============================================================================
// Store Health
// ============================================================================

/// Storefront subscription tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StorePlan {
    Basic,
    #[default]
    Shopify,
    Advanced,
    Plus,
}

/// Snapshot of the merchant's store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    /// Whether the storefront API answered the last health check
    #[serde(default = "default_true")]
    pub api_connected: bool,
    pub cart_enabled: bool,
    pub app_embed_enabled: bool,
    pub theme_name: String,
    pub theme_integration_verified: bool,
    /// Installed third-party apps known to clash with our widgets
    #[serde(default)]
    pub conflicting_apps: BTreeSet<String>,
    #[serde(default)]
    pub plan: StorePlan,
    /// Zones (app block anchors) the published theme exposes
    #[serde(default)]
    pub theme_zones: BTreeSet<String>,
    /// Zone ids claimed by third-party apps, keyed by app name
    #[serde(default)]
    pub app_zones: BTreeMap<String, BTreeSet<String>>,
}

fn default_true() -> bool {
    true
}

impl Default for StoreHealth {
    fn default() -> Self {
        Self {
            api_connected: true,
            cart_enabled: true,
            app_embed_enabled: true,
            theme_name: String::new(),
            theme_integration_verified: true,
            conflicting_apps: BTreeSet::new(),
            plan: StorePlan::default(),
            theme_zones: BTreeSet::new(),
            app_zones: BTreeMap::new(),
        }
    }
}

impl StoreHealth {
    /// Whether the published theme registers the given zone
    pub fn has_zone(&self, zone_id: &str) -> bool {
        self.theme_zones.contains(zone_id)
    }

    /// First installed conflicting app that claims the given zone
    pub fn zone_conflict(&self, zone_id: &str) -> Option<&str> {
        self.conflicting_apps
            .iter()
            .find(|app| {
                self.app_zones
                    .get(app.as_str())
                    .is_some_and(|zones| zones.contains(zone_id))
            })
            .map(String::as_str)
    }
}

// ============================================================================
// Targeting Rules
// ============================================================================

/// Device class of a simulated shopper
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Device {
    Desktop,
    Mobile,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Desktop => write!(f, "Desktop"),
            Device::Mobile => write!(f, "Mobile"),
        }
    }
}

/// Audience targeting attached to a widget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AudienceRule {
    /// Display name (e.g., "Wholesale", "Global")
    pub label: String,
    /// Tags the shopper must carry
    #[serde(default)]
    pub required_tags: BTreeSet<String>,
    /// Tags that hide the widget
    #[serde(default)]
    pub excluded_tags: BTreeSet<String>,
    /// Restrict to one device class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
}

impl AudienceRule {
    /// Rule that only excludes the given tags
    pub fn excluding<I, S>(label: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            excluded_tags: tags.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Rule that requires the given tags
    pub fn requiring<I, S>(label: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            required_tags: tags.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Experience (visitor segment) targeting attached to a widget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceRule {
    pub name: String,
    /// Literal condition as written by the merchant (e.g., "Lifetime Value > $500")
    pub condition: String,
}

// ============================================================================
// Widget / Campaign / Shopper
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Widget kind (e.g., "Gamification", "Product Rec")
    #[serde(default, rename = "type")]
    pub widget_type: String,
    pub zone_id: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<ExperienceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<AudienceRule>,
    /// Opaque configuration payload, edited out-of-band
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Active,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "Draft"),
            CampaignStatus::Scheduled => write!(f, "Scheduled"),
            CampaignStatus::Active => write!(f, "Active"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: CampaignStatus,
}

/// Hypothetical shopper used by the audience simulator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShopperContext {
    pub cart_total: f64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub device: Device,
}

impl ShopperContext {
    /// Case-insensitive tag lookup on trimmed tags
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim();
        self.tags.iter().any(|t| t.trim().eq_ignore_ascii_case(wanted))
    }

    /// A non-finite total counts as an empty cart
    pub fn cart_is_empty(&self) -> bool {
        !self.cart_total.is_finite() || self.cart_total <= 0.0
    }
}

// ============================================================================
// Function Logs
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiscountOutcome {
    Applied,
    Rejected,
    Error,
}

/// One recorded execution of a discount function (simulated input)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscountLog {
    pub id: String,
    pub function_name: String,
    pub input: String,
    pub result: DiscountOutcome,
    pub details: String,
    pub timestamp: String,
}

// ============================================================================
// Context
// ============================================================================

/// Read-only snapshot of everything a check may read.
///
/// Checks only ever borrow a `Context`. Changes happen through
/// [`crate::models::Remediation::apply`] or the workspace store, both of
/// which hand back a fresh value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Context {
    pub store: StoreHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<Widget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopper: Option<ShopperContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<Campaign>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discount_logs: Vec<DiscountLog>,
}

impl Context {
    pub fn new(store: StoreHealth) -> Self {
        Self {
            store,
            ..Default::default()
        }
    }

    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widget = Some(widget);
        self
    }

    pub fn with_shopper(mut self, shopper: ShopperContext) -> Self {
        self.shopper = Some(shopper);
        self
    }

    pub fn with_campaign(mut self, campaign: Campaign) -> Self {
        self.campaign = Some(campaign);
        self
    }

    pub fn with_discount_logs(mut self, logs: Vec<DiscountLog>) -> Self {
        self.discount_logs = logs;
        self
    }
}
