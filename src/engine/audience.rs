use tracing::debug;

use crate::models::{AudienceRule, CheckResult, ShopperContext, VisibilityVerdict};

/// One entry of the decision list: `Some` ends evaluation
type Rule = fn(&ShopperContext, &AudienceRule) -> Option<VisibilityVerdict>;

/// Evaluated top to bottom, first match wins. Empty-cart suppression must
/// stay ahead of tag exclusion.
const DECISION_LIST: [Rule; 4] = [empty_cart, excluded_tag, missing_required_tag, device_mismatch];

/// Answers "would this shopper see the widget"
#[derive(Debug, Clone, Copy, Default)]
pub struct AudienceSimulator;

impl AudienceSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Run the decision list for `shopper` against `rule`
    pub fn simulate(&self, shopper: Option<&ShopperContext>, rule: &AudienceRule) -> VisibilityVerdict {
        let Some(shopper) = shopper else {
            return VisibilityVerdict::hidden("No shopper context supplied.");
        };

        let verdict = DECISION_LIST
            .iter()
            .find_map(|rule_fn| rule_fn(shopper, rule))
            .unwrap_or_else(|| VisibilityVerdict::visible("All conditions met."));

        debug!("audience '{}' -> {}", rule.label, verdict);
        verdict
    }

    /// Report form of [`simulate`](Self::simulate), for inclusion in a
    /// diagnostic report. A missing shopper becomes a warning.
    pub fn check(&self, shopper: Option<&ShopperContext>, rule: &AudienceRule) -> CheckResult {
        if shopper.is_none() {
            return CheckResult::warning(
                "Audience Simulation",
                "No shopper context supplied; visibility not simulated",
            )
            .with_label(&rule.label);
        }

        let verdict = self.simulate(shopper, rule);
        if verdict.visible {
            CheckResult::pass("Audience Simulation", verdict.reason).with_label(&rule.label)
        } else {
            CheckResult::fail("Audience Simulation", verdict.reason).with_label(&rule.label)
        }
    }
}

fn empty_cart(shopper: &ShopperContext, _rule: &AudienceRule) -> Option<VisibilityVerdict> {
    shopper
        .cart_is_empty()
        .then(|| VisibilityVerdict::hidden("Cart is empty."))
}

fn excluded_tag(shopper: &ShopperContext, rule: &AudienceRule) -> Option<VisibilityVerdict> {
    rule.excluded_tags
        .iter()
        .find(|tag| shopper.has_tag(tag))
        .map(|tag| VisibilityVerdict::hidden(format!("Rule excludes '{}' tag.", tag)))
}

fn missing_required_tag(shopper: &ShopperContext, rule: &AudienceRule) -> Option<VisibilityVerdict> {
    rule.required_tags
        .iter()
        .find(|tag| !shopper.has_tag(tag))
        .map(|tag| VisibilityVerdict::hidden(format!("Shopper missing required '{}' tag.", tag)))
}

fn device_mismatch(shopper: &ShopperContext, rule: &AudienceRule) -> Option<VisibilityVerdict> {
    rule.device
        .filter(|device| *device != shopper.device)
        .map(|device| VisibilityVerdict::hidden(format!("Rule targets {} devices only.", device)))
}
