//! Widget-visibility dependency chain.
//!
//! Campaign → Experience → Audience → Zone → Theme, always all five.
//! Each stage reads the original Context only. The one coupling is that
//! Theme fails whenever the zone is missing from the theme; Theme
//! recomputes that predicate from the Context rather than reading the Zone
//! result, so stages stay independent functions.

use tracing::debug;

use crate::models::{
    CampaignStatus, CheckResult, Context, DependencyChain, Remediation, Stage, Widget,
};

use super::{Check, evaluate};

const STAGE_CHECKS: [Check; 5] = [
    Check::new("campaign", "Linked campaign must be active", campaign_stage),
    Check::new("experience", "Experience rule must be well-formed", experience_stage),
    Check::new("audience", "Shopper must carry required tags", audience_stage),
    Check::new("zone", "Zone must exist and be uncontested", zone_stage),
    Check::new("theme", "App block must be verifiable in the theme", theme_stage),
];

/// Builds the five-stage visibility chain for a widget
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyChainBuilder;

impl DependencyChainBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every stage for `widget` against `ctx`.
    ///
    /// `widget` replaces whatever widget `ctx` carries for this evaluation.
    pub fn build_chain(&self, widget: &Widget, ctx: &Context) -> DependencyChain {
        let scoped = ctx.clone().with_widget(widget.clone());
        let report = evaluate(&STAGE_CHECKS, &scoped);

        debug!(
            "chain for {}: {:?}",
            widget.id,
            report.results().iter().map(|r| r.status).collect::<Vec<_>>()
        );

        DependencyChain::new(widget.id.clone(), report)
    }
}

fn missing_widget(stage: Stage) -> CheckResult {
    CheckResult::warning(stage.as_str(), "No widget selected")
}

fn campaign_stage(ctx: &Context) -> CheckResult {
    let stage = Stage::Campaign.as_str();
    let Some(widget) = &ctx.widget else {
        return missing_widget(Stage::Campaign);
    };

    let campaign = match (&widget.campaign_id, &ctx.campaign) {
        (Some(id), Some(c)) if c.id == *id => c,
        (Some(id), _) => {
            return CheckResult::fail(stage, format!("Campaign '{}' does not resolve", id))
                .with_label(id);
        }
        (None, Some(c)) => c,
        (None, None) => return CheckResult::warning(stage, "No campaign linked to widget"),
    };

    let label = if campaign.name.is_empty() {
        campaign.id.as_str()
    } else {
        campaign.name.as_str()
    };

    let detail = format!("Status: {}", campaign.status);
    if campaign.status == CampaignStatus::Active {
        CheckResult::pass(stage, detail).with_label(label)
    } else {
        CheckResult::fail(stage, detail).with_label(label)
    }
}

fn experience_stage(ctx: &Context) -> CheckResult {
    let stage = Stage::Experience.as_str();
    let Some(widget) = &ctx.widget else {
        return missing_widget(Stage::Experience);
    };

    match &widget.experience {
        None => CheckResult::pass(stage, "No experience targeting; shown to all visitors")
            .with_label("All Visitors"),
        Some(rule) if rule.condition.trim().is_empty() => CheckResult::warning(
            stage,
            format!("Experience '{}' declares no condition", rule.name),
        )
        .with_label(&rule.name),
        Some(rule) => CheckResult::pass(stage, format!("Logic: {}", rule.condition.trim()))
            .with_label(&rule.name),
    }
}

fn audience_stage(ctx: &Context) -> CheckResult {
    let stage = Stage::Audience.as_str();
    let Some(widget) = &ctx.widget else {
        return missing_widget(Stage::Audience);
    };

    let Some(rule) = &widget.audience else {
        return CheckResult::pass(stage, "No exclusions found").with_label("Global");
    };

    if rule.required_tags.is_empty() {
        return CheckResult::pass(stage, "No exclusions found").with_label(&rule.label);
    }

    let Some(shopper) = &ctx.shopper else {
        return CheckResult::warning(
            stage,
            "No shopper context supplied; required tags unverified",
        )
        .with_label(&rule.label);
    };

    match rule.required_tags.iter().find(|tag| !shopper.has_tag(tag)) {
        Some(tag) => {
            CheckResult::fail(stage, format!("Current user missing \"{}\" tag", tag))
                .with_label(&rule.label)
        }
        None => CheckResult::pass(stage, "Shopper carries all required tags")
            .with_label(&rule.label),
    }
}

fn zone_stage(ctx: &Context) -> CheckResult {
    let stage = Stage::Zone.as_str();
    let Some(widget) = &ctx.widget else {
        return missing_widget(Stage::Zone);
    };

    let zone = widget.zone_id.as_str();
    if !ctx.store.has_zone(zone) {
        return CheckResult::fail(stage, format!("Zone '{}' not registered in theme", zone))
            .with_label(zone)
            .with_remediation(Remediation::InjectZone {
                zone: zone.to_string(),
            });
    }

    match ctx.store.zone_conflict(zone) {
        Some(app) => {
            CheckResult::warning(stage, format!("Zone exists but duplicates {} ID", app))
                .with_label(zone)
        }
        None => CheckResult::pass(stage, "Zone registered in theme").with_label(zone),
    }
}

fn theme_stage(ctx: &Context) -> CheckResult {
    let stage = Stage::Theme.as_str();
    let theme = ctx.store.theme_name.as_str();
    let Some(widget) = &ctx.widget else {
        return missing_widget(Stage::Theme);
    };

    if !ctx.store.has_zone(&widget.zone_id) {
        return CheckResult::fail(stage, "Zone ID not found in theme.liquid").with_label(theme);
    }

    if !ctx.store.theme_integration_verified {
        return CheckResult::fail(stage, "App Block not verified in theme")
            .with_label(theme)
            .with_remediation(Remediation::VerifyThemeIntegration);
    }

    CheckResult::pass(stage, "App Block verified").with_label(theme)
}
