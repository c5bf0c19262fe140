use crate::models::{CheckResult, Context, DiagnosticReport, DiscountOutcome, Remediation};

use super::{Check, evaluate};

/// Ordered system-health checks run by the intake flow and the health panel
pub struct SystemChecklist {
    pub checks: Vec<Check>,
}

impl Default for SystemChecklist {
    fn default() -> Self {
        Self {
            checks: vec![
                Check::new(
                    "store_connection",
                    "Storefront API must answer health checks",
                    check_store_connection,
                ),
                Check::new(
                    "theme_verified",
                    "A published theme must be detected",
                    check_theme_verified,
                ),
                Check::new(
                    "app_embed",
                    "The app embed must be enabled in the theme",
                    check_app_embed,
                ),
                Check::new("cart_status", "The cart drawer must be enabled", check_cart_status),
                Check::new(
                    "widget_status",
                    "The selected widget should be active",
                    check_widget_status,
                ),
                Check::new(
                    "zone_registration",
                    "The widget zone must exist in the theme",
                    check_zone_registration,
                ),
                Check::new(
                    "theme_integration",
                    "The app block must be verified in the theme",
                    check_theme_integration,
                ),
                Check::new(
                    "app_conflicts",
                    "Conflicting apps should be removed",
                    check_app_conflicts,
                ),
                Check::new(
                    "discount_functions",
                    "Recent discount function runs should succeed",
                    check_discount_functions,
                ),
            ],
        }
    }
}

impl SystemChecklist {
    /// Run every check against the context
    pub fn run_all(&self, ctx: &Context) -> DiagnosticReport {
        evaluate(&self.checks, ctx)
    }

    /// Look up a check by name
    pub fn find(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }
}

fn check_store_connection(ctx: &Context) -> CheckResult {
    if ctx.store.api_connected {
        CheckResult::pass("Store API Connection", "Stable")
    } else {
        CheckResult::fail("Store API Connection", "Storefront API is not responding")
    }
}

fn check_theme_verified(ctx: &Context) -> CheckResult {
    let theme = ctx.store.theme_name.trim();
    if theme.is_empty() {
        CheckResult::warning("Theme", "No published theme detected")
    } else {
        CheckResult::pass("Theme", format!("Theme Verified: {}", theme)).with_label(theme)
    }
}

fn check_app_embed(ctx: &Context) -> CheckResult {
    if ctx.store.app_embed_enabled {
        CheckResult::pass("App Embed", "Enabled")
    } else {
        CheckResult::fail(
            "App Embed",
            "CRITICAL: 'App Embed' is DISABLED in your Shopify Theme.",
        )
        .with_remediation(Remediation::EnableAppEmbed)
    }
}

fn check_cart_status(ctx: &Context) -> CheckResult {
    if ctx.store.cart_enabled {
        CheckResult::pass("Cart", "Cart drawer enabled")
    } else {
        CheckResult::fail("Cart", "Cart drawer is disabled")
            .with_remediation(Remediation::EnableCart)
    }
}

fn check_widget_status(ctx: &Context) -> CheckResult {
    match &ctx.widget {
        None => CheckResult::pass("Widget Status", "No widget selected; skipped"),
        Some(w) if w.is_active => {
            CheckResult::pass("Widget Status", "Widget Status: Active").with_label(&w.id)
        }
        Some(w) => {
            CheckResult::warning("Widget Status", "Widget Status: Inactive").with_label(&w.id)
        }
    }
}

fn check_zone_registration(ctx: &Context) -> CheckResult {
    let Some(widget) = &ctx.widget else {
        return CheckResult::pass("Zone", "No widget selected; skipped");
    };

    let zone = widget.zone_id.as_str();
    if ctx.store.has_zone(zone) {
        CheckResult::pass("Zone", format!("Zone '{}' verified in theme.", zone)).with_label(zone)
    } else {
        CheckResult::fail(
            "Zone",
            format!("Zone '{}' not detected in 'theme.liquid'.", zone),
        )
        .with_label(zone)
        .with_remediation(Remediation::InjectZone {
            zone: zone.to_string(),
        })
    }
}

fn check_theme_integration(ctx: &Context) -> CheckResult {
    if ctx.store.theme_integration_verified {
        CheckResult::pass("Theme Integration", "Verified")
    } else {
        CheckResult::fail("Theme Integration", "App Block missing from published theme")
            .with_remediation(Remediation::VerifyThemeIntegration)
    }
}

fn check_app_conflicts(ctx: &Context) -> CheckResult {
    let apps = &ctx.store.conflicting_apps;
    if apps.is_empty() {
        CheckResult::pass("Conflicts", "No conflicting apps detected")
    } else {
        let names: Vec<&str> = apps.iter().map(String::as_str).collect();
        CheckResult::warning(
            "Conflicts",
            format!("{} Detected: {}", apps.len(), names.join(", ")),
        )
    }
}

fn check_discount_functions(ctx: &Context) -> CheckResult {
    let logs = &ctx.discount_logs;
    if logs.is_empty() {
        return CheckResult::pass("Discount Functions", "No function executions recorded");
    }

    if let Some(log) = logs.iter().find(|l| l.result == DiscountOutcome::Error) {
        return CheckResult::fail(
            "Discount Functions",
            format!("{} errored: {}", log.function_name, log.details),
        )
        .with_label(&log.function_name);
    }

    if let Some(log) = logs.iter().find(|l| l.result == DiscountOutcome::Rejected) {
        return CheckResult::warning(
            "Discount Functions",
            format!("{} rejected: {}", log.function_name, log.details),
        )
        .with_label(&log.function_name);
    }

    CheckResult::pass(
        "Discount Functions",
        format!("{} executions applied", logs.len()),
    )
}
