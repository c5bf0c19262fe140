//! Integration tests for the diagnostic engine against the demo workspace.
//!
//! Covers:
//! - Widget visibility chains for the demo widgets
//! - Audience decision precedence
//! - Fix locality and re-fix rejection
//! - Determinism and no short-circuiting
//! - Ticket filing from the intake flow

use std::collections::BTreeSet;
use std::sync::Arc;

use support_diagnostics::config::demo_workspace;
use support_diagnostics::models::{
    AudienceRule, CheckStatus, Device, Remediation, ShopperContext, Stage, TicketPriority,
    TicketStatus, TicketType,
};
use support_diagnostics::triage::{IssueScope, TicketUpdate};
use support_diagnostics::{
    AudienceSimulator, DependencyChainBuilder, EngineError, FixRejection, IntakeWizard,
    RemediationLedger, SystemChecklist, TriageError, WorkspaceStore,
};

use CheckStatus::{Fail, Pass, Warning};

fn store() -> WorkspaceStore {
    WorkspaceStore::new(demo_workspace().unwrap())
}

fn shopper(cart_total: f64, tags: &[&str], device: Device) -> ShopperContext {
    ShopperContext {
        cart_total,
        tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        device,
    }
}

// ============================================================================
// Dependency Chain
// ============================================================================

#[test]
fn test_wholesale_widget_chain_for_retail_shopper() {
    let store = store();
    let retail = shopper(80.0, &["VIP"], Device::Desktop);
    let ctx = store.context_for(Some("wdg_123"), Some(retail)).unwrap();
    let widget = store.widget("wdg_123").unwrap();

    let chain = DependencyChainBuilder::new().build_chain(widget, &ctx);

    assert_eq!(chain.statuses(), vec![Pass, Pass, Fail, Warning, Fail]);
    assert_eq!(
        chain.stage(Stage::Audience).unwrap().detail,
        "Current user missing \"Wholesale\" tag"
    );
    assert_eq!(
        chain.stage(Stage::Zone).unwrap().detail,
        "Zone exists but duplicates Rebuy ID"
    );
    assert_eq!(chain.stage(Stage::Experience).unwrap().detail, "Logic: Lifetime Value > $500");
    assert!(chain.stage(Stage::Theme).unwrap().fixable);
}

#[test]
fn test_wholesale_shopper_clears_audience_stage() {
    let store = store();
    let wholesale = shopper(80.0, &[" wholesale "], Device::Mobile);
    let ctx = store.context_for(Some("wdg_123"), Some(wholesale)).unwrap();
    let chain = DependencyChainBuilder::new().build_chain(store.widget("wdg_123").unwrap(), &ctx);

    assert_eq!(chain.stage(Stage::Audience).unwrap().status, Pass);
}

#[test]
fn test_missing_zone_fails_zone_and_theme() {
    let store = store();
    let ctx = store.context_for(Some("wdg_789"), None).unwrap();
    let chain = DependencyChainBuilder::new().build_chain(store.widget("wdg_789").unwrap(), &ctx);

    assert_eq!(chain.report().len(), 5);
    assert_eq!(chain.statuses(), vec![Warning, Pass, Pass, Fail, Fail]);
    assert_eq!(
        chain.stage(Stage::Zone).unwrap().remediation,
        Some(Remediation::InjectZone {
            zone: "footer".to_string()
        })
    );
    assert_eq!(
        chain.stage(Stage::Theme).unwrap().detail,
        "Zone ID not found in theme.liquid"
    );
    assert!(!chain.stage(Stage::Theme).unwrap().fixable);
}

// ============================================================================
// Fixes
// ============================================================================

#[test]
fn test_fix_is_local_until_rebuilt() {
    let store = store();
    let ledger = RemediationLedger::new();
    let builder = DependencyChainBuilder::new();
    let widget = store.widget("wdg_789").unwrap();
    let ctx = store.context_for(Some("wdg_789"), None).unwrap();

    let chain = builder.build_chain(widget, &ctx);
    let fixed = ledger.apply_chain_fix(&chain, Stage::Zone.index()).unwrap();

    // Only the fixed stage changes; Theme still reflects the old Context
    assert_eq!(fixed.statuses(), vec![Warning, Pass, Pass, Pass, Fail]);
    assert!(fixed.stage(Stage::Zone).unwrap().fixed);
    assert_eq!(fixed.report().id(), chain.report().id());
    assert_eq!(chain.statuses(), vec![Warning, Pass, Pass, Fail, Fail]);

    // Rebuilding against the remediated Context recomputes downstream stages
    let remediation = chain.stage(Stage::Zone).unwrap().remediation.clone().unwrap();
    let rebuilt = builder.build_chain(widget, &remediation.apply(&ctx));
    assert_eq!(rebuilt.statuses(), vec![Warning, Pass, Pass, Pass, Fail]);
    assert_eq!(
        rebuilt.stage(Stage::Theme).unwrap().remediation,
        Some(Remediation::VerifyThemeIntegration)
    );
    assert_ne!(rebuilt.report().id(), chain.report().id());
    assert!(!ledger.is_fixed(rebuilt.report(), Stage::Zone.index()));
}

#[test]
fn test_identical_widgets_fix_independently() {
    let mut workspace = demo_workspace().unwrap();
    let mut twin = workspace
        .widgets
        .iter()
        .find(|w| w.id == "wdg_789")
        .cloned()
        .unwrap();
    twin.id = "wdg_999".to_string();
    workspace.widgets.push(twin);
    let store = WorkspaceStore::new(workspace);
    let ledger = RemediationLedger::new();
    let builder = DependencyChainBuilder::new();

    let chain_for = |id: &str| {
        let ctx = store.context_for(Some(id), None).unwrap();
        builder.build_chain(store.widget(id).unwrap(), &ctx)
    };
    let first = chain_for("wdg_789");
    let second = chain_for("wdg_999");
    assert_eq!(first.report(), second.report());
    assert_ne!(first.report().id(), second.report().id());

    ledger.apply_chain_fix(&first, Stage::Zone.index()).unwrap();
    assert!(!ledger.is_fixed(second.report(), Stage::Zone.index()));
    let fixed = ledger.apply_chain_fix(&second, Stage::Zone.index()).unwrap();
    assert!(fixed.stage(Stage::Zone).unwrap().fixed);
}

#[test]
fn test_reevaluation_can_be_fixed_again() {
    let store = store();
    let ledger = RemediationLedger::new();
    let ctx = store.context_for(Some("wdg_789"), None).unwrap();
    let checklist = SystemChecklist::default();

    let first = checklist.run_all(&ctx);
    let index = first
        .results()
        .iter()
        .position(|r| r.remediation.is_some() && r.status == Fail)
        .unwrap();
    ledger.apply_fix(&first, index).unwrap();

    let second = checklist.run_all(&ctx);
    assert_eq!(first, second);
    assert!(ledger.apply_fix(&second, index).is_ok());

    ledger.clear(&first);
    ledger.clear(&second);
    assert_eq!(ledger.lineages(), 0);
}

#[test]
fn test_refix_is_rejected() {
    let store = store();
    let ledger = RemediationLedger::new();
    let ctx = store.context_for(None, None).unwrap();
    let report = SystemChecklist::default().run_all(&ctx);

    let index = report
        .results()
        .iter()
        .position(|r| r.step == "Theme Integration")
        .unwrap();
    let fixed = ledger.apply_fix(&report, index).unwrap();
    assert_eq!(fixed.results()[index].status, Pass);

    for target in [&report, &fixed] {
        assert_eq!(
            ledger.apply_fix(target, index),
            Err(EngineError::InvalidFixRequest {
                index,
                reason: FixRejection::AlreadyFixed
            })
        );
    }
}

#[test]
fn test_invalid_fix_targets() {
    let store = store();
    let ledger = RemediationLedger::new();
    let ctx = store.context_for(None, None).unwrap();
    let report = SystemChecklist::default().run_all(&ctx);

    let conflicts = report.results().iter().position(|r| r.step == "Conflicts").unwrap();
    let discounts = report
        .results()
        .iter()
        .position(|r| r.step == "Discount Functions")
        .unwrap();

    assert!(matches!(
        ledger.apply_fix(&report, conflicts),
        Err(EngineError::InvalidFixRequest {
            reason: FixRejection::NotFailing { status: Warning },
            ..
        })
    ));
    assert!(matches!(
        ledger.apply_fix(&report, discounts),
        Err(EngineError::InvalidFixRequest {
            reason: FixRejection::NotFixable,
            ..
        })
    ));
    assert!(matches!(
        ledger.apply_fix(&report, report.len()),
        Err(EngineError::InvalidFixRequest {
            reason: FixRejection::OutOfRange { .. },
            ..
        })
    ));
}

#[test]
fn test_concurrent_fixes_single_winner() {
    let store = store();
    let ledger = Arc::new(RemediationLedger::new());
    let ctx = store.context_for(Some("wdg_789"), None).unwrap();
    let chain = DependencyChainBuilder::new().build_chain(store.widget("wdg_789").unwrap(), &ctx);
    let report = Arc::new(chain.into_report());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let report = Arc::clone(&report);
            std::thread::spawn(move || ledger.apply_fix(&report, Stage::Zone.index()).is_ok())
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(wins, 1);
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_system_checks_run_to_completion() {
    let store = store();
    let ctx = store.context_for(None, None).unwrap();
    let report = SystemChecklist::default().run_all(&ctx);

    let steps: Vec<_> = report.results().iter().map(|r| r.step.as_str()).collect();
    assert_eq!(
        steps,
        vec![
            "Store API Connection",
            "Theme",
            "App Embed",
            "Cart",
            "Widget Status",
            "Zone",
            "Theme Integration",
            "Conflicts",
            "Discount Functions",
        ]
    );
    assert_eq!(report.severity(), Fail);
    assert_eq!(report.count(Fail), 2);
    assert_eq!(report.count(Warning), 1);
}

#[test]
fn test_evaluation_is_deterministic() {
    let store = store();
    let ctx = store
        .context_for(Some("wdg_123"), Some(shopper(10.0, &[], Device::Desktop)))
        .unwrap();
    let widget = store.widget("wdg_123").unwrap();
    let builder = DependencyChainBuilder::new();

    assert_eq!(builder.build_chain(widget, &ctx), builder.build_chain(widget, &ctx));

    let checklist = SystemChecklist::default();
    assert_eq!(checklist.run_all(&ctx), checklist.run_all(&ctx));
}

// ============================================================================
// Audience Simulation
// ============================================================================

#[test]
fn test_empty_cart_beats_tag_exclusion() {
    let sim = AudienceSimulator::new();
    let rule = AudienceRule::excluding("Default", ["Wholesale"]);

    let verdict = sim.simulate(Some(&shopper(0.0, &["Wholesale"], Device::Desktop)), &rule);
    assert!(!verdict.visible);
    assert_eq!(verdict.reason, "Cart is empty.");

    let verdict = sim.simulate(Some(&shopper(25.0, &["Wholesale"], Device::Desktop)), &rule);
    assert_eq!(verdict.reason, "Rule excludes 'Wholesale' tag.");

    let verdict = sim.simulate(Some(&shopper(25.0, &["VIP"], Device::Mobile)), &rule);
    assert!(verdict.visible);
    assert_eq!(verdict.to_string(), "VISIBLE: All conditions met.");
}

#[test]
fn test_missing_shopper_is_hidden() {
    let sim = AudienceSimulator::new();
    let rule = AudienceRule::requiring("Wholesale", ["Wholesale"]);
    let verdict = sim.simulate(None, &rule);
    assert!(!verdict.visible);
    assert_eq!(verdict.reason, "No shopper context supplied.");
    assert_eq!(sim.check(None, &rule).status, Warning);
}

// ============================================================================
// Ticket Triage
// ============================================================================

#[test]
fn test_intake_files_ticket_with_derived_tags() {
    let mut store = store();
    let ledger = RemediationLedger::new();

    let mut wizard = IntakeWizard::new("Sarah Jenkins", "sarah@gymshark-lite.com", "gymshark-lite.myshopify.com");
    wizard.advance().unwrap();
    wizard.scope = IssueScope::Widget("wdg_789".to_string());
    wizard.advance().unwrap();
    wizard.category = TicketType::Bug;
    wizard.subcategory = Some("Widget Not Loading".to_string());
    wizard.impact = TicketPriority::Critical;
    wizard.advance().unwrap();

    let ctx = store.context_for(wizard.selected_widget(), None).unwrap();
    wizard
        .run_diagnostics(&SystemChecklist::default(), &ctx, &ledger)
        .unwrap();
    let zone = wizard
        .diagnostics()
        .unwrap()
        .results()
        .iter()
        .position(|r| r.step == "Zone")
        .unwrap();
    wizard.apply_fix(&ledger, zone).unwrap();

    let draft = wizard.submit().unwrap();
    let reports = vec![wizard.diagnostics().cloned().unwrap()];
    let ticket = store.create_ticket(draft, &reports).unwrap();

    assert_eq!(ticket.id, "tkt_004");
    assert_eq!(ticket.priority, TicketPriority::Critical);
    assert_eq!(ticket.widget_id.as_deref(), Some("wdg_789"));
    assert_eq!(
        ticket.tags,
        vec![
            "Bug",
            "Widget Status",
            "Theme Integration",
            "Conflicts",
            "Discount Functions"
        ]
    );
    assert!(ticket.description.contains("(fixed)"));
    assert_eq!(store.snapshot().tickets[0].id, "tkt_004");
}

#[test]
fn test_critical_without_failure_is_rejected() {
    let mut store = store();
    let mut wizard = IntakeWizard::new("Sarah", "sarah@example.com", "shop.myshopify.com");
    wizard.advance().unwrap();
    wizard.advance().unwrap();
    wizard.category = TicketType::Styling;
    wizard.subcategory = Some("Custom CSS".to_string());
    wizard.impact = TicketPriority::Critical;
    wizard.advance().unwrap();

    let mut healthy = store.context_for(None, None).unwrap();
    healthy.store.theme_integration_verified = true;
    healthy.discount_logs.clear();
    wizard
        .run_diagnostics(&SystemChecklist::default(), &healthy, &RemediationLedger::new())
        .unwrap();

    let draft = wizard.submit().unwrap();
    let reports = vec![wizard.diagnostics().cloned().unwrap()];
    assert_eq!(
        store.create_ticket(draft, &reports),
        Err(TriageError::UncorroboratedCritical(TicketPriority::Critical))
    );
}

#[test]
fn test_resolved_ticket_is_closed() {
    let mut store = store();
    store
        .update_ticket(
            "tkt_003",
            TicketUpdate {
                status: Some(TicketStatus::Resolved),
                ..Default::default()
            },
        )
        .unwrap();

    let reopen = store.update_ticket(
        "tkt_003",
        TicketUpdate {
            status: Some(TicketStatus::Open),
            ..Default::default()
        },
    );
    assert!(matches!(reopen, Err(TriageError::TicketResolved { .. })));
    assert!(matches!(
        store.diagnose_ticket("tkt_003", &SystemChecklist::default()),
        Err(TriageError::DiagnosticsClosed(_))
    ));
}
