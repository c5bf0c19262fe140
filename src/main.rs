use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use support_diagnostics::config::load_workspace_or_demo;
use support_diagnostics::models::{
    Device, ShopperContext, TicketPriority, TicketType, VisibilityVerdict,
};
use support_diagnostics::triage::IssueScope;
use support_diagnostics::{
    AudienceSimulator, CliConfig, DelayedReveal, DependencyChainBuilder, DiagnosticReport,
    FileSnapshotWriter, IntakeWizard, RemediationLedger, SnapshotWriter, SystemChecklist,
    WorkspaceStore,
};

/// Support diagnostics CLI: system checks, visibility chains and ticket intake
#[derive(Parser, Debug)]
#[command(name = "support-diagnostics")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Workspace file (YAML or JSON); the bundled demo store when omitted
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Write snapshots of the results to the configured snapshots directory
    #[arg(long, global = true)]
    save: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Debug, Clone)]
struct ShopperArgs {
    /// Simulated cart total
    #[arg(long, value_parser = parse_cart_total)]
    cart_total: Option<f64>,

    /// Simulated customer tags (comma separated)
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Simulated device (Desktop, Mobile)
    #[arg(long, value_parser = parse_label::<Device>, default_value = "Desktop")]
    device: Device,
}

impl ShopperArgs {
    fn to_shopper(&self) -> Option<ShopperContext> {
        if self.cart_total.is_none() && self.tags.is_empty() {
            return None;
        }
        Some(ShopperContext {
            cart_total: self.cart_total.unwrap_or_default(),
            tags: self.tags.iter().map(|t| t.trim().to_string()).collect(),
            device: self.device,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the system checklist against the store (and optionally a widget)
    Diagnose {
        /// Widget to include in the checks
        #[arg(long)]
        widget: Option<String>,

        /// Diagnose the widget attached to an existing ticket
        #[arg(long, conflicts_with = "widget")]
        ticket: Option<String>,

        /// Apply the instant fix at these report indices
        #[arg(long, value_delimiter = ',')]
        fix: Vec<usize>,
    },

    /// Trace the five-stage visibility chain of a widget
    Chain {
        #[arg(long)]
        widget: String,

        #[command(flatten)]
        shopper: ShopperArgs,

        /// Apply the instant fix at these stage indices
        #[arg(long, value_delimiter = ',')]
        fix: Vec<usize>,
    },

    /// Simulate whether a shopper would see a widget
    Simulate {
        /// Widget whose audience rule is used; the default rule when omitted
        #[arg(long)]
        widget: Option<String>,

        #[command(flatten)]
        shopper: ShopperArgs,
    },

    /// File a support ticket through the intake flow
    Ticket(TicketArgs),
}

#[derive(Args, Debug)]
struct TicketArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    store_url: String,

    /// Widget the issue is about
    #[arg(long)]
    widget: Option<String>,

    /// Campaign the issue is about
    #[arg(long, conflicts_with = "widget")]
    campaign: Option<String>,

    /// Bug, Configuration, Styling, Migration, Feature Request
    #[arg(long, value_parser = parse_label::<TicketType>, default_value = "Bug")]
    category: TicketType,

    #[arg(long)]
    subcategory: String,

    /// Low, Medium, High, Critical
    #[arg(long, value_parser = parse_label::<TicketPriority>, default_value = "Medium")]
    impact: TicketPriority,

    #[arg(long, default_value = "")]
    subject: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Page where the issue shows up
    #[arg(long)]
    issue_url: Option<String>,

    /// Apply the instant fix at these diagnostic indices before filing
    #[arg(long, value_delimiter = ',')]
    fix: Vec<usize>,
}

/// Parse a CLI value through the type's serde label
fn parse_label<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown value '{}'", s))
}

/// Parse a cart total, rejecting NaN and infinities
fn parse_cart_total(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid cart total '{}'", s))?;
    if !value.is_finite() {
        return Err(format!("cart total must be a finite number, got '{}'", s));
    }
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let Some(command) = cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        eprintln!("Example: support-diagnostics chain --widget wdg_123 --tags VIP --cart-total 80");
        std::process::exit(1);
    };

    let config = CliConfig::load_or_default(cli.global.config.as_ref())
        .context("Failed to load configuration")?;
    let workspace = load_workspace_or_demo(cli.global.workspace.as_deref())?;
    let store = WorkspaceStore::new(workspace);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let app = App {
        global: cli.global,
        reveal: DelayedReveal::from_config(&config.presentation, cancel),
        writer: FileSnapshotWriter::new(config.output.clone()),
        ledger: RemediationLedger::new(),
        config,
    };

    match command {
        Command::Diagnose {
            widget,
            ticket,
            fix,
        } => app.diagnose(store, widget, ticket, fix).await,
        Command::Chain {
            widget,
            shopper,
            fix,
        } => app.chain(store, widget, shopper, fix).await,
        Command::Simulate { widget, shopper } => app.simulate(store, widget, shopper).await,
        Command::Ticket(args) => app.ticket(store, args).await,
    }
}

struct App {
    global: GlobalArgs,
    config: CliConfig,
    reveal: DelayedReveal,
    writer: FileSnapshotWriter,
    ledger: RemediationLedger,
}

impl App {
    fn apply_fixes(
        &self,
        mut report: DiagnosticReport,
        fixes: &[usize],
    ) -> Result<DiagnosticReport> {
        for &index in fixes {
            report = self
                .ledger
                .apply_fix(&report, index)
                .with_context(|| format!("Cannot apply fix {}", index))?;
        }
        Ok(report)
    }

    async fn diagnose(
        &self,
        store: WorkspaceStore,
        widget: Option<String>,
        ticket: Option<String>,
        fixes: Vec<usize>,
    ) -> Result<()> {
        let checklist = SystemChecklist::default();
        let report = match &ticket {
            Some(id) => store.diagnose_ticket(id, &checklist)?,
            None => {
                let ctx = store.context_for(widget.as_deref(), None)?;
                checklist.run_all(&ctx)
            }
        };
        let report = self.apply_fixes(report, &fixes)?;

        let Some(report) = self.reveal.reveal(report).await else {
            return Ok(());
        };
        if self.global.save {
            self.writer.write_report(&report).await?;
        }
        if self.global.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report("System Diagnostics", &report);
        }
        Ok(())
    }

    async fn chain(
        &self,
        store: WorkspaceStore,
        widget_id: String,
        shopper: ShopperArgs,
        fixes: Vec<usize>,
    ) -> Result<()> {
        let ctx = store.context_for(Some(&widget_id), shopper.to_shopper())?;
        let widget = store
            .widget(&widget_id)
            .with_context(|| format!("Unknown widget {}", widget_id))?;

        let mut chain = DependencyChainBuilder::new().build_chain(widget, &ctx);
        for index in fixes {
            chain = self
                .ledger
                .apply_chain_fix(&chain, index)
                .with_context(|| format!("Cannot apply fix {}", index))?;
        }

        let Some(chain) = self.reveal.reveal(chain).await else {
            return Ok(());
        };
        if self.global.save {
            self.writer.write_chain(&chain).await?;
        }
        if self.global.json {
            println!("{}", serde_json::to_string_pretty(&chain)?);
        } else {
            print_report(&format!("Dependency Chain: {}", widget_id), chain.report());
        }
        Ok(())
    }

    async fn simulate(
        &self,
        store: WorkspaceStore,
        widget_id: Option<String>,
        shopper: ShopperArgs,
    ) -> Result<()> {
        let rule = match &widget_id {
            Some(id) => store
                .widget(id)
                .with_context(|| format!("Unknown widget {}", id))?
                .audience
                .clone()
                .unwrap_or_else(|| self.config.engine.fallback_audience()),
            None => self.config.engine.fallback_audience(),
        };

        let shopper = shopper.to_shopper();
        let verdict = AudienceSimulator::new().simulate(shopper.as_ref(), &rule);

        let Some(verdict) = self.reveal.reveal(verdict).await else {
            return Ok(());
        };
        if self.global.json {
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        } else {
            print_verdict(&rule.label, &verdict);
        }
        Ok(())
    }

    async fn ticket(&self, mut store: WorkspaceStore, args: TicketArgs) -> Result<()> {
        let mut wizard = IntakeWizard::new(&args.name, &args.email, &args.store_url);
        wizard.advance()?;

        wizard.scope = match (&args.widget, &args.campaign) {
            (Some(w), _) => IssueScope::Widget(w.clone()),
            (None, Some(c)) => IssueScope::Campaign(c.clone()),
            (None, None) => IssueScope::Global,
        };
        wizard.advance()?;

        wizard.category = args.category;
        wizard.subcategory = Some(args.subcategory.clone());
        wizard.impact = args.impact;
        wizard.advance()?;

        wizard.subject = args.subject.clone();
        wizard.description = args.description.clone();
        wizard.issue_url = args.issue_url.clone();

        let ctx = store.context_for(wizard.selected_widget(), None)?;
        wizard.run_diagnostics(&SystemChecklist::default(), &ctx, &self.ledger)?;
        for &index in &args.fix {
            wizard
                .apply_fix(&self.ledger, index)
                .with_context(|| format!("Cannot apply fix {}", index))?;
        }

        let draft = wizard.submit()?;
        let diagnostics: Vec<DiagnosticReport> = wizard.diagnostics().cloned().into_iter().collect();
        let ticket = store.create_ticket(draft, &diagnostics)?;
        info!("Filed ticket {}", ticket.id);

        if self.global.save {
            self.writer.write_ticket(&ticket).await?;
            for report in &diagnostics {
                self.writer.write_report(report).await?;
            }
        }

        if self.global.json {
            println!("{}", serde_json::to_string_pretty(&ticket)?);
        } else {
            println!("\n========================================");
            println!("Ticket {} created", ticket.id);
            println!("========================================");
            println!("Subject: {}", ticket.subject);
            println!("Priority: {}", ticket.priority);
            println!("Tags: {}", ticket.tags.join(", "));
            println!("\n{}", ticket.description);
        }
        Ok(())
    }
}

fn print_report(title: &str, report: &DiagnosticReport) {
    println!("\n========================================");
    println!("{}", title);
    println!("========================================");
    for (i, r) in report.results().iter().enumerate() {
        let label = if r.label.is_empty() {
            String::new()
        } else {
            format!(" ({})", r.label)
        };
        let badge = if r.fixed {
            " [fixed]"
        } else if r.fixable {
            " [instant fix available]"
        } else {
            ""
        };
        println!(
            "{:>2}. [{}] {}{}: {}{}",
            i,
            r.status.to_string().to_uppercase(),
            r.step,
            label,
            r.detail,
            badge
        );
    }
    println!("\nReport: {}  Severity: {}", report.id(), report.severity());
}

fn print_verdict(rule: &str, verdict: &VisibilityVerdict) {
    println!("Audience rule: {}", rule);
    if verdict.visible {
        println!("✅ {}", verdict);
    } else {
        println!("⛔ {}", verdict);
    }
}
