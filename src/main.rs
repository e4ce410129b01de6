//! UPGRADER: profit-per-hour upgrade investment optimizer
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores user settings from disk (or prompts for them), and runs the
//! scan→plan→buy loop with graceful shutdown.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{error, info, warn};

use upgrader::api::kombat::KombatClient;
use upgrader::api::GameApi;
use upgrader::config::AppConfig;
use upgrader::engine::executor::Executor;
use upgrader::engine::report::CycleReport;
use upgrader::engine::scanner::Scanner;
use upgrader::planner::{Opportunity, Planner, PlannerConfig};
use upgrader::storage::{self, Settings};

const BANNER: &str = r#"
 _   _ ____   ____ ____      _    ____  _____ ____
| | | |  _ \ / ___|  _ \    / \  |  _ \| ____|  _ \
| | | | |_) | |  _| |_) |  / _ \ | | | |  _| | |_) |
| |_| |  __/| |_| |  _ <  / ___ \| |_| | |___|  _ <
 \___/|_|    \____|_| \_\/_/   \_\____/|_____|_| \_\

  Profit-per-hour upgrade optimizer
  v0.1.0
"#;

const RULE: &str = "============================";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        cycle_interval_secs = cfg.agent.cycle_interval_secs,
        dry_run = cfg.agent.dry_run,
        interactive = cfg.agent.interactive,
        "UPGRADER starting up"
    );

    // -- Settings --------------------------------------------------------

    let settings = match storage::load_settings(Some(&cfg.agent.settings_file))? {
        Some(s) => s,
        None => {
            let s = prompt_settings().await?;
            storage::save_settings(&s, Some(&cfg.agent.settings_file))?;
            info!(path = %cfg.agent.settings_file, "Saved settings");
            s
        }
    };

    let authorization = cfg
        .api
        .authorization_env
        .as_deref()
        .and_then(|env| AppConfig::resolve_env(env).ok())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| settings.authorization.clone());

    // -- Initialise components -------------------------------------------

    let api: Arc<dyn GameApi> = Arc::new(KombatClient::from_config(
        &cfg.api,
        SecretString::new(authorization),
    )?);

    let scanner = Scanner::new(api.clone());
    let planner = Planner::new(PlannerConfig {
        min_bundle_profit: cfg.optimizer.min_bundle_profit,
        search: cfg.optimizer.search_config(),
    });
    let executor = Executor::new(api, cfg.agent.dry_run, cfg.purchase_delay());

    // -- Main loop -------------------------------------------------------

    let mut interval = cfg.cycle_timer();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.agent.cycle_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                cycle += 1;
                match run_cycle(cycle, &cfg, &settings, &scanner, &planner, &executor).await {
                    Ok(report) => report.log(),
                    Err(e) => error!(cycle, error = %format!("{e:#}"), "Cycle failed, continuing to next"),
                }
                info!(
                    hours = cfg.agent.cycle_interval_secs as f64 / 3600.0,
                    "Waiting before next run"
                );
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(cycles = cycle, "UPGRADER shut down cleanly.");
    Ok(())
}

/// Run a single scan→plan→choose→buy cycle.
async fn run_cycle(
    cycle: u64,
    cfg: &AppConfig,
    settings: &Settings,
    scanner: &Scanner,
    planner: &Planner,
    executor: &Executor,
) -> Result<CycleReport> {
    info!(cycle, "Starting cycle");

    // 1. Scan catalog
    let scan = scanner.scan().await?;

    // 2. Rank bundle opportunities
    let (opportunities, decisions) = planner.rank(&scan.purchasable);
    let mut report =
        CycleReport::planned(cycle, scan.listed, scan.purchasable.len(), &decisions);

    if opportunities.is_empty() {
        info!("No bundle beats buying upgrades individually this cycle");
        return Ok(report);
    }

    print_opportunities(&opportunities);

    // 3. Pick a plan
    let Some(choice) = choose(&opportunities, cfg.agent.interactive).await? else {
        return Ok(report);
    };
    let plan = &opportunities[choice];
    print_plan(plan);

    // 4. Buy it
    let execution = executor
        .execute_plan(&plan.bundle, settings.min_balance_threshold)
        .await?;

    println!("{RULE}");
    match &execution.stop_reason {
        Some(reason) => println!("Stopped: {reason}."),
        None if execution.failed.is_empty() => println!("Items are finished."),
        None => println!("{} purchase(s) failed.", execution.failed.len()),
    }
    println!("{RULE}");

    report.record_execution(&plan.candidate.id, &execution);
    Ok(report)
}

fn print_opportunities(opportunities: &[Opportunity]) {
    for (i, opp) in opportunities.iter().enumerate() {
        println!("{}) {opp}", i + 1);
    }
}

fn print_plan(plan: &Opportunity) {
    println!("{RULE}");
    println!("Budget: {:.0}", plan.budget);
    println!("Number of upgrades: {}", plan.bundle.len());
    for (i, upgrade) in plan.bundle.iter().enumerate() {
        println!("{RULE}");
        println!("{}) Best item to buy: {} in section: {}", i + 1, upgrade.id, upgrade.section);
        println!("Price: {:.0}", upgrade.price);
        println!("Profit per hour: {:.0}", upgrade.profit_per_hour);
    }
}

/// Index of the opportunity to execute: asked on stdin when interactive,
/// otherwise the top-ranked one.
async fn choose(opportunities: &[Opportunity], interactive: bool) -> Result<Option<usize>> {
    if !interactive {
        return Ok(Some(0));
    }

    let answer = read_line("Choice (0 to skip): ").await?;
    match answer.trim().parse::<usize>() {
        Ok(0) => Ok(None),
        Ok(n) if n <= opportunities.len() => Ok(Some(n - 1)),
        _ => {
            warn!(answer = %answer.trim(), "Invalid choice, skipping this cycle");
            Ok(None)
        }
    }
}

/// Ask for the settings on first run.
async fn prompt_settings() -> Result<Settings> {
    let authorization = read_line("Enter Authorization [Example: Bearer 171852....]: ").await?;
    let threshold = read_line(
        "Enter minimum balance threshold (purchases stop if the balance would drop below it): ",
    )
    .await?;
    let min_balance_threshold = threshold
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid threshold: {}", threshold.trim()))?;

    Ok(Settings {
        authorization: authorization.trim().to_string(),
        min_balance_threshold,
    })
}

async fn read_line(prompt: &str) -> Result<String> {
    use std::io::Write;

    print!("{prompt}");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .context("stdin reader task failed")?
    .context("Failed to read from stdin")
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("upgrader=info"));

    let json_logging = std::env::var("UPGRADER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
