//! `pyrescout-cli` – fleet search command line.
//!
//! This binary is the entry point for a PyreScout mission.  It:
//!
//! 1. Loads `~/.pyrescout/config.toml` (writing defaults on first run).
//! 2. Intercepts **Ctrl-C** and arms the shared cancel token so every agent
//!    finishes its current iteration, lands, and disarms before exit.
//! 3. Runs either the full-fleet **search** mission (default) or the
//!    single-agent interactive **goto** mode.
//!
//! ```text
//! pyrescout            # search with every configured agent
//! pyrescout search
//! pyrescout goto Scout0
//! ```

mod config;
mod goto;

use std::sync::Arc;

use colored::Colorize;
use pyrescout_evidence::FsEvidenceStore;
use pyrescout_hal::{FleetProvider, SimProvider};
use pyrescout_perception::HotspotDetector;
use pyrescout_runtime::{CancelToken, FleetOrchestrator, SearchOutcome, init_tracing};
use tracing::warn;

fn main() {
    // Hold the guard for the whole process so spans flush on exit.
    let _telemetry = init_tracing("pyrescout");

    print_banner();

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  No config found; defaults written to {}",
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Could not write default config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Ctrl-C → cancel token ─────────────────────────────────────────────
    let cancel = CancelToken::new();
    let cancel_for_ctrlc = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – agents will land after their current pass …"
                .yellow()
                .bold()
        );
        cancel_for_ctrlc.cancel();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful interrupt will not be available");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Failed to start async runtime".red(), e);
            return;
        }
    };

    let provider = build_provider(&cfg);
    let detector = Arc::new(HotspotDetector::new(
        cfg.sim_fire_position,
        cfg.sim_fire_radius,
        0.9,
    ));

    // ── Mode dispatch ─────────────────────────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("search") => run_search(&runtime, &cfg, provider, detector, cancel),
        Some("goto") => match args.get(1) {
            Some(agent) if cfg.agents.contains(agent) => {
                runtime.block_on(goto::run(provider, agent, cfg.goto_speed, cancel));
            }
            Some(agent) => {
                println!(
                    "{}: agent {} is not in the configured fleet ({})",
                    "Error".red(),
                    agent.bold(),
                    cfg.agents.join(", ")
                );
            }
            None => println!("{}: usage: pyrescout goto <agent>", "Error".red()),
        },
        Some(other) => {
            println!("{}: unknown mode `{}`", "Error".red(), other);
            println!("  Modes: {} (default), {}", "search".bold(), "goto <agent>".bold());
        }
    }
}

fn run_search(
    runtime: &tokio::runtime::Runtime,
    cfg: &config::Config,
    provider: Arc<dyn FleetProvider>,
    detector: Arc<HotspotDetector>,
    cancel: CancelToken,
) {
    let store = match FsEvidenceStore::new(&cfg.evidence_root, cfg.search.confidence_threshold) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            println!("{}: {}", "Could not prepare evidence directories".red(), e);
            return;
        }
    };
    println!(
        "  Evidence collections under {}\n",
        cfg.evidence_root.bold()
    );

    let orchestrator = FleetOrchestrator::new(
        cfg.agents.clone(),
        provider,
        detector,
        store,
        cfg.search.clone(),
        cancel,
    );
    let outcomes = runtime.block_on(orchestrator.run());

    println!();
    println!("  {}", "Mission summary".bold());
    let mut agents: Vec<&String> = outcomes.keys().collect();
    agents.sort();
    for agent in agents {
        match &outcomes[agent] {
            SearchOutcome::Detected { score, position } => println!(
                "    {} {} – fire detected (confidence {:.2}) at {}",
                "✓".green().bold(),
                agent.bold(),
                score,
                position
            ),
            SearchOutcome::Interrupted => {
                println!("    {} {} – interrupted by operator", "•".yellow(), agent.bold())
            }
            SearchOutcome::Failed => {
                println!("    {} {} – sensor failure", "✗".red().bold(), agent.bold())
            }
            SearchOutcome::Rejected => {
                println!("    {} {} – setup rejected", "✗".red().bold(), agent.bold())
            }
        }
    }
    println!();
}

fn build_provider(cfg: &config::Config) -> Arc<SimProvider> {
    let mut provider = SimProvider::new();
    for agent in &cfg.agents {
        provider = provider.with_agent(agent.clone());
    }
    Arc::new(provider)
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ___                  ____                 __"#.bold().red());
    println!("{}", r#"  / _ \__ _________ ___/ __/______  __ _____/ /_"#.bold().red());
    println!("{}", r#" / ___/ // / __/ -_|___)\ \/ __/ _ \/ // / __/ _/"#.bold().red());
    println!("{}", r#"/_/   \_, /_/  \__/  /___/\__/\___/\_,_/\__/\__/"#.bold().red());
    println!("{}", r#"     /___/"#.bold().red());
    println!();
    println!(
        "  {} {}",
        "PyreScout".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Drone fleet fire-search coordinator");
    println!();
}
