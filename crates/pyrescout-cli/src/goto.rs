//! Operator-directed flight – the `goto` mode.
//!
//! Puts a single agent under control, takes it off, then reads target
//! coordinates from stdin one line at a time (`x y z`, NED metres) and flies
//! the agent to each.  `q` lands, disarms, and releases the agent; so does
//! Ctrl-C at the next prompt.

use std::sync::Arc;

use colored::Colorize;
use pyrescout_hal::FleetProvider;
use pyrescout_runtime::{CancelToken, teardown_best_effort};
use pyrescout_types::{Vec3, Waypoint};
use tracing::warn;

/// Fly `agent` interactively until the operator quits or cancels.
pub async fn run(provider: Arc<dyn FleetProvider>, agent: &str, speed: f32, cancel: CancelToken) {
    println!("  Taking control of {} …", agent.bold());
    if let Err(e) = setup(provider.as_ref(), agent).await {
        println!("{}: {}", "Setup failed".red(), e);
        // Takeoff may have failed after arming: release whatever we hold.
        teardown_best_effort(provider.as_ref(), agent, false).await;
        return;
    }
    println!("  {} {} is airborne.", "✓".green().bold(), agent.bold());
    println!(
        "  Enter target as {} (NED metres, negative z is up), or {} to land and quit.\n",
        "x y z".bold(),
        "q".bold()
    );

    loop {
        if cancel.is_cancelled() {
            println!("  Interrupt received – landing {}.", agent.bold());
            break;
        }
        let line = prompt_line(&format!("  {} goto> ", agent));
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("q") {
            break;
        }
        let target = match parse_coords(trimmed) {
            Some(t) => t,
            None => {
                println!("  {} expected three numbers, e.g. `10 -45 -12`", "?".yellow());
                continue;
            }
        };
        let waypoint = Waypoint {
            position: target,
            speed,
        };
        println!("  Flying to {} at {:.1} m/s …", target, speed);
        match provider.move_to(agent, &waypoint).await {
            Ok(()) => println!("  {} Reached {}.", "✓".green().bold(), target),
            Err(e) => {
                warn!(agent, error = %e, "goto move rejected");
                println!("  {}: {}", "Move failed".red(), e);
            }
        }
    }

    teardown_best_effort(provider.as_ref(), agent, true).await;
    println!("  {} {} landed and released.", "✓".green().bold(), agent.bold());
}

async fn setup(provider: &dyn FleetProvider, agent: &str) -> Result<(), String> {
    provider
        .enable_control(agent, true)
        .await
        .map_err(|e| e.to_string())?;
    provider.arm(agent, true).await.map_err(|e| e.to_string())?;
    provider.takeoff(agent).await.map_err(|e| e.to_string())?;
    Ok(())
}

/// Parse a whitespace-separated `x y z` triple.
fn parse_coords(line: &str) -> Option<Vec3> {
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse::<f32>().ok()?;
    let y = parts.next()?.parse::<f32>().ok()?;
    let z = parts.next()?.parse::<f32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Vec3::new(x, y, z))
}

fn prompt_line(msg: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        // EOF behaves like `q`.
        Ok(0) => "q".to_string(),
        Ok(_) => line,
        Err(_) => "q".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_triple() {
        assert_eq!(
            parse_coords("10 -45.5 -12"),
            Some(Vec3::new(10.0, -45.5, -12.0))
        );
    }

    #[test]
    fn rejects_short_and_long_input() {
        assert_eq!(parse_coords("10 -45"), None);
        assert_eq!(parse_coords("1 2 3 4"), None);
        assert_eq!(parse_coords(""), None);
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_eq!(parse_coords("north west up"), None);
    }
}
