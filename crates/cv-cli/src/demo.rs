//! Animated playback of the impossibility cycle.
//!
//! One cycle step per tick of a tokio interval. Rendering is an observer on
//! the session, so the terminal sees exactly the transitions the state
//! commits. Ctrl-C halts the player between steps.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use cv_core::{ComplexityState, CyclePlayer, ObserverResult, StateEvent, generate_cycle};

pub struct DemoOptions {
    pub interval: Duration,
    pub loops: u32,
    pub export: Option<PathBuf>,
}

pub async fn run(mut state: ComplexityState, options: DemoOptions) -> Result<()> {
    let cycle = generate_cycle(&state.current(), state.deltas(), state.weights());
    let paradox = cycle.paradox;
    let mut player = CyclePlayer::new(cycle);

    state.subscribe(render_event);

    let mut ticker = tokio::time::interval(options.interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut completed = 0u32;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if player.advance(&mut state).is_some() {
                    continue;
                }
                completed += 1;
                println!(
                    "cycle {completed}: scalar {:.4} -> {:.4} -> {:.4} after {:.2} improvement",
                    paradox.initial_scalar,
                    paradox.peak_scalar,
                    paradox.final_scalar,
                    paradox.total_delta,
                );
                if completed >= options.loops {
                    break;
                }
                player.restart();
            }
            signal = &mut ctrl_c => {
                signal.context("failed to listen for ctrl-c")?;
                player.halt();
                tracing::info!(position = player.position(), "demo interrupted");
                println!("halted at step {}", player.position());
                break;
            }
        }
    }

    if let Some(path) = &options.export {
        let json = state.export_json().context("failed to serialize session")?;
        std::fs::write(path, &json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("exported to {}", path.display());
    }
    Ok(())
}

fn render_event(event: &StateEvent, state: &ComplexityState) -> ObserverResult {
    let mut out = std::io::stdout().lock();
    match event {
        StateEvent::VectorUpdate { vector, label, .. } => {
            write!(out, "{label:<18} {vector}  scalar {:.4}", state.scalar())?;
            match state.last_signal_loss() {
                Some(report) if report.has_loss => {
                    writeln!(out, "  lost {:.3} ({})", report.total, report.loss_type.as_str())?
                }
                _ => writeln!(out)?,
            }
        }
        other => writeln!(out, "{}", other.kind())?,
    }
    Ok(())
}
