//! Idle desk sweeper.
//!
//! DESIGN
//! ======
//! Desks are dropped on logout and on a rejected token, but a browser that
//! simply stops coming back leaves its desk behind. A background task
//! periodically removes desks nobody has touched for `DESK_IDLE_SECS`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::env_parse;
use crate::state::AppState;

const DEFAULT_DESK_IDLE_SECS: u64 = 8 * 60 * 60;
const DEFAULT_DESK_SWEEP_INTERVAL_SECS: u64 = 300;

/// Remove desks idle for at least `idle`. Returns how many were removed.
pub async fn sweep_idle_desks(state: &AppState, idle: Duration) -> usize {
    let mut desks = state.desks.write().await;
    let before = desks.len();
    desks.retain(|_, entry| entry.touched.elapsed() < idle);
    before - desks.len()
}

/// Spawn the background sweeper. Returns a handle for shutdown.
pub fn spawn_desk_sweeper(state: AppState) -> JoinHandle<()> {
    let idle = Duration::from_secs(env_parse("DESK_IDLE_SECS", DEFAULT_DESK_IDLE_SECS));
    let every = Duration::from_secs(env_parse("DESK_SWEEP_INTERVAL_SECS", DEFAULT_DESK_SWEEP_INTERVAL_SECS).max(1));
    tracing::info!(idle_secs = idle.as_secs(), interval_secs = every.as_secs(), "desk sweeper configured");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = sweep_idle_desks(&state, idle).await;
            if removed > 0 {
                tracing::info!(removed, "swept idle doctor desks");
            }
        }
    })
}

#[cfg(test)]
#[path = "sweeper_test.rs"]
mod tests;
