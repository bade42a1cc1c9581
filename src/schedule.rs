use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::rooms::Registry;
use crate::store::Store;
use crate::time::until_next_midnight;

/// Spawns a task that wipes all room reservations at every local midnight.
pub fn spawn_daily_reset<S>(rooms: Registry<S>) -> JoinHandle<()>
where
	S: Store + 'static,
{
	spawn_reset_loop(rooms, || until_next_midnight(Local::now().naive_local()))
}

/// Spawns a task that sleeps for whatever `next_wait` returns, wipes all
/// room reservations, and repeats until aborted.
pub fn spawn_reset_loop<S, F>(rooms: Registry<S>, mut next_wait: F) -> JoinHandle<()>
where
	S: Store + 'static,
	F: FnMut() -> Duration + Send + 'static,
{
	tokio::spawn(async move {
		loop {
			let wait = next_wait();
			info!(secs = wait.as_secs(), "next room reset scheduled");
			tokio::time::sleep(wait).await;

			match rooms.reset_all().await {
				Ok(removed) => info!(removed, "daily room reset done"),
				Err(e) => error!(error = %e, "daily room reset failed"),
			}
		}
	})
}
