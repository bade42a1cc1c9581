// library system

use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lsys::{schedule, shell::Shell, sql, AppResult, Config, Registry, SqliteStore};

#[tokio::main]
async fn main() -> AppResult<()> {
	// a missing .env is fine, the environment and flags still apply
	dotenvy::dotenv().ok();
	let config = Config::parse();

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::new(&config.log_filter))
		.with_writer(std::io::stderr)
		.init();

	let pool = sql::open(&config).await?;
	info!(url = %config.database_url, "database ready");

	let rooms = Registry::new(SqliteStore::new(pool.clone()));
	let reset = config.daily_reset.then(|| schedule::spawn_daily_reset(rooms.clone()));

	let session = info_span!("session", id = %Uuid::new_v4());
	Shell::new(pool.clone(), rooms, BufReader::new(tokio::io::stdin()), std::io::stdout())
		.run()
		.instrument(session)
		.await?;

	if let Some(task) = reset {
		task.abort();
	}
	pool.close().await;
	Ok(())
}
