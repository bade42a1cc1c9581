use clap::Parser;

/// Library and study-room manager
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	/// SQLite database to open, `:memory:` for a throwaway one
	#[arg(long, env = "DATABASE_URL", default_value = "sqlite://library.db")]
	pub database_url: String,

	/// Size of the connection pool
	#[arg(long, default_value_t = 5)]
	pub max_connections: u32,

	/// Seconds to wait for a free connection
	#[arg(long, default_value_t = 3)]
	pub acquire_timeout_secs: u64,

	/// Clear every room reservation at local midnight
	#[arg(long)]
	pub daily_reset: bool,

	/// Log filter directive, written to stderr
	#[arg(long = "log", env = "LIBRARY_LOG", default_value = "warn")]
	pub log_filter: String,
}
