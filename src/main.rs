//! Command-line front-end: trigger one refresh, wait for it, print the log rows.

// std
use std::path::PathBuf;
// crates.io
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use aas_refresh::{
	driver::{DriverConfig, Persistence, RefreshDriver},
	request::TableSelector,
	url::Url,
};

#[derive(Debug, Parser)]
#[command(
	name = "aas-refresh",
	version,
	about = "Trigger and monitor an Azure Analysis Services model refresh"
)]
struct Cli {
	/// TOML settings file; flags override its values.
	#[arg(long, env = "AAS_CONFIG")]
	config: Option<PathBuf>,
	/// Directory (tenant) id or domain.
	#[arg(long, env = "AAS_TENANT")]
	tenant: Option<String>,
	/// Azure region hosting the server.
	#[arg(long, env = "AAS_REGION")]
	region: Option<String>,
	/// Analysis Services server name.
	#[arg(long, env = "AAS_SERVER")]
	server: Option<String>,
	/// Model (database) name.
	#[arg(long, env = "AAS_MODEL")]
	model: Option<String>,
	/// Refresh mode: full, default, or table.
	#[arg(long)]
	mode: Option<String>,
	/// Table to refresh in table mode, as `Table` or `Table=Partition`. Repeatable.
	#[arg(long = "table")]
	tables: Vec<TableSelector>,
	/// JSON Lines file receiving the log rows; empty disables persistence.
	#[arg(long, env = "AAS_LOG_PATH")]
	log_path: Option<PathBuf>,
	/// Service principal application id.
	#[arg(long, env = "AAS_CLIENT_ID")]
	client_id: Option<String>,
	/// Service principal secret.
	#[arg(long, env = "AAS_CLIENT_SECRET", hide_env_values = true)]
	client_secret: Option<String>,
	/// Seconds between status checks.
	#[arg(long)]
	interval: Option<u64>,
	/// Identity provider override.
	#[arg(long)]
	authority: Option<Url>,
	/// Management endpoint override.
	#[arg(long)]
	endpoint: Option<Url>,
}
impl Cli {
	fn into_config(self) -> Result<DriverConfig> {
		let mut config = match &self.config {
			Some(path) => DriverConfig::from_path(path)
				.wrap_err_with(|| format!("Failed to load settings from {}", path.display()))?,
			None => DriverConfig::default(),
		};

		macro_rules! apply {
			($($field:ident),+) => {
				$(if let Some(value) = self.$field {
					config.$field = value;
				})+
			};
		}

		apply!(tenant, region, server, model, mode, client_id, client_secret, interval);

		if !self.tables.is_empty() {
			config.tables = self.tables;
		}
		if self.log_path.is_some() {
			config.log_path = self.log_path;
		}
		if self.authority.is_some() {
			config.authority = self.authority;
		}
		if self.endpoint.is_some() {
			config.endpoint = self.endpoint;
		}

		Ok(config)
	}
}

fn init_logging() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	init_logging();

	let config = Cli::parse().into_config()?;
	let driver = RefreshDriver::new();
	let report = driver.run(&config).await?;

	println!("Log_Timestamp | Server | Model | Event_desc | Success_YN");

	for row in &report.rows {
		println!("{row}");
	}

	match &report.persistence {
		Persistence::Disabled => {},
		Persistence::Written { rows } => tracing::info!(rows, "Log rows persisted."),
		Persistence::Failed(e) => tracing::warn!(error = %e, "Log rows were not persisted."),
	}

	report.ensure_succeeded()?;

	Ok(())
}
