//! Invocation parameters and their validation.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ClientSecret, Credentials, ModelName, Region, ServerName, TenantId},
	error::{ConfigError, ValidationError},
	poll::DEFAULT_POLL_INTERVAL,
	request::{
		CommitMode, DEFAULT_MAX_PARALLELISM, DEFAULT_RETRY_COUNT, RefreshMode, RefreshRequest,
		RefreshTarget, TableSelector,
	},
};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "westeurope";

/// Raw entry-point parameters, as read from a settings file or command-line flags.
///
/// Nothing is validated until [`DriverConfig::plan`]; every field has a per-instance default.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
	/// Directory (tenant) id or domain.
	pub tenant: String,
	/// Azure region hosting the server.
	pub region: String,
	/// Server name.
	pub server: String,
	/// Model name.
	pub model: String,
	/// `full`, `default`, or `table`, case-insensitive.
	pub mode: String,
	/// Tables or partitions refreshed in table mode.
	pub tables: Vec<TableSelector>,
	/// Log file; unset or empty disables persistence.
	#[serde(alias = "logPath")]
	pub log_path: Option<PathBuf>,
	/// Service principal application id.
	#[serde(alias = "clientid")]
	pub client_id: String,
	/// Service principal secret.
	#[serde(alias = "clientsecret")]
	pub client_secret: String,
	/// Seconds between status checks.
	pub interval: u64,
	/// OAuth scope override.
	pub scope: Option<String>,
	/// Commit semantics requested from the server.
	pub commit_mode: CommitMode,
	/// Parallelism hint sent to the server.
	pub max_parallelism: u32,
	/// Remote retry count sent to the server.
	pub retry_count: u32,
	/// Identity provider override (sovereign clouds, mocks).
	pub authority: Option<Url>,
	/// Management endpoint override; replaces `https://{region}.asazure.windows.net`.
	pub endpoint: Option<Url>,
}
impl DriverConfig {
	/// Parses settings from TOML text.
	pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(contents)
	}

	/// Reads and parses a TOML settings file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::SettingsRead { path: path.to_path_buf(), source })?;
		let config = Self::from_toml_str(&contents)
			.map_err(|source| ConfigError::SettingsParse { path: path.to_path_buf(), source })?;

		tracing::debug!(path = %path.display(), "Loaded refresh settings.");

		Ok(config)
	}

	/// Validates every parameter and resolves the typed plan.
	///
	/// Server and model are checked first, so a missing target fails before credentials are
	/// looked at. No network call is made here.
	pub fn plan(&self) -> Result<RefreshPlan> {
		let server = ServerName::new(&self.server)?;
		let model = ModelName::new(&self.model)?;
		let mode = self.mode.parse::<RefreshMode>()?;

		if self.interval == 0 {
			return Err(ValidationError::ZeroInterval.into());
		}

		let request = RefreshRequest::for_mode(mode, &self.tables)?
			.with_commit_mode(self.commit_mode)
			.with_max_parallelism(self.max_parallelism)
			.with_retry_count(self.retry_count);
		let mut target = RefreshTarget::new(Region::new(&self.region)?, server, model);

		if let Some(endpoint) = &self.endpoint {
			target = target.with_endpoint(endpoint.clone());
		}

		let mut credentials = Credentials::new(
			TenantId::new(&self.tenant)?,
			ClientId::new(&self.client_id)?,
			ClientSecret::new(self.client_secret.as_str())?,
		);

		if let Some(scope) = &self.scope {
			credentials = credentials.with_scope(scope.as_str())?;
		}

		let log_path = self.log_path.clone().filter(|path| !path.as_os_str().is_empty());

		Ok(RefreshPlan {
			target,
			mode,
			request,
			credentials,
			interval: Duration::from_secs(self.interval),
			log_path,
			authority: self.authority.clone(),
		})
	}
}
impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			tenant: String::new(),
			region: DEFAULT_REGION.into(),
			server: String::new(),
			model: String::new(),
			mode: RefreshMode::Full.as_str().into(),
			tables: Vec::new(),
			log_path: None,
			client_id: String::new(),
			client_secret: String::new(),
			interval: DEFAULT_POLL_INTERVAL.as_secs(),
			scope: None,
			commit_mode: CommitMode::default(),
			max_parallelism: DEFAULT_MAX_PARALLELISM,
			retry_count: DEFAULT_RETRY_COUNT,
			authority: None,
			endpoint: None,
		}
	}
}
impl Debug for DriverConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DriverConfig")
			.field("tenant", &self.tenant)
			.field("region", &self.region)
			.field("server", &self.server)
			.field("model", &self.model)
			.field("mode", &self.mode)
			.field("tables", &self.tables)
			.field("log_path", &self.log_path)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("interval", &self.interval)
			.field("scope", &self.scope)
			.field("commit_mode", &self.commit_mode)
			.field("max_parallelism", &self.max_parallelism)
			.field("retry_count", &self.retry_count)
			.field("authority", &self.authority.as_ref().map(Url::as_str))
			.field("endpoint", &self.endpoint.as_ref().map(Url::as_str))
			.finish()
	}
}

/// Validated, typed form of a [`DriverConfig`].
#[derive(Clone, Debug)]
pub struct RefreshPlan {
	/// Server + model addressed by the refresh.
	pub target: RefreshTarget,
	/// Selected mode.
	pub mode: RefreshMode,
	/// Body posted to the `refreshes` collection.
	pub request: RefreshRequest,
	/// Service principal credentials.
	pub credentials: Credentials,
	/// Pause between status checks.
	pub interval: Duration,
	/// Log file receiving the rows, when persistence is enabled.
	pub log_path: Option<PathBuf>,
	/// Identity provider override.
	pub authority: Option<Url>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::ValidationError, request::RefreshType};

	fn valid() -> DriverConfig {
		DriverConfig {
			tenant: "contoso-tenant".into(),
			server: "aas-prod".into(),
			model: "Sales".into(),
			client_id: "refresh-client".into(),
			client_secret: "refresh-secret".into(),
			..Default::default()
		}
	}

	#[test]
	fn defaults_match_entry_point() {
		let config = DriverConfig::default();

		assert_eq!(config.region, "westeurope");
		assert_eq!(config.mode, "full");
		assert_eq!(config.interval, 30);
		assert!(config.tables.is_empty());
		assert!(config.log_path.is_none());
	}

	#[test]
	fn toml_settings_parse_with_aliases() {
		let config = DriverConfig::from_toml_str(
			r#"
tenant = "contoso-tenant"
server = "aas-prod"
model = "Sales"
mode = "TABLE"
clientid = "refresh-client"
clientsecret = "refresh-secret"
logPath = "logs/refresh.jsonl"
interval = 10
tables = ["Customers", { Sales = "Sales_2024" }]
"#,
		)
		.expect("Settings should parse.");
		let plan = config.plan().expect("Settings should validate.");

		assert_eq!(plan.mode, RefreshMode::Table);
		assert_eq!(plan.request.kind, RefreshType::Full);
		assert_eq!(plan.request.objects.len(), 2);
		assert_eq!(plan.request.objects[1].partition.as_deref(), Some("Sales_2024"));
		assert_eq!(plan.interval, Duration::from_secs(10));
		assert_eq!(plan.log_path.as_deref(), Some(Path::new("logs/refresh.jsonl")));
		assert_eq!(plan.target.region.as_ref(), "westeurope");
	}

	#[test]
	fn blank_server_fails_first() {
		let config = DriverConfig { server: "   ".into(), mode: "bogus".into(), ..valid() };
		let err = config.plan().expect_err("Blank server should fail.");

		assert!(matches!(err, Error::Validation(ValidationError::Identifier(_))));
		assert_eq!(err.to_string(), "Server identifier cannot be empty.");

		let config = DriverConfig { model: String::new(), ..valid() };

		assert_eq!(
			config.plan().expect_err("Blank model should fail.").to_string(),
			"Model identifier cannot be empty."
		);
	}

	#[test]
	fn unknown_mode_is_rejected() {
		let config = DriverConfig { mode: "incremental".into(), ..valid() };

		assert!(matches!(config.plan(), Err(Error::UnknownMode { .. })));
	}

	#[test]
	fn zero_interval_is_rejected() {
		let config = DriverConfig { interval: 0, ..valid() };
		let err = config.plan().expect_err("Zero interval should fail.");

		assert!(matches!(err, Error::Validation(ValidationError::ZeroInterval)));
		assert_eq!(err.to_string(), "Poll interval must be at least one second.");
		assert!(DriverConfig { interval: 1, ..valid() }.plan().is_ok());
	}

	#[test]
	fn empty_log_path_disables_persistence() {
		let config = DriverConfig { log_path: Some(PathBuf::new()), ..valid() };

		assert!(config.plan().expect("Config should validate.").log_path.is_none());
	}

	#[test]
	fn debug_redacts_secret() {
		let rendered = format!("{:?}", valid());

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("refresh-secret"));
	}

	#[test]
	fn missing_settings_file_is_config_error() {
		let err = DriverConfig::from_path("/nonexistent/aas-refresh.toml")
			.expect_err("Missing file should fail.");

		assert!(matches!(err, Error::Config(ConfigError::SettingsRead { .. })));
	}
}
