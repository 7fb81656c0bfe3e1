//! Addressing of one tabular model on one Analysis Services server.

// self
use crate::{
	_prelude::*,
	auth::{ModelName, Region, ServerName},
	error::ConfigError,
	sink::LogLabels,
};

/// Server + model pair a refresh is submitted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTarget {
	/// Azure region hosting the server.
	pub region: Region,
	/// Server name.
	pub server: ServerName,
	/// Model name.
	pub model: ModelName,
	/// Management endpoint override; `https://{region}.asazure.windows.net` when unset.
	pub endpoint: Option<Url>,
}
impl RefreshTarget {
	/// Creates a target addressed through the regional endpoint.
	pub fn new(region: Region, server: ServerName, model: ModelName) -> Self {
		Self { region, server, model, endpoint: None }
	}

	/// Routes requests to `endpoint` instead of the regional host.
	pub fn with_endpoint(mut self, endpoint: Url) -> Self {
		self.endpoint = Some(endpoint);

		self
	}

	/// Management endpoint base URL.
	pub fn base_url(&self) -> Result<Url> {
		match &self.endpoint {
			Some(url) => Ok(url.clone()),
			None => Url::parse(&format!("https://{}.asazure.windows.net", self.region))
				.map_err(|source| ConfigError::InvalidEndpoint { source }.into()),
		}
	}

	/// `{base}/servers/{server}/models/{model}/refreshes`, with segments percent-encoded.
	pub fn refreshes_url(&self) -> Result<Url> {
		let base = self.base_url()?;
		let mut url = base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::EndpointNotABase { url: base.to_string() })?
			.pop_if_empty()
			.extend(["servers", self.server.as_ref(), "models", self.model.as_ref(), "refreshes"]);

		Ok(url)
	}

	/// Labels stamped on every log row produced for this target.
	pub fn labels(&self) -> LogLabels {
		LogLabels::new(self.server.to_string(), self.model.to_string())
	}
}
