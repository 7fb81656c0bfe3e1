//! Service-principal credentials supplied per invocation.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, IdentifierError, TenantId},
};

/// OAuth scope granting access to every Analysis Services server.
pub const DEFAULT_SCOPE: &str = "https://*.asazure.windows.net/.default";

/// Redacted client secret keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);
impl ClientSecret {
	/// Wraps a non-empty secret string.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		let value = value.into();

		if value.trim().is_empty() {
			return Err(IdentifierError::Empty { kind: "Client secret" });
		}

		Ok(Self(value))
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for ClientSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ClientSecret").field(&"<redacted>").finish()
	}
}
impl Display for ClientSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Immutable tenant/client/secret/scope tuple exchanged for a bearer token.
#[derive(Clone, Debug)]
pub struct Credentials {
	/// Directory that issues the token.
	pub tenant: TenantId,
	/// Service principal application id.
	pub client_id: ClientId,
	/// Service principal secret.
	pub client_secret: ClientSecret,
	/// Requested scope, [`DEFAULT_SCOPE`] unless overridden.
	pub scope: String,
}
impl Credentials {
	/// Creates credentials requesting [`DEFAULT_SCOPE`].
	pub fn new(tenant: TenantId, client_id: ClientId, client_secret: ClientSecret) -> Self {
		Self { tenant, client_id, client_secret, scope: DEFAULT_SCOPE.into() }
	}

	/// Overrides the requested scope.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Result<Self, IdentifierError> {
		let scope = scope.into();

		if scope.trim().is_empty() {
			return Err(IdentifierError::Empty { kind: "Scope" });
		}

		self.scope = scope.trim().to_owned();

		Ok(self)
	}
}
