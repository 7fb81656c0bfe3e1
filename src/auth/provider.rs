//! Client-credentials token provider backed by the Microsoft identity platform.
//!
//! [`TokenProvider::fetch_token`] posts a form-encoded `grant_type=client_credentials` request
//! to `{authority}/{tenant}/oauth2/v2.0/token` and returns the `access_token` field as an
//! opaque [`BearerToken`]. Tokens are never cached; each call contacts the identity provider.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, Credentials, TenantId, TokenFuture, TokenSource},
	client::AasClient,
	error::ConfigError,
	http::HttpTransport,
	oauth::{self, TransportErrorMapper},
};

/// Microsoft identity platform authority used unless overridden.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Exchanges service-principal credentials for bearer tokens.
pub struct TokenProvider<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: &'a AasClient<C, M>,
	token_url: Url,
	credentials: Credentials,
}
impl<'a, C, M> TokenProvider<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider that talks to [`DEFAULT_AUTHORITY`].
	pub fn new(client: &'a AasClient<C, M>, credentials: Credentials) -> Result<Self> {
		let authority = Url::parse(DEFAULT_AUTHORITY)
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;

		Self::with_authority(client, &authority, credentials)
	}

	/// Creates a provider that talks to a custom authority (sovereign clouds, mocks).
	pub fn with_authority(
		client: &'a AasClient<C, M>,
		authority: &Url,
		credentials: Credentials,
	) -> Result<Self> {
		let token_url = token_endpoint(authority, &credentials.tenant)?;

		Ok(Self { client, token_url, credentials })
	}

	/// Token endpoint this provider posts to.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}

	/// Requests a new bearer token. No retry is attempted.
	pub async fn fetch_token(&self) -> Result<BearerToken> {
		tracing::debug!(tenant = %self.credentials.tenant, "Requesting bearer token.");

		let token =
			oauth::exchange_client_credentials(self.client, &self.token_url, &self.credentials)
				.await?;

		tracing::info!(tenant = %self.credentials.tenant, "Bearer token acquired.");

		Ok(token)
	}
}
impl<C, M> TokenSource for TokenProvider<'_, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn acquire(&self) -> TokenFuture<'_> {
		Box::pin(self.fetch_token())
	}
}
impl<C, M> Debug for TokenProvider<'_, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("token_url", &self.token_url.as_str())
			.field("credentials", &self.credentials)
			.finish()
	}
}

/// Builds `{authority}/{tenant}/oauth2/v2.0/token`.
pub fn token_endpoint(authority: &Url, tenant: &TenantId) -> Result<Url> {
	let mut url = authority.clone();

	url.path_segments_mut()
		.map_err(|_| ConfigError::EndpointNotABase { url: authority.to_string() })?
		.pop_if_empty()
		.extend([tenant.as_ref(), "oauth2", "v2.0", "token"]);

	Ok(url)
}
