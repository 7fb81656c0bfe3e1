//! Shared REST client used by every stage of the refresh pipeline.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::BearerToken,
	error::ConfigError,
	http::{HttpTransport, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	obs::Stage,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestAasClient = AasClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Owns the HTTP transport and the mapper applied to its failures.
///
/// The token exchange, refresh submission, and status polling all go through the same
/// transport so a single fake or mock covers the whole pipeline.
pub struct AasClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
}
impl<C, M> AasClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(http_client: impl Into<Arc<C>>, mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), transport_mapper: mapper.into() }
	}

	/// Sends `request`, mapping transport failures with the stage that issued it.
	///
	/// Any HTTP status, including 4xx and 5xx, is returned as a response; interpretation is
	/// left to the caller.
	pub async fn execute(&self, stage: Stage, request: HttpRequest) -> Result<HttpResponse> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());

		handle
			.call(request)
			.await
			.map_err(|err| {
				self.transport_mapper.map_transport_error(stage, meta.take().as_ref(), err)
			})
	}
}
#[cfg(feature = "reqwest")]
impl AasClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new() -> Self {
		Self::with_http_client(ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
#[cfg(feature = "reqwest")]
impl Default for AasClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	fn default() -> Self {
		Self::new()
	}
}
impl<C, M> Debug for AasClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AasClient").finish_non_exhaustive()
	}
}

/// Builds a request carrying `Authorization: Bearer <token>` and an optional JSON body.
pub fn bearer_request(
	method: Method,
	url: &Url,
	token: &BearerToken,
	json_body: Option<Vec<u8>>,
) -> Result<HttpRequest> {
	let builder = Request::builder()
		.method(method)
		.uri(url.as_str())
		.header(AUTHORIZATION, format!("Bearer {}", token.expose()))
		.header(ACCEPT, "application/json");
	let request = match json_body {
		Some(body) => builder.header(CONTENT_TYPE, "application/json").body(body),
		None => builder.body(Vec::new()),
	};

	request.map_err(|e| ConfigError::from(e).into())
}
