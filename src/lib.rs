//! Trigger Azure Analysis Services model refreshes over the REST management API, follow the
//! accepted operation until it reaches a terminal state, and append Y/N progress rows to a log
//! sink.

#![deny(clippy::all, missing_docs)]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod auth;
pub mod client;
pub mod driver;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod poll;
pub mod request;
pub mod sink;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// crates.io
	use oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{HeaderName, HeaderValue, StatusCode},
	};
	// self
	use crate::{
		auth::{ClientId, ClientSecret, Credentials, TenantId},
		client::AasClient,
		http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
		oauth::TransportErrorMapper,
		obs::Stage,
		poll::{SleepFuture, Sleeper},
	};
	#[cfg(feature = "reqwest")]
	use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

	/// Client type alias used by reqwest-backed integration tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestClient = AasClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Client type alias used by tests that replay queued responses.
	pub type ScriptedTestClient = AasClient<ScriptedHttpClient, ScriptedErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs an [`AasClient`] backed by the reqwest transport used across integration tests.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_client() -> ReqwestTestClient {
		AasClient::with_http_client(test_reqwest_http_client(), ReqwestTransportErrorMapper)
	}

	/// Credentials fixture shared by tests.
	pub fn test_credentials() -> Credentials {
		Credentials::new(
			TenantId::new("contoso-tenant").expect("Tenant fixture should be valid."),
			ClientId::new("refresh-client").expect("Client fixture should be valid."),
			ClientSecret::new("refresh-secret").expect("Secret fixture should be valid."),
		)
	}

	/// Builds an HTTP response with the provided status, headers, and body.
	pub fn scripted_response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Scripted status code should be valid.");

		for (name, value) in headers {
			response.headers_mut().insert(
				HeaderName::from_bytes(name.as_bytes()).expect("Scripted header name is valid."),
				HeaderValue::from_str(value).expect("Scripted header value is valid."),
			);
		}

		response
	}

	/// Builds a `200 OK` poll response carrying the provided remote status.
	pub fn poll_response(status: &str) -> HttpResponse {
		scripted_response(
			200,
			&[("content-type", "application/json")],
			&format!("{{\"status\":\"{status}\",\"type\":\"full\"}}"),
		)
	}

	/// Transport error emitted when a scripted transport runs out of responses.
	#[derive(Debug, ThisError)]
	#[error("Scripted transport has no response queued for {method} {uri}.")]
	pub struct ScriptExhausted {
		/// Method of the unexpected request.
		pub method: String,
		/// URI of the unexpected request.
		pub uri: String,
	}

	/// Transport that replays queued responses and records every request it receives.
	#[derive(Clone, Default)]
	pub struct ScriptedHttpClient {
		responses: Arc<Mutex<VecDeque<HttpResponse>>>,
		requests: Arc<Mutex<Vec<HttpRequest>>>,
	}
	impl ScriptedHttpClient {
		/// Creates a transport that answers requests with `responses`, in order.
		pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
			Self {
				responses: Arc::new(Mutex::new(responses.into_iter().collect())),
				requests: Default::default(),
			}
		}

		/// Returns a snapshot of the requests seen so far.
		pub fn requests(&self) -> Vec<HttpRequest> {
			self.requests.lock().clone()
		}

		/// Number of requests seen so far.
		pub fn request_count(&self) -> usize {
			self.requests.lock().len()
		}
	}
	impl HttpTransport for ScriptedHttpClient {
		type Handle = ScriptedHandle;
		type TransportError = ScriptExhausted;

		fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
			ScriptedHandle { client: self.clone(), slot }
		}
	}

	/// Handle returned by [`ScriptedHttpClient`].
	pub struct ScriptedHandle {
		client: ScriptedHttpClient,
		slot: ResponseMetadataSlot,
	}
	impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
		type Error = HttpClientError<ScriptExhausted>;
		type Future =
			Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			Box::pin(async move {
				self.slot.take();

				let method = request.method().to_string();
				let uri = request.uri().to_string();

				self.client.requests.lock().push(request);

				let response = self
					.client
					.responses
					.lock()
					.pop_front()
					.ok_or_else(|| {
						HttpClientError::Reqwest(Box::new(ScriptExhausted { method, uri }))
					})?;
				let request_id =
					crate::http::header_value(&response, crate::http::REQUEST_ID_HEADER);

				self.slot.store(ResponseMetadata {
					status: Some(response.status().as_u16()),
					request_id,
				});

				Ok(response)
			})
		}
	}

	/// Mapper paired with [`ScriptedHttpClient`].
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedErrorMapper;
	impl TransportErrorMapper<ScriptExhausted> for ScriptedErrorMapper {
		fn map_transport_error(
			&self,
			stage: Stage,
			metadata: Option<&ResponseMetadata>,
			error: HttpClientError<ScriptExhausted>,
		) -> Error {
			match error {
				HttpClientError::Reqwest(inner) =>
					crate::error::TransportError::network(stage, *inner).into(),
				other => crate::error::TransportError::Client {
					stage,
					message: other.to_string(),
					status: metadata.and_then(|meta| meta.status),
					request_id: metadata.and_then(|meta| meta.request_id.clone()),
				}
				.into(),
			}
		}
	}

	/// Builds a client over a scripted transport, returning the transport for inspection.
	pub fn build_scripted_client(
		responses: impl IntoIterator<Item = HttpResponse>,
	) -> (ScriptedTestClient, ScriptedHttpClient) {
		let transport = ScriptedHttpClient::new(responses);
		let client = AasClient::with_http_client(transport.clone(), ScriptedErrorMapper);

		(client, transport)
	}

	/// Sleeper that records requested pauses instead of waiting.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingSleeper(Arc<Mutex<Vec<Duration>>>);
	impl RecordingSleeper {
		/// Returns every pause requested so far.
		pub fn pauses(&self) -> Vec<Duration> {
			self.0.lock().clone()
		}
	}
	impl Sleeper for RecordingSleeper {
		fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
			self.0.lock().push(duration);

			Box::pin(async {})
		}
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(feature = "cli")] use {clap as _, color_eyre as _, tracing_subscriber as _};
