//! OAuth client-credentials exchange and transport error mapping.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId as OAuthClientId, ClientSecret as OAuthClientSecret, EndpointNotSet,
	EndpointSet, HttpClientError, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, Credentials},
	client::AasClient,
	error::{ConfigError, TransportError},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
	obs::Stage,
};

type TokenEndpointClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		stage: Stage,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		stage: Stage,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(stage, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Client {
				stage,
				message,
				status: meta_status(meta),
				request_id: meta_request_id(meta),
			}
			.into(),
			_ => TransportError::Client {
				stage,
				message: "unclassified HTTP client failure".into(),
				status: meta_status(meta),
				request_id: meta_request_id(meta),
			}
			.into(),
		}
	}
}

/// Performs the `client_credentials` grant against `token_url`.
///
/// Client id and secret travel in the form body alongside `scope` and
/// `grant_type=client_credentials`. Anything other than a transport failure is reported as
/// [`Error::Authentication`].
pub(crate) async fn exchange_client_credentials<C, M>(
	client: &AasClient<C, M>,
	token_url: &Url,
	credentials: &Credentials,
) -> Result<BearerToken>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let oauth_client = token_endpoint_client(token_url, credentials)?;
	let meta = ResponseMetadataSlot::default();
	let instrumented = client.http_client.with_metadata(meta.clone());
	let response = oauth_client
		.exchange_client_credentials()
		.add_scope(Scope::new(credentials.scope.clone()))
		.request_async(&instrumented)
		.await
		.map_err(|err| map_request_error(meta.take(), err, client.transport_mapper.as_ref()))?;
	let secret = response.access_token().secret();

	if secret.trim().is_empty() {
		return Err(Error::Authentication {
			reason: "token endpoint returned an empty access_token".into(),
			status: None,
		});
	}

	Ok(BearerToken::new(secret.to_owned()))
}

fn token_endpoint_client(
	token_url: &Url,
	credentials: &Credentials,
) -> Result<TokenEndpointClient> {
	let token_url = TokenUrl::new(token_url.to_string())
		.map_err(|source| ConfigError::InvalidEndpoint { source })?;

	Ok(BasicClient::new(OAuthClientId::new(credentials.client_id.to_string()))
		.set_client_secret(OAuthClientSecret::new(credentials.client_secret.expose().to_owned()))
		.set_auth_type(AuthType::RequestBody)
		.set_token_uri(token_url))
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(Stage::Authenticate, meta_ref, error),
		RequestTokenError::Parse(error, _body) => Error::Authentication {
			reason: format!("token endpoint returned malformed JSON at `{}`", error.path()),
			status: meta_status(meta_ref),
		},
		RequestTokenError::Other(message) => Error::Authentication {
			reason: format!("token endpoint returned an unexpected response: {message}"),
			status: meta_status(meta_ref),
		},
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let reason = match response.error_description() {
		Some(description) =>
			format!("identity provider returned {}: {description}", response.error().as_ref()),
		None => format!("identity provider returned {}", response.error().as_ref()),
	};

	Error::Authentication { reason, status: meta_status(meta) }
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(stage: Stage, meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout {
			stage,
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			request_id: meta_request_id(meta),
		}
		.into();
	}

	TransportError::network(stage, err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_request_id(meta: Option<&ResponseMetadata>) -> Option<String> {
	meta.and_then(|value| value.request_id.clone())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::test_credentials;

	#[test]
	fn builds_request_body_client() {
		let url = Url::parse("https://login.microsoftonline.com/contoso/oauth2/v2.0/token")
			.expect("Failed to parse token endpoint URL.");

		assert!(token_endpoint_client(&url, &test_credentials()).is_ok());
	}

	#[test]
	fn server_errors_become_authentication_failures() {
		let response: BasicErrorResponse = serde_json::from_str(
			"{\"error\":\"invalid_client\",\"error_description\":\"AADSTS7000215: Invalid client secret.\"}",
		)
		.expect("Failed to parse OAuth error fixture.");
		let meta = ResponseMetadata { status: Some(401), request_id: None };
		let err = map_server_response_error(response, Some(&meta));

		match err {
			Error::Authentication { reason, status } => {
				assert_eq!(status, Some(401));
				assert!(reason.contains("invalid_client"));
				assert!(reason.contains("AADSTS7000215"));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn client_failures_keep_request_id() {
		let meta = ResponseMetadata { status: Some(502), request_id: Some("8c1f-42".into()) };
		let err = ReqwestTransportErrorMapper.map_transport_error(
			Stage::Poll,
			Some(&meta),
			HttpClientError::Other("gateway closed the stream".into()),
		);

		assert!(matches!(
			err,
			Error::Transport(TransportError::Client {
				stage: Stage::Poll,
				status: Some(502),
				request_id: Some(ref id),
				..
			}) if id == "8c1f-42"
		));
	}
}
