//! Refresh-pipeline error types shared across authentication, submission, polling, and sinks.

// self
use crate::{
	_prelude::*,
	auth::IdentifierError,
	obs::Stage,
	sink::{LogRow, SinkError},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Invocation parameters failed validation before any network call.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Log sink failure.
	#[error(transparent)]
	Sink(#[from] SinkError),

	/// Identity provider refused the credentials or answered with an unusable body.
	#[error("Authentication failed: {reason}.")]
	Authentication {
		/// Provider- or client-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Refresh endpoint rejected the request (HTTP 400 or 404).
	#[error("Refresh request was rejected with HTTP {status}: {detail}.")]
	RequestRejected {
		/// HTTP status code.
		status: u16,
		/// Value of the `x-ms-xmlaerror-extended` header, or a placeholder when absent.
		detail: String,
		/// Value of the `x-ms-request-id` header, when present.
		request_id: Option<String>,
	},
	/// Refresh endpoint refused the bearer token.
	#[error("Bearer token was refused during the {stage} stage.")]
	Unauthorized {
		/// Stage at which the token was refused.
		stage: Stage,
	},
	/// Another refresh operation is already running against the model.
	#[error("Another refresh operation is in progress for model {model}.")]
	Conflict {
		/// Model label.
		model: String,
	},
	/// Remote refresh operation finished in the `failed` state.
	#[error("Refresh of model {model} failed, URL: {poll_url}.")]
	RemoteJobFailed {
		/// Model label.
		model: String,
		/// Status URL of the failed operation.
		poll_url: String,
	},
	/// Refresh mode string is not one of `full`, `default`, or `table`.
	#[error("Refresh mode `{mode}` is not recognized; expected full, default, or table.")]
	UnknownMode {
		/// Mode string as supplied.
		mode: String,
	},
	/// Remote operation reported a status the poller does not understand.
	#[error("Refresh operation reported an unrecognized status `{status}`.")]
	UnknownStatus {
		/// Status string as reported.
		status: String,
	},
	/// Endpoint answered with a status code that has no defined transition.
	#[error("The {stage} stage received unexpected HTTP status {status}.")]
	UnexpectedStatus {
		/// Stage that received the response.
		stage: Stage,
		/// HTTP status code.
		status: u16,
		/// Value of the `x-ms-request-id` header, when present.
		request_id: Option<String>,
	},
	/// Polling stopped on an error after it had started.
	///
	/// `rows` holds every row produced so far, ending with one row describing the abort, so
	/// callers can still persist them.
	#[error("Polling of model {model} aborted after {} rows.", rows.len())]
	PollAborted {
		/// Model label.
		model: String,
		/// Status URL being polled.
		poll_url: String,
		/// Rows produced before and at the abort.
		rows: Vec<LogRow>,
		/// Failure that stopped the loop.
		#[source]
		source: Box<Error>,
	},
	/// An accepted refresh response did not carry a usable `Location` header.
	#[error("Accepted refresh response carried no usable Location header.")]
	MissingLocation,
	/// Endpoint responded with JSON that could not be parsed.
	#[error("The {stage} stage received a malformed JSON body.")]
	MalformedResponse {
		/// Stage that received the body.
		stage: Stage,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

impl From<IdentifierError> for Error {
	fn from(e: IdentifierError) -> Self {
		Self::Validation(e.into())
	}
}

/// Input validation failures raised before the pipeline touches the network.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// Identifier is empty, contains whitespace, or is too long.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
	/// Table mode was requested without any table.
	#[error("Table mode requires at least one table.")]
	MissingTables,
	/// A table mapping must hold exactly one `table -> partition` entry.
	#[error("Table mapping must contain exactly one entry, found {entries}.")]
	InvalidTableMapping {
		/// Number of entries found in the mapping.
		entries: usize,
	},
	/// A table or partition name was empty.
	#[error("Table and partition names cannot be empty.")]
	EmptyTableName,
	/// Poll interval of zero would hammer the status endpoint.
	#[error("Poll interval must be at least one second.")]
	ZeroInterval,
}

/// Configuration failures raised while building requests or loading settings.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Request body could not be encoded.
	#[error("Request body could not be encoded.")]
	RequestEncode(#[from] serde_json::Error),
	/// Endpoint URL cannot be parsed.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint URL cannot carry path segments.
	#[error("Endpoint URL `{url}` cannot be used as a base.")]
	EndpointNotABase {
		/// Offending URL.
		url: String,
	},
	/// Settings file could not be read.
	#[error("Failed to read settings file {}.", path.display())]
	SettingsRead {
		/// Settings file path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Settings file could not be parsed.
	#[error("Failed to parse settings file {}.", path.display())]
	SettingsParse {
		/// Settings file path.
		path: PathBuf,
		/// Underlying TOML failure.
		#[source]
		source: toml::de::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred during the {stage} stage.")]
	Network {
		/// Stage that issued the request.
		stage: Stage,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request timed out before a response arrived.
	#[error("Request timed out during the {stage} stage.")]
	Timeout {
		/// Stage that issued the request.
		stage: Stage,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Server request id of the last response, when available.
		request_id: Option<String>,
	},
	/// HTTP client surfaced a failure that is neither network nor IO.
	#[error("HTTP client error occurred during the {stage} stage: {message}.")]
	Client {
		/// Stage that issued the request.
		stage: Stage,
		/// Client-supplied message.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Server request id of the last response, when available.
		request_id: Option<String>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(stage: Stage, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { stage, source: Box::new(src) }
	}
}
