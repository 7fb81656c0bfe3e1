//! Classification of the submission response and status polling of accepted refreshes.
//!
//! The poller turns the raw `POST .../refreshes` response into either an error (400, 401, 404,
//! or a status with no defined transition), a single conflict row (409), or a poll loop (202).
//! The loop issues `GET <Location>` with the bearer token, appends one row per tick, and sleeps
//! `interval` between non-terminal ticks.

pub mod sleeper;
pub mod status;

pub use sleeper::*;
pub use status::*;

// crates.io
use oauth2::{HttpResponse, http::Method};
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, TokenSource},
	client::{self, AasClient},
	http::{self, HttpTransport},
	oauth::TransportErrorMapper,
	obs::{self, Stage},
	sink::{LogLabels, LogRow, SuccessFlag},
};

/// Interval between status checks unless overridden.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Header carrying the server's extended error description on rejected requests.
pub const XMLA_ERROR_HEADER: &str = "x-ms-xmlaerror-extended";
/// Detail reported when a rejected request carries no extended error header.
pub const NO_EXTENDED_ERROR: &str = "no extended error";

/// Terminal state of one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// Remote operation succeeded.
	Succeeded,
	/// Remote operation failed.
	Failed,
	/// Another refresh was already running; nothing was submitted.
	Conflict,
	/// Remote operation reported a status the poller does not understand.
	Unrecognized(String),
}
impl RefreshOutcome {
	/// Whether the refresh completed successfully.
	pub fn is_success(&self) -> bool {
		matches!(self, RefreshOutcome::Succeeded)
	}
}

/// Everything the poller learned about one refresh.
#[derive(Clone, Debug)]
pub struct PollReport {
	/// Terminal state.
	pub outcome: RefreshOutcome,
	/// Rows in production order.
	pub rows: Vec<LogRow>,
	/// Operation URL, when the server supplied one.
	pub poll_url: Option<Url>,
}

/// Tracks one refresh operation from submission response to terminal state.
pub struct StatusPoller<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: &'a AasClient<C, M>,
	tokens: &'a dyn TokenSource,
	sleeper: &'a dyn Sleeper,
	labels: LogLabels,
	interval: Duration,
}
impl<'a, C, M> StatusPoller<'a, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a poller using [`DEFAULT_POLL_INTERVAL`].
	///
	/// `tokens` is consulted only when the operation URL refuses the current token.
	pub fn new(
		client: &'a AasClient<C, M>,
		tokens: &'a dyn TokenSource,
		sleeper: &'a dyn Sleeper,
		labels: LogLabels,
	) -> Self {
		Self { client, tokens, sleeper, labels, interval: DEFAULT_POLL_INTERVAL }
	}

	/// Overrides the pause between status checks.
	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.interval = interval;

		self
	}

	/// Classifies `response` and, when accepted, polls until a terminal state.
	///
	/// Once polling has started, any failure is returned as [`Error::PollAborted`] carrying
	/// the rows produced so far plus one row describing the abort.
	pub async fn track(&self, response: HttpResponse, token: BearerToken) -> Result<PollReport> {
		let status = response.status().as_u16();
		let request_id = http::header_value(&response, http::REQUEST_ID_HEADER);

		match status {
			202 => {
				let poll_url = operation_url(&response).ok_or(Error::MissingLocation)?;

				tracing::info!(
					model = %self.labels.model,
					poll_url = %poll_url,
					request_id = ?request_id,
					"Server accepted the refresh request."
				);

				self.poll(poll_url, token).await
			},
			400 | 404 => {
				let detail = http::header_value(&response, XMLA_ERROR_HEADER)
					.filter(|detail| !detail.is_empty())
					.unwrap_or_else(|| NO_EXTENDED_ERROR.into());

				tracing::error!(
					status,
					detail = %detail,
					request_id = ?request_id,
					"Refresh request was rejected."
				);

				Err(Error::RequestRejected { status, detail, request_id })
			},
			401 => {
				tracing::error!(model = %self.labels.model, "Refresh endpoint refused the token.");

				Err(Error::Unauthorized { stage: Stage::Submit })
			},
			409 => {
				let poll_url = operation_url(&response);
				let shown = poll_url.as_ref().map_or("unavailable", Url::as_str);
				let row = self.labels.row(
					format!(
						"Model {} refresh blocked by concurrent refresh, URL: {shown}",
						self.labels.model
					),
					SuccessFlag::No,
				);

				tracing::warn!(
					model = %self.labels.model,
					"Another refresh operation is in progress; request not accepted."
				);

				Ok(PollReport { outcome: RefreshOutcome::Conflict, rows: vec![row], poll_url })
			},
			_ => Err(Error::UnexpectedStatus { stage: Stage::Submit, status, request_id }),
		}
	}

	async fn poll(&self, poll_url: Url, token: BearerToken) -> Result<PollReport> {
		let model = &self.labels.model;
		let mut rows = Vec::new();

		match self.poll_until_terminal(&poll_url, token, &mut rows).await {
			Ok(outcome) => Ok(PollReport { outcome, rows, poll_url: Some(poll_url) }),
			Err(source) => {
				tracing::error!(
					model = %model,
					poll_url = %poll_url,
					error = %source,
					"Polling aborted."
				);

				rows.push(self.labels.row(
					format!("Model {model} polling aborted, URL: {poll_url}: {source}"),
					SuccessFlag::No,
				));

				Err(Error::PollAborted {
					model: model.clone(),
					poll_url: poll_url.to_string(),
					rows,
					source: Box::new(source),
				})
			},
		}
	}

	async fn poll_until_terminal(
		&self,
		poll_url: &Url,
		mut token: BearerToken,
		rows: &mut Vec<LogRow>,
	) -> Result<RefreshOutcome> {
		let model = &self.labels.model;
		let mut reauthenticated = false;

		loop {
			let request = client::bearer_request(Method::GET, poll_url, &token, None)?;
			let response = self.client.execute(Stage::Poll, request).await?;
			let status = response.status();

			if status.as_u16() == 401 {
				if reauthenticated {
					return Err(Error::Unauthorized { stage: Stage::Poll });
				}

				tracing::warn!(model = %model, "Token refused while polling; re-authenticating.");

				token = self.tokens.acquire().await?;
				reauthenticated = true;

				continue;
			}
			if !status.is_success() {
				return Err(Error::UnexpectedStatus {
					stage: Stage::Poll,
					status: status.as_u16(),
					request_id: http::header_value(&response, http::REQUEST_ID_HEADER),
				});
			}

			reauthenticated = false;

			let remote = RefreshStatus::from_slice(response.body())?;

			obs::record_poll_tick(&remote.status);

			let (row, outcome) = match remote.phase() {
				RemotePhase::Running => {
					tracing::info!(model = %model, status = %remote.status, "Refresh in progress.");

					(format!("Model {model} refresh in progress"), None)
				},
				RemotePhase::Failed => {
					tracing::error!(model = %model, poll_url = %poll_url, "Refresh failed.");

					(format!("Model {model} failed, URL: {poll_url}"), Some(RefreshOutcome::Failed))
				},
				RemotePhase::Succeeded => {
					tracing::info!(model = %model, "Refresh succeeded.");

					(format!("Model {model} refresh succeeded"), Some(RefreshOutcome::Succeeded))
				},
				RemotePhase::Unrecognized(other) => {
					tracing::error!(
						model = %model,
						status = %other,
						"Refresh reported an unrecognized status."
					);

					let row = format!(
						"Model {model} reported unrecognized status {other}, URL: {poll_url}"
					);

					(row, Some(RefreshOutcome::Unrecognized(other)))
				},
			};
			let flag = match outcome {
				Some(RefreshOutcome::Succeeded) => SuccessFlag::Yes,
				_ => SuccessFlag::No,
			};

			rows.push(self.labels.row(row, flag));

			if let Some(outcome) = outcome {
				return Ok(outcome);
			}

			self.sleeper.sleep(self.interval).await;
		}
	}
}
impl<C, M> Debug for StatusPoller<'_, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StatusPoller")
			.field("labels", &self.labels)
			.field("interval", &self.interval)
			.finish_non_exhaustive()
	}
}

fn operation_url(response: &HttpResponse) -> Option<Url> {
	http::header_value(response, "location").and_then(|value| Url::parse(&value).ok())
}
