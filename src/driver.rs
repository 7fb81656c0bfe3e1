//! Top-level orchestration of one refresh invocation.
//!
//! [`RefreshDriver::run`] validates the [`DriverConfig`], fetches a bearer token, submits the
//! refresh, tracks it to a terminal state, and appends the resulting rows to the configured
//! sink. Each stage runs inside an [`obs::StageSpan`]; the first failing stage aborts the
//! invocation, except persistence, whose failure is only reported. Rows gathered before a
//! polling failure are still persisted before the error is returned.

pub mod config;
pub mod report;

pub use config::*;
pub use report::*;

// self
use crate::{
	_prelude::*,
	auth::TokenProvider,
	client::AasClient,
	http::HttpTransport,
	oauth::TransportErrorMapper,
	obs::{self, Stage, StageSpan},
	poll::{Sleeper, StatusPoller, TokioSleeper},
	sink::{FileLogSink, LogRow, LogSink, SinkError},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Runs refresh invocations over a shared client.
pub struct RefreshDriver<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: AasClient<C, M>,
	sink: Option<Arc<dyn LogSink>>,
	sleeper: Arc<dyn Sleeper>,
}
impl<C, M> RefreshDriver<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a driver over `client`, sleeping on the tokio timer.
	pub fn with_client(client: AasClient<C, M>) -> Self {
		Self { client, sink: None, sleeper: Arc::new(TokioSleeper) }
	}

	/// Sends rows to `sink` instead of the configured log file.
	pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
		self.sink = Some(sink);

		self
	}

	/// Replaces the sleeper used between status checks.
	pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
		self.sleeper = sleeper;

		self
	}

	/// Shared client used by every stage.
	pub fn client(&self) -> &AasClient<C, M> {
		&self.client
	}

	/// Validates `config` and runs the whole pipeline once.
	pub async fn run(&self, config: &DriverConfig) -> Result<RefreshReport> {
		let plan = config.plan().inspect_err(|e| {
			tracing::error!(error = %e, "Refresh parameters are invalid.");
		})?;

		self.execute(&plan).await
	}

	/// Runs the pipeline for an already validated plan.
	pub async fn execute(&self, plan: &RefreshPlan) -> Result<RefreshReport> {
		let labels = plan.target.labels();
		let span = |stage| StageSpan::new(stage, &labels.server, &labels.model);
		let provider = match &plan.authority {
			Some(authority) =>
				TokenProvider::with_authority(&self.client, authority, plan.credentials.clone())?,
			None => TokenProvider::new(&self.client, plan.credentials.clone())?,
		};
		let token = obs::observe(span(Stage::Authenticate), provider.fetch_token())
			.await
			.inspect_err(|e| {
				tracing::error!(
					error = %e,
					"Authentication failed; check the supplied credentials."
				);
			})?;
		let response = obs::observe(
			span(Stage::Submit),
			self.client.submit_refresh(&plan.target, &token, &plan.request),
		)
		.await?;
		let poller =
			StatusPoller::new(&self.client, &provider, self.sleeper.as_ref(), labels.clone())
				.with_interval(plan.interval);
		let tracked = match obs::observe(span(Stage::Poll), poller.track(response, token)).await {
			Ok(tracked) => tracked,
			Err(Error::PollAborted { model, poll_url, rows, source }) => {
				let persistence = self.persist(plan, span(Stage::Persist), &rows).await;

				tracing::error!(
					server = %labels.server,
					model = %labels.model,
					rows = rows.len(),
					persistence = ?persistence,
					"Refresh invocation aborted while polling."
				);

				return Err(Error::PollAborted { model, poll_url, rows, source });
			},
			Err(e) => return Err(e),
		};
		let persistence = self.persist(plan, span(Stage::Persist), &tracked.rows).await;

		tracing::info!(
			server = %labels.server,
			model = %labels.model,
			outcome = ?tracked.outcome,
			rows = tracked.rows.len(),
			"Refresh invocation finished."
		);

		Ok(RefreshReport {
			labels,
			outcome: tracked.outcome,
			rows: tracked.rows,
			poll_url: tracked.poll_url,
			persistence,
		})
	}

	async fn persist(&self, plan: &RefreshPlan, span: StageSpan, rows: &[LogRow]) -> Persistence {
		let sink: Arc<dyn LogSink> = match (&self.sink, &plan.log_path) {
			(Some(sink), _) => sink.clone(),
			(None, Some(path)) => match FileLogSink::open(path) {
				Ok(sink) => Arc::new(sink),
				Err(e) => return Self::persistence_failed(e),
			},
			(None, None) => return Persistence::Disabled,
		};

		if rows.is_empty() {
			return Persistence::Written { rows: 0 };
		}

		let written =
			obs::observe(span, async { sink.append(rows).await.map_err(Error::from) }).await;

		match written {
			Ok(()) => Persistence::Written { rows: rows.len() },
			Err(Error::Sink(e)) => Self::persistence_failed(e),
			Err(e) => Self::persistence_failed(SinkError::Backend { message: e.to_string() }),
		}
	}

	fn persistence_failed(error: SinkError) -> Persistence {
		tracing::warn!(error = %error, "Log rows could not be persisted.");

		Persistence::Failed(error)
	}
}
#[cfg(feature = "reqwest")]
impl RefreshDriver<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a driver backed by a default reqwest transport.
	pub fn new() -> Self {
		Self::with_client(AasClient::new())
	}
}
#[cfg(feature = "reqwest")]
impl Default for RefreshDriver<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	fn default() -> Self {
		Self::new()
	}
}
impl<C, M> Debug for RefreshDriver<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshDriver")
			.field("client", &self.client)
			.field("sink", &self.sink.is_some())
			.finish_non_exhaustive()
	}
}
