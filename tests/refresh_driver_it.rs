// std
use std::{
	env, fs,
	time::{SystemTime, UNIX_EPOCH},
};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use aas_refresh::{
	_preludet::*,
	driver::{DriverConfig, Persistence, RefreshDriver},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	poll::RefreshOutcome,
	request::TableSelector,
	sink::{FileLogSink, LogRow, LogSink, SinkError, SinkFuture, SuccessFlag},
};

const REFRESHES_PATH: &str = "/servers/aas-prod/models/Sales/refreshes";

struct FailingSink;
impl LogSink for FailingSink {
	fn append<'a>(&'a self, _rows: &'a [LogRow]) -> SinkFuture<'a> {
		Box::pin(async { Err(SinkError::Backend { message: "table is read-only".into() }) })
	}
}

fn config(server: &MockServer) -> DriverConfig {
	let base = Url::parse(&server.base_url()).expect("Mock base URL should parse.");

	DriverConfig {
		tenant: "contoso-tenant".into(),
		server: "aas-prod".into(),
		model: "Sales".into(),
		client_id: "refresh-client".into(),
		client_secret: "refresh-secret".into(),
		interval: 1,
		authority: Some(base.clone()),
		endpoint: Some(base),
		..Default::default()
	}
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/contoso-tenant/oauth2/v2.0/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"mock-aas-token\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await
}

async fn mock_poll<'a>(server: &'a MockServer, status: &str) -> httpmock::Mock<'a> {
	let body = json!({ "status": status, "type": "full" }).to_string();

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/operations/42")
				.header("authorization", "Bearer mock-aas-token");
			then.status(200).header("content-type", "application/json").body(body.as_str());
		})
		.await
}

fn driver() -> RefreshDriver<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	RefreshDriver::with_client(build_reqwest_test_client())
		.with_sleeper(Arc::new(RecordingSleeper::default()))
}

#[tokio::test]
async fn full_refresh_runs_end_to_end() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let submit = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(REFRESHES_PATH)
				.header("authorization", "Bearer mock-aas-token")
				.json_body(json!({
					"Type": "Full",
					"CommitMode": "transactional",
					"MaxParallelism": 2,
					"RetryCount": 2,
					"Objects": [],
				}));
			then.status(202).header("location", server.url("/operations/42"));
		})
		.await;
	let poll = mock_poll(&server, "succeeded").await;
	let report = driver().run(&config(&server)).await.expect("Refresh should succeed.");

	assert_eq!(report.outcome, RefreshOutcome::Succeeded);
	assert_eq!(report.rows.len(), 1);
	assert_eq!(report.rows[0].success, SuccessFlag::Yes);
	assert_eq!(report.persistence, Persistence::Disabled);

	token.assert_calls_async(1).await;
	submit.assert_calls_async(1).await;
	poll.assert_calls_async(1).await;
}

#[tokio::test]
async fn table_refresh_sends_mixed_selectors_in_order() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let submit = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESHES_PATH).json_body(json!({
				"Type": "Full",
				"CommitMode": "transactional",
				"MaxParallelism": 2,
				"RetryCount": 2,
				"Objects": [
					{ "table": "Customers" },
					{ "table": "Sales", "partition": "Sales_2024" },
				],
			}));
			then.status(202).header("location", server.url("/operations/42"));
		})
		.await;
	let _poll = mock_poll(&server, "Succeeded").await;
	let config = DriverConfig {
		mode: "Table".into(),
		tables: vec![
			TableSelector::Table("Customers".into()),
			TableSelector::partition("Sales", "Sales_2024"),
		],
		..config(&server)
	};
	let report = driver().run(&config).await.expect("Table refresh should succeed.");

	assert!(report.is_success());

	submit.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_server_contacts_nothing() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let err = driver()
		.run(&DriverConfig { server: "  ".into(), ..config(&server) })
		.await
		.expect_err("Blank server should fail validation.");

	assert!(matches!(err, Error::Validation(_)));

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_request_reports_extended_error() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let _submit = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESHES_PATH);
			then.status(404).header("x-ms-xmlaerror-extended", "Model 'Sales' was not found.");
		})
		.await;
	let poll = mock_poll(&server, "succeeded").await;
	let err = driver().run(&config(&server)).await.expect_err("Rejected request should fail.");

	assert!(matches!(
		err,
		Error::RequestRejected { status: 404, ref detail, .. }
			if detail == "Model 'Sales' was not found."
	));

	poll.assert_calls_async(0).await;
}

#[tokio::test]
async fn sink_failure_keeps_refresh_outcome() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let _submit = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESHES_PATH);
			then.status(202).header("location", server.url("/operations/42"));
		})
		.await;
	let _poll = mock_poll(&server, "succeeded").await;
	let report = driver()
		.with_sink(Arc::new(FailingSink))
		.run(&config(&server))
		.await
		.expect("Sink failure must not fail the refresh.");

	assert!(report.is_success());
	assert_eq!(
		report.persistence,
		Persistence::Failed(SinkError::Backend { message: "table is read-only".into() })
	);
	report.ensure_succeeded().expect("Outcome should remain successful.");
}

#[tokio::test]
async fn log_path_appends_rows_to_file() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server).await;
	let _submit = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESHES_PATH);
			then.status(202).header("location", server.url("/operations/42"));
		})
		.await;
	let _poll = mock_poll(&server, "failed").await;
	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System clock should be after the epoch.")
		.as_nanos();
	let dir = env::temp_dir().join(format!("aas-refresh-it-{nanos}"));
	let path = dir.join("refresh_log.jsonl");
	let config = DriverConfig { log_path: Some(path.clone()), ..config(&server) };

	for _ in 0..2 {
		let report = driver().run(&config).await.expect("Failed refresh is still reported.");

		assert_eq!(report.outcome, RefreshOutcome::Failed);
		assert_eq!(report.persistence, Persistence::Written { rows: 1 });
		assert!(matches!(report.ensure_succeeded(), Err(Error::RemoteJobFailed { .. })));
	}

	let rows =
		FileLogSink::open(&path).expect("Sink should reopen.").load().expect("Rows should load.");

	assert_eq!(rows.len(), 2);
	assert!(rows.iter().all(|row| row.success == SuccessFlag::No && row.model == "Sales"));
	assert!(rows[0].event_description.starts_with("Model Sales failed, URL: "));

	let _ = fs::remove_dir_all(dir);
}
