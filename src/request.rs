//! Refresh request payloads, target addressing, and submission.
//!
//! A [`RefreshRequest`] is built once from a [`RefreshMode`] (plus table selectors for
//! table mode) and posted once to the model's `refreshes` collection. The raw response is
//! handed back uninterpreted; the status poller classifies it.

pub mod body;
pub mod mode;
pub mod target;

pub use body::*;
pub use mode::*;
pub use target::*;

// crates.io
use oauth2::{HttpResponse, http::Method};
// self
use crate::{
	_prelude::*,
	auth::BearerToken,
	client::{self, AasClient},
	error::ConfigError,
	http::HttpTransport,
	oauth::TransportErrorMapper,
	obs::Stage,
};

impl<C, M> AasClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Posts `request` to the target's `refreshes` collection with bearer auth.
	///
	/// Network failures propagate; no retry happens at this layer.
	pub async fn submit_refresh(
		&self,
		target: &RefreshTarget,
		token: &BearerToken,
		request: &RefreshRequest,
	) -> Result<HttpResponse> {
		let url = target.refreshes_url()?;
		let body = serde_json::to_vec(request).map_err(ConfigError::from)?;
		let http_request = client::bearer_request(Method::POST, &url, token, Some(body))?;

		tracing::info!(
			server = %target.server,
			model = %target.model,
			kind = %request.kind,
			objects = request.objects.len(),
			"Submitting refresh request."
		);

		let response = self.execute(Stage::Submit, http_request).await?;

		tracing::debug!(status = response.status().as_u16(), "Refresh endpoint responded.");

		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, auth::{ModelName, Region, ServerName}};

	#[tokio::test]
	async fn submit_posts_json_body_with_bearer_auth() {
		let (client, transport) = build_scripted_client([scripted_response(
			202,
			&[("location", "https://westeurope.asazure.windows.net/servers/aas/models/Sales/refreshes/1")],
			"",
		)]);
		let target = RefreshTarget::new(
			Region::new("westeurope").expect("Region should be valid."),
			ServerName::new("aas").expect("Server should be valid."),
			ModelName::new("Sales").expect("Model should be valid."),
		);
		let request = RefreshRequest::for_mode(RefreshMode::Default, &[])
			.expect("Default mode needs no tables.");
		let response = client
			.submit_refresh(&target, &BearerToken::new("aas-token"), &request)
			.await
			.expect("Submission should return the raw response.");

		assert_eq!(response.status().as_u16(), 202);

		let sent = transport.requests();
		let body: serde_json::Value =
			serde_json::from_slice(sent[0].body()).expect("Body should be JSON.");

		assert_eq!(sent[0].method(), &Method::POST);
		assert_eq!(
			sent[0].uri().to_string(),
			"https://westeurope.asazure.windows.net/servers/aas/models/Sales/refreshes"
		);
		assert_eq!(
			sent[0].headers().get("authorization").and_then(|v| v.to_str().ok()),
			Some("Bearer aas-token")
		);
		assert_eq!(
			body,
			serde_json::json!({
				"Type": "default",
				"CommitMode": "transactional",
				"MaxParallelism": 2,
				"RetryCount": 2,
				"Objects": [],
			})
		);
	}
}
