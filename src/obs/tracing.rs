// crates.io
use tracing::{Instrument, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::Stage};

/// A span builder used by pipeline stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	stage: Stage,
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage and model labels.
	pub fn new(stage: Stage, server: &str, model: &str) -> Self {
		let span = tracing::info_span!("aas_refresh.stage", stage = stage.as_str(), server, model);

		Self { stage, span }
	}

	/// Stage this span describes.
	pub fn stage(&self) -> Stage {
		self.stage
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
