//! Bearer tokens and the sources that mint them.

// self
use crate::_prelude::*;

/// Boxed future returned by [`TokenSource::acquire`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<BearerToken>> + 'a + Send>>;

/// Opaque bearer token valid for one invocation; never cached across invocations.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Anything able to hand out a fresh bearer token.
///
/// The status poller uses it to re-authenticate once when a long refresh outlives the token.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Fetches a token.
	fn acquire(&self) -> TokenFuture<'_>;
}

/// Token source that always returns the same pre-fetched token.
#[derive(Clone, Debug)]
pub struct StaticToken(pub BearerToken);
impl TokenSource for StaticToken {
	fn acquire(&self) -> TokenFuture<'_> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}
}
