//! Identity inputs, bearer tokens, and the client-credentials token provider.

pub mod credentials;
pub mod id;
pub mod provider;
pub mod token;

pub use credentials::*;
pub use id::*;
pub use provider::*;
pub use token::*;
