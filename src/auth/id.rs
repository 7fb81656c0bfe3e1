//! Strongly typed names for tenants, clients, regions, servers, and models.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $inner_whitespace:literal) => {
		#[doc = $doc]
		///
		/// Surrounding whitespace is trimmed before validation.
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after trimming and validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref().trim();

				validate_view($kind, view, $inner_whitespace)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 256;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (tenant, client, server, ...).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (tenant, client, server, ...).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (tenant, client, server, ...).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { TenantId, "Directory (tenant) issuing tokens for the principal.", "Tenant", false }
def_id! { ClientId, "Application (client) identifier of the service principal.", "Client", false }
def_id! { Region, "Azure region of the server, e.g. `westeurope`.", "Region", false }
def_id! { ServerName, "Analysis Services server name.", "Server", false }
def_id! { ModelName, "Tabular model (database) name; may contain inner spaces.", "Model", true }

fn validate_view(
	kind: &'static str,
	view: &str,
	inner_whitespace: bool,
) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if !inner_whitespace && view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_trim_and_validate() {
		let server = ServerName::new("  aas-prod ").expect("Padded server name should be trimmed.");

		assert_eq!(server.as_ref(), "aas-prod");
		assert_eq!(ServerName::new("   "), Err(IdentifierError::Empty { kind: "Server" }));
		assert_eq!(ServerName::new(""), Err(IdentifierError::Empty { kind: "Server" }));
		assert!(matches!(
			ServerName::new("aas prod"),
			Err(IdentifierError::ContainsWhitespace { kind: "Server" })
		));
	}

	#[test]
	fn model_names_allow_inner_spaces() {
		let model = ModelName::new(" Adventure Works ").expect("Model names may contain spaces.");

		assert_eq!(model.as_ref(), "Adventure Works");
		assert_eq!(ModelName::new("\t"), Err(IdentifierError::Empty { kind: "Model" }));
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let tenant: TenantId =
			serde_json::from_str("\"contoso.onmicrosoft.com\"").expect("Tenant should parse.");

		assert_eq!(tenant.as_ref(), "contoso.onmicrosoft.com");
		assert!(serde_json::from_str::<TenantId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<ClientId>("\"\"").is_err());
	}

	#[test]
	fn length_limits_apply() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		Region::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(Region::new(&too_long).is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: std::collections::HashMap<ServerName, u8> = std::collections::HashMap::from_iter(
			[(ServerName::new("aas-prod").expect("Server used for lookup should be valid."), 7_u8)],
		);

		assert_eq!(map.get("aas-prod"), Some(&7));
	}
}
