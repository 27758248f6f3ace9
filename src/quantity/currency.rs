use serde::{Deserialize, Serialize};

/// ISO 4217 currency code the costs are expressed in.
#[must_use]
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Deserialize,
    Serialize,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
#[serde(transparent)]
pub struct Currency(pub String);

impl Default for Currency {
    fn default() -> Self {
        Self(String::from("USD"))
    }
}
