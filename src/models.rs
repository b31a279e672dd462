pub mod pix;
pub mod plans;
pub mod referrals;
pub mod session;
pub mod transactions;
pub mod users;

use serde::{Deserialize, Deserializer};

/// Identifiers arrive as JSON numbers from some endpoints and strings from
/// others; the client keeps them as strings.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    match Id::deserialize(deserializer)? {
        Id::Text(text) => Ok(text),
        Id::Number(number) => Ok(number.to_string()),
    }
}
