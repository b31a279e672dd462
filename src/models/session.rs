use serde::{Deserialize, Serialize};

/// The two identifiers the client persists between runs. Neither carries an
/// expiry; presence is the only thing checked locally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    pub token: Option<String>,
    pub id: Option<String>,
}

impl Session {
    pub fn new(token: String, id: String) -> Self {
        Session {
            token: Some(token),
            id: Some(id),
        }
    }
}
