//! Records of the JSON-lines message log.
//!
//! One line per message, appended in id order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: u64,
    pub sender: String,
    pub room: String,
    pub content: String,
    pub created_at: i64,
}
