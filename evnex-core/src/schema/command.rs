//! Command acknowledgements

use serde::{Deserialize, Serialize};

/// Acknowledgement of a remote command
///
/// Shared by the v2 and v3 command endpoints. It only says the charge point
/// accepted the command, not that the command took effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// e.g. `Accepted` or `Rejected`
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn is_accepted(&self) -> bool {
        self.status.eq_ignore_ascii_case("accepted")
    }
}
