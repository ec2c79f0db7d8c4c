use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role carried inside every credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Regular,
    Organizer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Organizer => "organizer",
        }
    }

    pub fn is_organizer(&self) -> bool { matches!(self, Role::Organizer) }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Role::Regular),
            "organizer" => Ok(Role::Organizer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The caller resolved from a credential. Lives for one request only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
    pub subject_id: i64,
    #[serde(default)]
    pub role: Role,
}

impl RequestIdentity {
    pub fn new(subject_id: i64, role: Role) -> Self { Self { subject_id, role } }

    /// Identity assigned to the test-mode bypass credential.
    pub fn synthetic() -> Self { Self { subject_id: 1, role: Role::Regular } }
}
