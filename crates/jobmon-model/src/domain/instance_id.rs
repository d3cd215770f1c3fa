use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Number of random bytes behind an instance id.
const ID_BYTES: usize = 6;
/// Length of the hex-encoded id.
const ID_LEN: usize = ID_BYTES * 2;

/// Identifier of one launched job instance.
///
/// Six random bytes, hex-encoded into 12 lowercase characters.
/// Unique per job name with overwhelming probability; nothing enforces it beyond the id space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceId(String);

impl InstanceId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        // Bytes 0..6 of a v4 uuid carry no version/variant bits.
        let uuid = uuid::Uuid::new_v4();
        let hex = uuid.as_bytes()[..ID_BYTES]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Self(hex)
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ModelError::InvalidInstanceId(s.to_string()))
        }
    }

    pub fn is_valid(s: &str) -> bool {
        s.len() == ID_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InstanceId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InstanceId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InstanceId> for String {
    fn from(value: InstanceId) -> Self {
        value.0
    }
}
