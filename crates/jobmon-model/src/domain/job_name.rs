use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

const MAX_LEN: usize = 128;

/// Name of a registered job.
///
/// Used verbatim as a storage key, so only a filesystem-safe subset is accepted:
/// ASCII alphanumerics plus `-`, `_` and `.`, at most 128 bytes, and never `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobName(String);

impl JobName {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(ModelError::InvalidJobName(name))
        }
    }

    pub fn is_valid(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= MAX_LEN
            && name != "."
            && name != ".."
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for JobName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for JobName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobName> for String {
    fn from(value: JobName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_filesystem_safe_names() {
        for name in ["backup", "nightly-import", "etl_v2", "report.daily", "A1"] {
            assert!(JobName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_path_like_names() {
        for name in ["", ".", "..", "a/b", "../etc", "with space", "tab\there", "ü"] {
            assert_eq!(
                JobName::new(name),
                Err(ModelError::InvalidJobName(name.to_string()))
            );
        }
    }

    #[test]
    fn rejects_overlong_names() {
        let name = "x".repeat(MAX_LEN + 1);
        assert!(JobName::new(name).is_err());
        assert!(JobName::new("x".repeat(MAX_LEN)).is_ok());
    }

    #[test]
    fn serde_is_transparent_and_validating() {
        let name = JobName::new("backup").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), r#""backup""#);

        let bad: Result<JobName, _> = serde_json::from_str(r#""../x""#);
        assert!(bad.is_err());
    }
}
