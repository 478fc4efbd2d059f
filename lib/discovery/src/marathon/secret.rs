use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Deserializer};

/// A string holding credentials, it never shows up in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    #[inline]
    pub fn inner(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        SecretString(value.to_string())
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        SecretString(value)
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("******")
    }
}

impl Display for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("******")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretString)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked() {
        let secret = serde_json::from_str::<SecretString>("\"foobar\"").unwrap();
        assert_eq!(secret.inner(), "foobar");
        assert_eq!(format!("{secret:?}"), "******");
        assert_eq!(secret.to_string(), "******");
    }
}
