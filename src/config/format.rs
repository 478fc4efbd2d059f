use std::path::Path;

use serde::de;

/// The format used to represent the configuration data.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    JSON,
    #[default]
    YAML,
}

impl Format {
    /// Guesses the format from the file extension, `None` for unknown
    /// extensions.
    pub fn from_path<T: AsRef<Path>>(path: T) -> Option<Self> {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Some(Format::YAML),
            Some("json") => Some(Format::JSON),
            _ => None,
        }
    }
}

/// Parse the string represented in the specified format, YAML if the
/// format is unknown.
pub fn deserialize<T>(content: &str, format: Option<Format>) -> Result<T, Vec<String>>
where
    T: de::DeserializeOwned,
{
    match format.unwrap_or_default() {
        Format::YAML => serde_yaml::from_str(content).map_err(|err| vec![err.to_string()]),
        Format::JSON => serde_json::from_str(content).map_err(|err| vec![err.to_string()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path() {
        assert_eq!(Format::from_path("a/b.yaml"), Some(Format::YAML));
        assert_eq!(Format::from_path("b.yml"), Some(Format::YAML));
        assert_eq!(Format::from_path("/etc/marathon-sd.json"), Some(Format::JSON));
        assert_eq!(Format::from_path("marathon-sd.toml"), None);
        assert_eq!(Format::from_path("marathon-sd"), None);
    }
}
