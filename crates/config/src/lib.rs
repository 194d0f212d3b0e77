use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings of a GraphQL view.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    /// Whether introspection queries are allowed
    pub introspection: bool,
    /// Attach debug information to errors. Must stay disabled in production.
    pub debug: bool,
    /// Maximum size of the request body in bytes
    pub request_body_limit: usize,
    /// GraphQL Playground options, merged over the defaults key by key
    pub playground: Option<Map<String, Value>>,
    /// How errors are reported in responses
    pub error_formatting: ErrorFormattingConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            introspection: true,
            debug: false,
            request_body_limit: 2 * 1024 * 1024,
            playground: None,
            error_formatting: Default::default(),
        }
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorFormattingConfig {
    /// Classify errors with the built-in rule table instead of sending the engine's messages
    pub classify: bool,
    /// Also classify database errors. Requires the PostgreSQL driver.
    pub database_errors: bool,
}

impl ViewConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&input)
    }

    /// Options handed to the playground page: the defaults with the configured top level keys
    /// replacing them.
    pub fn playground_options(&self) -> Value {
        let mut options = default_playground_options();
        if let Some(overrides) = &self.playground {
            options.extend(overrides.clone());
        }
        Value::Object(options)
    }
}

// https://github.com/graphql/graphql-playground#properties
fn default_playground_options() -> Map<String, Value> {
    let mut settings = Map::new();
    settings.insert("request.credentials".to_string(), Value::from("same-origin"));

    let mut options = Map::new();
    options.insert("settings".to_string(), Value::Object(settings));
    options.insert("headers".to_string(), Value::Object(Map::new()));
    options
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_json_snapshot;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = ViewConfig::from_toml_str("").unwrap();

        assert!(config.introspection);
        assert!(!config.debug);
        assert!(!config.error_formatting.classify);
        assert!(!config.error_formatting.database_errors);
        assert_eq!(config.request_body_limit, 2_097_152);
        assert_json_snapshot!(config.playground_options(), @r#"
        {
          "settings": {
            "request.credentials": "same-origin"
          },
          "headers": {}
        }
        "#);
    }

    #[test]
    fn values() {
        let input = indoc! {r#"
            introspection = false
            debug = true
            request_body_limit = 1024

            [error_formatting]
            classify = true
            database_errors = true
        "#};

        let config = ViewConfig::from_toml_str(input).unwrap();

        assert!(!config.introspection);
        assert!(config.debug);
        assert_eq!(config.request_body_limit, 1024);
        assert!(config.error_formatting.classify);
        assert!(config.error_formatting.database_errors);
    }

    #[test]
    fn playground_overrides_replace_top_level_keys() {
        let input = indoc! {r#"
            [playground.settings]
            "editor.theme" = "light"

            [playground.tabs]
            endpoint = "/graphql"
        "#};

        let config = ViewConfig::from_toml_str(input).unwrap();

        assert_json_snapshot!(config.playground_options(), @r#"
        {
          "settings": {
            "editor.theme": "light"
          },
          "headers": {},
          "tabs": {
            "endpoint": "/graphql"
          }
        }
        "#);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = ViewConfig::from_toml_str("schema = \"schema.graphql\"").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file() {
        let error = ViewConfig::from_path("/definitely/not/here.toml").unwrap_err();
        assert!(error.to_string().starts_with("reading configuration file /definitely/not/here.toml"));
    }
}
