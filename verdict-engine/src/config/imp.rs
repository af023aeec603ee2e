// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ConfigParseError;
use camino::Utf8Path;
use serde::Deserialize;
use std::{collections::BTreeSet, io};
use tracing::{debug, warn};

/// Environment variable consulted for the config file path when none is passed explicitly.
pub const CONFIG_FILE_ENV: &str = "VERDICT_CONFIG_FILE";

/// Specifies where to load configuration from.
#[derive(Clone, Copy, Debug)]
pub enum ConfigLocation<'a> {
    /// Use only the defaults embedded in this crate.
    Embedded,

    /// Load overrides from an explicit path.
    ///
    /// Returns an error if the file does not exist.
    Explicit(&'a Utf8Path),
}

/// Configuration after user settings have been layered over the embedded defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Settings for the fallback heuristic parser.
    pub fallback: FallbackConfig,
    /// Settings for the identifier matcher.
    pub matching: MatchingConfig,
    /// Settings for the side-channel reader.
    pub side_channel: SideChannelConfig,
}

/// Resolved `[fallback]` settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackConfig {
    /// Tokens whose presence indicates a failure.
    pub failure_indicators: Vec<String>,
    /// Tokens whose presence indicates a pass.
    pub pass_indicators: Vec<String>,
}

/// Resolved `[matching]` settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchingConfig {
    /// Whether records are restricted to suites whose path refers to the declared file.
    pub scope_to_file: bool,
}

/// Resolved `[side-channel]` settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideChannelConfig {
    /// The prefix that starts a structured result line.
    pub marker: String,
}

impl ReconcileConfig {
    /// Loads configuration from the given location.
    pub fn load(location: ConfigLocation<'_>) -> Result<Self, ConfigParseError> {
        Self::load_with_warnings(location, &mut DefaultConfigWarnings)
    }

    fn load_with_warnings(
        location: ConfigLocation<'_>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let defaults = DefaultConfig::from_embedded();
        match location {
            ConfigLocation::Embedded => {
                debug!("config: using embedded defaults");
                Ok(defaults.into_config())
            }
            ConfigLocation::Explicit(path) => {
                debug!("config: loading from explicit path {path}");
                let contents = match std::fs::read_to_string(path) {
                    Ok(contents) => contents,
                    Err(error) if error.kind() == io::ErrorKind::NotFound => {
                        return Err(ConfigParseError::FileNotFound {
                            path: path.to_owned(),
                        });
                    }
                    Err(error) => {
                        return Err(ConfigParseError::Read {
                            path: path.to_owned(),
                            error,
                        });
                    }
                };
                Self::from_toml_str(&contents, path, warnings)
            }
        }
    }

    fn from_toml_str(
        contents: &str,
        path: &Utf8Path,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config, unknown) =
            DeserializedConfig::deserialize_toml(contents).map_err(|error| {
                ConfigParseError::Parse {
                    path: path.to_owned(),
                    error,
                }
            })?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(path, &unknown);
        }

        let resolved = config.resolve(DefaultConfig::from_embedded());
        resolved.validate(path)?;
        debug!("config: loaded successfully from {path}");
        Ok(resolved)
    }

    fn validate(&self, path: &Utf8Path) -> Result<(), ConfigParseError> {
        let indicator_lists = [
            ("fallback.failure-indicators", &self.fallback.failure_indicators),
            ("fallback.pass-indicators", &self.fallback.pass_indicators),
        ];
        for (key, indicators) in indicator_lists {
            if indicators.iter().any(|indicator| indicator.trim().is_empty()) {
                return Err(ConfigParseError::InvalidValue {
                    path: path.to_owned(),
                    key,
                    reason: "indicators must not be empty or only whitespace".to_owned(),
                });
            }
        }

        let marker = &self.side_channel.marker;
        if marker.is_empty() || marker.chars().any(char::is_whitespace) {
            return Err(ConfigParseError::InvalidValue {
                path: path.to_owned(),
                key: "side-channel.marker",
                reason: format!("marker `{marker}` must be non-empty and contain no whitespace"),
            });
        }

        Ok(())
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        DefaultConfig::from_embedded().into_config()
    }
}

/// Trait for handling configuration warnings.
///
/// Lets tests collect warnings instead of logging them.
trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Logs warnings through `tracing`.
struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.push_str(unknown.iter().next().expect("length is 1"));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// User configuration (deserialized form). Every value is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedConfig {
    #[serde(default)]
    fallback: DeserializedFallbackConfig,
    #[serde(default)]
    matching: DeserializedMatchingConfig,
    #[serde(default)]
    side_channel: DeserializedSideChannelConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedFallbackConfig {
    #[serde(default)]
    failure_indicators: Option<Vec<String>>,
    #[serde(default)]
    pass_indicators: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedMatchingConfig {
    #[serde(default)]
    scope_to_file: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedSideChannelConfig {
    #[serde(default)]
    marker: Option<String>,
}

impl DeserializedConfig {
    /// Deserializes TOML content and returns the config along with any unknown keys.
    fn deserialize_toml(contents: &str) -> Result<(Self, BTreeSet<String>), toml::de::Error> {
        let deserializer = toml::Deserializer::parse(contents)?;
        let mut unknown = BTreeSet::new();
        let config: DeserializedConfig = serde_ignored::deserialize(deserializer, |path| {
            unknown.insert(path.to_string());
        })?;
        Ok((config, unknown))
    }

    fn resolve(self, defaults: DefaultConfig) -> ReconcileConfig {
        ReconcileConfig {
            fallback: FallbackConfig {
                failure_indicators: self
                    .fallback
                    .failure_indicators
                    .unwrap_or(defaults.fallback.failure_indicators),
                pass_indicators: self
                    .fallback
                    .pass_indicators
                    .unwrap_or(defaults.fallback.pass_indicators),
            },
            matching: MatchingConfig {
                scope_to_file: self
                    .matching
                    .scope_to_file
                    .unwrap_or(defaults.matching.scope_to_file),
            },
            side_channel: SideChannelConfig {
                marker: self
                    .side_channel
                    .marker
                    .unwrap_or(defaults.side_channel.marker),
            },
        }
    }
}

/// The embedded defaults. Every value is required.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultConfig {
    fallback: DefaultFallbackConfig,
    matching: DefaultMatchingConfig,
    side_channel: DefaultSideChannelConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultFallbackConfig {
    failure_indicators: Vec<String>,
    pass_indicators: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultMatchingConfig {
    scope_to_file: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultSideChannelConfig {
    marker: String,
}

impl DefaultConfig {
    /// The embedded default config TOML.
    const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Parses the default config.
    ///
    /// Panics if the embedded TOML is invalid or contains unknown keys.
    fn from_embedded() -> Self {
        let deserializer = toml::Deserializer::parse(Self::DEFAULT_CONFIG)
            .expect("embedded default config should parse");
        let mut unknown = BTreeSet::new();
        let config: DefaultConfig =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .expect("embedded default config should be valid");

        // The default config ships with the binary, so unknown keys are a bug.
        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default config: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        config
    }

    fn into_config(self) -> ReconcileConfig {
        ReconcileConfig {
            fallback: FallbackConfig {
                failure_indicators: self.fallback.failure_indicators,
                pass_indicators: self.fallback.pass_indicators,
            },
            matching: MatchingConfig {
                scope_to_file: self.matching.scope_to_file,
            },
            side_channel: SideChannelConfig {
                marker: self.side_channel.marker,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use camino_tempfile::tempdir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct TestConfigWarnings {
        unknown_keys: Option<(Utf8PathBuf, BTreeSet<String>)>,
    }

    impl ConfigWarnings for TestConfigWarnings {
        fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
            self.unknown_keys = Some((config_file.to_owned(), unknown.clone()));
        }
    }

    #[test]
    fn default_config_is_valid() {
        // This will panic if the TOML is missing any required fields, or has unknown keys.
        let config = ReconcileConfig::default();
        config
            .validate(Utf8Path::new("<embedded>"))
            .expect("embedded defaults are valid");
        assert!(config.matching.scope_to_file);
        assert_eq!(config.side_channel.marker, "##verdict");
        assert!(config.fallback.failure_indicators.iter().any(|t| t == "Error:"));
    }

    #[test]
    fn user_values_override_defaults() {
        let contents = indoc! {r#"
            [fallback]
            pass-indicators = ["ALL GREEN"]

            [matching]
            scope-to-file = false
        "#};
        let mut warnings = TestConfigWarnings::default();
        let config =
            ReconcileConfig::from_toml_str(contents, Utf8Path::new("verdict.toml"), &mut warnings)
                .expect("config valid");

        let defaults = ReconcileConfig::default();
        assert_eq!(config.fallback.pass_indicators, vec!["ALL GREEN".to_owned()]);
        assert_eq!(
            config.fallback.failure_indicators,
            defaults.fallback.failure_indicators
        );
        assert!(!config.matching.scope_to_file);
        assert_eq!(config.side_channel, defaults.side_channel);
        assert!(warnings.unknown_keys.is_none());
    }

    #[test]
    fn ignored_keys() {
        let contents = indoc! {r#"
            ignored1 = "test"

            [matching]
            scope-to-file = true
            ignored2 = "hi"
        "#};

        let temp_dir = tempdir().expect("tempdir created");
        let config_path = temp_dir.path().join("verdict.toml");
        std::fs::write(&config_path, contents).expect("config written");

        let mut warnings = TestConfigWarnings::default();
        ReconcileConfig::load_with_warnings(ConfigLocation::Explicit(&config_path), &mut warnings)
            .expect("config valid");

        let (path, unknown) = warnings.unknown_keys.expect("unknown keys reported");
        assert_eq!(path, config_path);
        assert_eq!(
            unknown,
            ["ignored1", "matching.ignored2"]
                .into_iter()
                .map(String::from)
                .collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut warnings = TestConfigWarnings::default();
        let path = Utf8Path::new("verdict.toml");

        let err = ReconcileConfig::from_toml_str(
            "[fallback]\nfailure-indicators = [\"FAIL\", \"  \"]\n",
            path,
            &mut warnings,
        )
        .expect_err("blank indicator");
        assert!(
            matches!(err, ConfigParseError::InvalidValue { key: "fallback.failure-indicators", .. }),
            "unexpected error: {err:?}"
        );

        let err = ReconcileConfig::from_toml_str(
            "[side-channel]\nmarker = \"## verdict\"\n",
            path,
            &mut warnings,
        )
        .expect_err("marker with whitespace");
        assert!(
            matches!(err, ConfigParseError::InvalidValue { key: "side-channel.marker", .. }),
            "unexpected error: {err:?}"
        );

        let err = ReconcileConfig::from_toml_str("[matching]\nscope-to-file = 3\n", path, &mut warnings)
            .expect_err("wrong type");
        assert!(matches!(err, ConfigParseError::Parse { .. }), "unexpected error: {err:?}");
    }

    #[test]
    fn missing_explicit_file() {
        let temp_dir = tempdir().expect("tempdir created");
        let config_path = temp_dir.path().join("does-not-exist.toml");
        let err = ReconcileConfig::load(ConfigLocation::Explicit(&config_path))
            .expect_err("file does not exist");
        assert!(
            matches!(&err, ConfigParseError::FileNotFound { path } if *path == config_path),
            "unexpected error: {err:?}"
        );
    }
}
