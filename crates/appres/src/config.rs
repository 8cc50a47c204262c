//! Resolver configuration.
//!
//! Loaded from TOML. Every key is optional:
//!
//! ```toml
//! apps-marker = "(apps)"
//! this-token = "This"
//! default-action = "browse"
//! application-type = "Application"
//! degraded-retry-secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Names and timings the index build and resolution walk depend on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ResolverConfig {
	/// Folder name that switches a path from literal segments to type segments.
	pub apps_marker: String,
	/// Pseudo-type addressing the instance that owns the apps folder.
	pub this_token: String,
	/// Action used when a query names none.
	pub default_action: String,
	/// Content type whose instances (and subtypes) are application records.
	pub application_type: String,
	/// Seconds a degraded generation is served before a rebuild is retried.
	pub degraded_retry_secs: u64,
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self {
			apps_marker: "(apps)".to_string(),
			this_token: "This".to_string(),
			default_action: "browse".to_string(),
			application_type: "Application".to_string(),
			degraded_retry_secs: 30,
		}
	}
}

impl ResolverConfig {
	/// Parses a TOML document.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&content)
	}

	pub fn degraded_retry(&self) -> Duration {
		Duration::from_secs(self.degraded_retry_secs)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		let names = [
			("apps-marker", &self.apps_marker),
			("this-token", &self.this_token),
			("default-action", &self.default_action),
			("application-type", &self.application_type),
		];
		for (field, value) in names {
			if value.trim().is_empty() {
				return Err(ConfigError::Invalid {
					field,
					reason: "must not be empty".to_string(),
				});
			}
			if value.contains('/') {
				return Err(ConfigError::Invalid {
					field,
					reason: format!("'{value}' must be a single path segment"),
				});
			}
		}
		if self.apps_marker.eq_ignore_ascii_case(&self.this_token) {
			return Err(ConfigError::Invalid {
				field: "this-token",
				reason: "must differ from apps-marker".to_string(),
			});
		}
		Ok(())
	}
}
