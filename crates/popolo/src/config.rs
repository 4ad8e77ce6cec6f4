//! Schema binding configuration.
//!
//! The schema layer only needs to know which host application owns the
//! concrete tables, so that foreign keys can be expressed as
//! `<app>.<Model>` paths. The binding is an explicit value handed to
//! [`Schema::build`](crate::schema::Schema::build); [`PopoloConfig::from_env`]
//! is the convenience loader for deployments that configure through the
//! environment.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming the host application.
pub const APP_NAME_VAR: &str = "POPOLO_APP_NAME";

/// Binding of the schema to a host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopoloConfig {
    /// Application that owns the concrete model tables (e.g. "popolo")
    pub app_name: String,
}

impl PopoloConfig {
    /// Bind to an application by name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `POPOLO_APP_NAME`: application owning the concrete tables (required)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] when the variable is unset and
    /// [`ConfigError::InvalidValue`] when it is not a usable application name.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_name = std::env::var(APP_NAME_VAR)
            .map_err(|_| ConfigError::MissingSetting(APP_NAME_VAR.to_string()))?;
        let config = Self::new(app_name);
        config.validate()?;
        Ok(config)
    }

    /// Check that the application name can be used in a model path.
    ///
    /// A usable name is non-empty, starts with a letter or underscore and
    /// otherwise contains only ASCII alphanumerics and underscores.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.app_name.as_str();
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(ConfigError::MissingSetting(APP_NAME_VAR.to_string()));
        };
        let well_formed = (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !well_formed {
            return Err(ConfigError::InvalidValue {
                key: APP_NAME_VAR.to_string(),
                message: format!("'{}' is not a valid application name", name),
            });
        }
        Ok(())
    }

    /// Qualified path of a model in the bound application.
    ///
    /// ```
    /// use popolo::PopoloConfig;
    ///
    /// let config = PopoloConfig::new("civic");
    /// assert_eq!(config.model_path("Person"), "civic.Person");
    /// ```
    pub fn model_path(&self, model_name: &str) -> String {
        format!("{}.{}", self.app_name, model_name)
    }
}
