//! Garoon connection configuration.

use std::path::Path;

use calmap_core::TimeZone;
use serde::Deserialize;
use url::Url;

use crate::error::{GaroonError, GaroonResult};

/// Connection parameters for a Garoon server, loadable from a TOML
/// file.
///
/// ```toml
/// url = "https://garoon.example.com/cgi-bin/cbgrn/grn.cgi"
/// user = "sato"
/// password = "secret"
/// language = "en"
/// timezone = "Asia/Tokyo"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GaroonConfig {
    /// Base URL of the Garoon CGI, typically ending in `grn.cgi` or
    /// `grn.exe`. The WSDL lives at `{url}?WSDL`.
    pub url: String,
    pub user: String,
    pub password: String,
    /// Language of server messages, `"en"` or `"ja"`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Zone that all-day dates and repeat times are interpreted in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl GaroonConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> GaroonResult<GaroonConfig> {
        let contents = std::fs::read_to_string(path)?;
        let config: GaroonConfig = toml::from_str(&contents).map_err(|e| {
            GaroonError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field; called again by [`crate::GaroonClient::new`]
    /// so hand-built configs get the same treatment as loaded ones.
    pub fn validate(&self) -> GaroonResult<()> {
        let fields = [
            ("url", &self.url),
            ("user", &self.user),
            ("password", &self.password),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(GaroonError::Config(format!("`{name}` must not be empty")));
            }
        }

        let url = Url::parse(&self.url)
            .map_err(|e| GaroonError::Config(format!("invalid `url`: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GaroonError::Config(format!(
                "`url` must use http or https, got {:?}",
                url.scheme()
            )));
        }

        if !matches!(self.language.as_str(), "en" | "ja") {
            return Err(GaroonError::Config(format!(
                "`language` must be \"en\" or \"ja\", got {:?}",
                self.language
            )));
        }

        TimeZone::get(&self.timezone)?;

        Ok(())
    }

    /// URL the WSDL document is served from.
    pub fn wsdl_url(&self) -> String {
        format!("{}?WSDL", self.url)
    }

    /// The configured display zone, resolved.
    pub fn zone(&self) -> GaroonResult<TimeZone> {
        Ok(TimeZone::get(&self.timezone)?)
    }
}
