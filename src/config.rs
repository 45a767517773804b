use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

use crate::error::{AppError, AppResult};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub site: SiteConfig,
}

/// Connection details for the hosted data gateway. The URL and anon key are
/// environment-supplied in deployment; the TOML file is a local convenience.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct GatewayConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    /// Post-confirmation redirect target for sign-up emails.
    pub url: String,
    /// Path under `url` that hosts the reset-password view.
    pub reset_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5173".to_string(),
            reset_path: "/reset-password".to_string(),
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides.
    /// Environment wins over file values.
    pub fn load(path: Option<&PathBuf>) -> AppResult<Self> {
        let config_path = path.cloned().unwrap_or_else(Self::default_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| AppError::Config(format!("{}: {e}", config_path.display())))?;
            toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))?
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var("RINKSIDE_GATEWAY_URL") {
            config.gateway.url = url;
        }
        if let Ok(key) = std::env::var("RINKSIDE_GATEWAY_KEY") {
            config.gateway.anon_key = key;
        }
        if let Ok(site) = std::env::var("RINKSIDE_SITE_URL") {
            config.site.url = site;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rinkside")
            .join("config.toml")
    }

    fn validate(&self) -> AppResult<()> {
        if self.gateway.url.is_empty() {
            return Err(AppError::Config("gateway url is not set".into()));
        }
        Url::parse(&self.gateway.url)
            .map_err(|e| AppError::Config(format!("invalid gateway url: {e}")))?;
        if self.gateway.anon_key.is_empty() {
            return Err(AppError::Config("gateway anon key is not set".into()));
        }
        Ok(())
    }

    /// Redirect target passed with sign-up requests.
    pub fn signup_redirect(&self) -> String {
        format!("{}/", self.site.url.trim_end_matches('/'))
    }

    /// Redirect target passed with password-reset emails.
    pub fn reset_redirect(&self) -> String {
        format!(
            "{}{}",
            self.site.url.trim_end_matches('/'),
            self.site.reset_path
        )
    }
}
