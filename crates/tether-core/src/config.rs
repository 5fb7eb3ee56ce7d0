use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CorrelateError, Result};

/// How session credentials reach the target server.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
    /// Engine cookie jar stays on; only the CSRF header/body field is injected.
    #[default]
    Jar,
    /// Engine jar is disabled and cleared; an explicit `Cookie` header is
    /// built from the stored session id and CSRF token.
    ExplicitCookie,
}

/// Which cookies carry credentials and where the CSRF token is placed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialConfig {
    pub session_cookie: String,
    pub csrf_cookie: String,
    pub csrf_header: String,
    pub csrf_body_field: String,
    /// Also write the token into structured request bodies.
    pub body_placement: bool,
    pub mode: CredentialMode,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            session_cookie: "sessionid".into(),
            csrf_cookie: "csrftoken".into(),
            csrf_header: "X-CSRFToken".into(),
            csrf_body_field: "csrfmiddlewaretoken".into(),
            body_placement: true,
            mode: CredentialMode::Jar,
        }
    }
}

/// Shape of the resource listing endpoint and the spawn matching policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListingConfig {
    /// Field holding each record's stable id.
    pub id_field: String,
    /// Refuse to match a spawned resource without a target id.
    pub require_target_id: bool,
    /// Run variable the scenario stores the expected id under.
    pub target_id_var: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            id_field: "sid".into(),
            require_target_id: true,
            target_id_var: "target_sid".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Field holding the app id when the catalog is an array.
    pub id_field: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            id_field: "app_id".into(),
        }
    }
}

/// Top-level `tether.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub credentials: CredentialConfig,
    pub listing: ListingConfig,
    pub catalog: CatalogConfig,
}

/// Load and validate a config from a YAML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CorrelateError::Config(format!("reading {}: {e}", path.display())))?;
    parse_config(&content)
}

/// Parse and validate a config from a YAML string.
pub fn parse_config(yaml: &str) -> Result<Config> {
    // An empty file means "all defaults".
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config =
        serde_yaml::from_str(yaml).map_err(|e| CorrelateError::Config(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    let required = [
        ("credentials.session_cookie", &config.credentials.session_cookie),
        ("credentials.csrf_cookie", &config.credentials.csrf_cookie),
        ("credentials.csrf_header", &config.credentials.csrf_header),
        ("listing.id_field", &config.listing.id_field),
        ("listing.target_id_var", &config.listing.target_id_var),
        ("catalog.id_field", &config.catalog.id_field),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(CorrelateError::Config(format!("{key} must not be empty")));
        }
    }
    if config.credentials.body_placement && config.credentials.csrf_body_field.trim().is_empty() {
        return Err(CorrelateError::Config(
            "credentials.csrf_body_field must not be empty when body_placement is on".into(),
        ));
    }
    if config.credentials.session_cookie == config.credentials.csrf_cookie {
        return Err(CorrelateError::Config(format!(
            "session and CSRF cookies share the name \"{}\"",
            config.credentials.session_cookie
        )));
    }
    Ok(())
}
