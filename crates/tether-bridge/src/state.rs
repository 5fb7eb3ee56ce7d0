//! Run-scoped state kept in the engine's variable store.
//!
//! The engine hands us the run's variables on every hook call and takes them
//! back afterwards, so nothing here lives past a single invocation.

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tether_core::{LifecycleTracker, SessionState};

/// The engine's per-run variable store.
pub type RunVars = serde_json::Map<String, serde_json::Value>;

/// Fixed variable names.
pub mod keys {
    /// Serialized [`tether_core::SessionState`].
    pub const SESSION: &str = "tether.session";
    /// Serialized [`tether_core::LifecycleTracker`].
    pub const LIFECYCLE: &str = "tether.lifecycle";
    /// Current CSRF token, for scenario templates.
    pub const CSRF_TOKEN: &str = "csrf_token";
    /// Spawned resource record as the listing returned it.
    pub const SPAWNED_APP: &str = "spawned_app";
    /// Parsed available-apps catalog.
    pub const AVAILABLE_APPS: &str = "available_apps";
    /// Randomly picked catalog entry.
    pub const RANDOM_APP: &str = "random_app";
    /// Set once the engine jar has been switched off for this run.
    pub const JAR_DISABLED: &str = "tether.cookie_jar_disabled";
}

/// Everything this run tracks between hook calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    pub session: SessionState,
    pub lifecycle: LifecycleTracker,
    pub jar_disabled: bool,
}

impl RunState {
    /// Rebuild from the variable store; missing keys start fresh.
    pub fn load(vars: &RunVars) -> anyhow::Result<Self> {
        Ok(Self {
            session: read_var(vars, keys::SESSION)?.unwrap_or_default(),
            lifecycle: read_var(vars, keys::LIFECYCLE)?.unwrap_or_default(),
            jar_disabled: read_var(vars, keys::JAR_DISABLED)?.unwrap_or_default(),
        })
    }

    /// Write back into the variable store, including template mirrors.
    pub fn store(&self, vars: &mut RunVars) -> anyhow::Result<()> {
        write_var(vars, keys::SESSION, &self.session)?;
        write_var(vars, keys::LIFECYCLE, &self.lifecycle)?;
        if self.jar_disabled {
            vars.insert(keys::JAR_DISABLED.into(), true.into());
        } else {
            vars.remove(keys::JAR_DISABLED);
        }
        match &self.session.csrf_token {
            Some(token) => {
                vars.insert(keys::CSRF_TOKEN.into(), token.clone().into());
            }
            None => {
                vars.remove(keys::CSRF_TOKEN);
            }
        }
        match &self.lifecycle.tracked {
            Some(tracked) => {
                vars.insert(
                    keys::SPAWNED_APP.into(),
                    serde_json::Value::Object(tracked.record.attrs.clone()),
                );
            }
            None => {
                vars.remove(keys::SPAWNED_APP);
            }
        }
        Ok(())
    }
}

pub(crate) fn read_var<T: DeserializeOwned>(vars: &RunVars, key: &str) -> anyhow::Result<Option<T>> {
    match vars.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .with_context(|| format!("run variable '{key}' is malformed")),
    }
}

pub(crate) fn write_var<T: Serialize>(vars: &mut RunVars, key: &str, value: &T) -> anyhow::Result<()> {
    let v = serde_json::to_value(value).with_context(|| format!("serializing '{key}'"))?;
    vars.insert(key.to_string(), v);
    Ok(())
}

/// String-valued run variable, if set and non-empty.
pub(crate) fn get_str<'a>(vars: &'a RunVars, key: &str) -> Option<&'a str> {
    vars.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}
