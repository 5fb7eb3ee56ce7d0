//! Available-apps listing and the random pick for the spawn step.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CorrelateError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppEntry {
    pub app_id: String,
    #[serde(default)]
    pub attrs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub apps: Vec<AppEntry>,
}

impl Catalog {
    /// Parse either `{"<app_id>": {...}, ...}` or `[{"<id_field>": ...}, ...]`.
    pub fn parse(body: &str, id_field: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| CorrelateError::parse_failure(e, body))?;
        Self::from_value(value, id_field).map_err(|reason| CorrelateError::parse_failure(reason, body))
    }

    /// Same as [`Catalog::parse`] for an already-decoded value.
    pub fn from_value(value: serde_json::Value, id_field: &str) -> std::result::Result<Self, String> {
        let apps = match value {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(app_id, v)| match v {
                    serde_json::Value::Object(attrs) => Ok(AppEntry { app_id, attrs }),
                    _ => Err(format!("app \"{app_id}\" is not an object")),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
            serde_json::Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| {
                    let serde_json::Value::Object(attrs) = v else {
                        return Err(format!("item {i} is not an object"));
                    };
                    let app_id = attrs
                        .get(id_field)
                        .and_then(|x| x.as_str())
                        .ok_or_else(|| format!("item {i} has no \"{id_field}\""))?
                        .to_string();
                    Ok(AppEntry { app_id, attrs })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
            _ => return Err("expected object or array".into()),
        };
        Ok(Self { apps })
    }

    /// Uniformly random entry.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&AppEntry> {
        self.apps
            .choose(rng)
            .ok_or_else(|| CorrelateError::ResourceNotFound("catalog has no apps to pick from".into()))
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
