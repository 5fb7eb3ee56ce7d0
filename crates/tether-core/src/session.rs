//! Per-run session credentials and their injection into outbound requests.

use serde::{Deserialize, Serialize};

use crate::config::CredentialConfig;
use crate::cookie::CookieMap;
use crate::error::{CorrelateError, Result};
use crate::types::RequestDescriptor;

const SAFE_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS", "TRACE"];

/// Methods exempt from CSRF injection.
pub fn is_safe_method(method: &str) -> bool {
    SAFE_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method))
}

/// Session id and CSRF token for one virtual-user run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

impl SessionState {
    /// Apply recognized cookies from one response. Values missing from
    /// `cookies` keep their stored value. Returns true if anything changed.
    pub fn update(&mut self, cookies: &CookieMap, config: &CredentialConfig) -> bool {
        let mut changed = false;
        if let Some(sid) = cookies.get(&config.session_cookie) {
            changed |= self.session_id.as_deref() != Some(sid.as_str());
            self.session_id = Some(sid.clone());
        }
        if let Some(token) = cookies.get(&config.csrf_cookie) {
            changed |= self.csrf_token.as_deref() != Some(token.as_str());
            self.csrf_token = Some(token.clone());
        }
        if changed {
            tracing::debug!(
                has_session = self.session_id.is_some(),
                has_csrf = self.csrf_token.is_some(),
                "session credentials updated"
            );
        }
        changed
    }

    /// Attach the CSRF token to an unsafe-method request.
    ///
    /// Safe methods are left untouched. Unsafe methods without a stored token
    /// fail with [`CorrelateError::MissingCredential`].
    pub fn inject(&self, request: &mut RequestDescriptor, config: &CredentialConfig) -> Result<()> {
        if is_safe_method(&request.method) {
            return Ok(());
        }
        let token = self
            .csrf_token
            .as_deref()
            .ok_or_else(|| CorrelateError::MissingCredential {
                method: request.method.clone(),
                url: request.url.clone(),
            })?;

        request
            .headers
            .insert(config.csrf_header.clone(), token.to_string());

        if config.body_placement {
            if let Some(form) = request.form.as_mut() {
                form.insert(config.csrf_body_field.clone(), token.to_string());
            }
            match request.json.as_mut() {
                Some(serde_json::Value::Object(body)) => {
                    body.insert(
                        config.csrf_body_field.clone(),
                        serde_json::Value::String(token.to_string()),
                    );
                }
                Some(_) => {
                    tracing::debug!(url = %request.url, "JSON body is not an object; header placement only");
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Explicit `Cookie` header value carrying the stored credentials, or
    /// `None` when nothing has been observed yet.
    pub fn cookie_header(&self, config: &CredentialConfig) -> Option<String> {
        let pairs: Vec<String> = [
            (&config.session_cookie, &self.session_id),
            (&config.csrf_cookie, &self.csrf_token),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}={v}")))
        .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}
