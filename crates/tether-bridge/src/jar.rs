use serde::{Deserialize, Serialize};

/// The engine's cookie jar, as far as this crate needs it.
pub trait CookieJar {
    /// Cookies the jar would send to `url`.
    fn cookies_for_url(&self, url: &str) -> Vec<JarCookie>;
    /// Drop every cookie.
    fn remove_all(&mut self);
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JarCookie {
    pub name: String,
    pub value: String,
}

/// Jar contents shipped inside a hook envelope.
///
/// The engine has already matched these against the request URL, so
/// `cookies_for_url` returns all of them. Clearing is reported back to the
/// engine through [`JarDirective`].
#[derive(Debug, Clone, Default)]
pub struct EnvelopeJar {
    cookies: Vec<JarCookie>,
    cleared: bool,
}

impl EnvelopeJar {
    pub fn new(cookies: Vec<JarCookie>) -> Self {
        Self {
            cookies,
            cleared: false,
        }
    }

    pub fn was_cleared(&self) -> bool {
        self.cleared
    }
}

impl CookieJar for EnvelopeJar {
    fn cookies_for_url(&self, _url: &str) -> Vec<JarCookie> {
        self.cookies.clone()
    }

    fn remove_all(&mut self) {
        self.cookies.clear();
        self.cleared = true;
    }
}

/// What the engine must do with its jar after the hook returns.
///
/// `enabled` is a change request: `None` leaves the engine's jar setting
/// as it is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JarDirective {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub cleared: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_all_empties_and_flags() {
        let mut jar = EnvelopeJar::new(vec![JarCookie {
            name: "sessionid".into(),
            value: "stale".into(),
        }]);
        assert_eq!(jar.cookies_for_url("https://example.org/").len(), 1);
        assert!(!jar.was_cleared());
        jar.remove_all();
        assert!(jar.cookies_for_url("https://example.org/").is_empty());
        assert!(jar.was_cleared());
    }

    #[test]
    fn default_directive_requests_no_change() {
        let d = JarDirective::default();
        assert_eq!(d.enabled, None);
        assert!(!d.cleared);
        assert_eq!(serde_json::to_value(d).unwrap(), serde_json::json!({"cleared": false}));
    }
}
