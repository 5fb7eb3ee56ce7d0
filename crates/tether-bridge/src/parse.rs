use serde::{Deserialize, Serialize};
use tether_core::{RequestDescriptor, ResponseDescriptor};

use crate::jar::{JarCookie, JarDirective};
use crate::state::RunVars;

// ── HookEnvelope ──

/// What the engine writes to stdin for one hook call.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HookEnvelope {
    #[serde(alias = "hookName")]
    pub hook: String,
    #[serde(default, alias = "requestParams")]
    pub request: RequestDescriptor,
    #[serde(default)]
    pub response: Option<ResponseDescriptor>,
    #[serde(default)]
    pub vars: RunVars,
    /// Engine jar contents for the request URL, if the engine keeps one.
    #[serde(default)]
    pub cookies: Option<Vec<JarCookie>>,
}

// ── HookReply ──

/// What goes back to the engine on stdout when the step may continue.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HookReply {
    pub request: RequestDescriptor,
    pub vars: RunVars,
    pub cookie_jar: JarDirective,
}

/// Parse the stdin JSON of one hook call.
pub(crate) fn parse_hook_stdin(stdin: &str) -> anyhow::Result<HookEnvelope> {
    let envelope: HookEnvelope = serde_json::from_str(stdin)?;
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_envelope() {
        let env = parse_hook_stdin(r#"{"hook":"update_session","request":{"method":"GET"}}"#).unwrap();
        assert_eq!(env.hook, "update_session");
        assert_eq!(env.request.method, "GET");
        assert!(env.response.is_none());
        assert!(env.vars.is_empty());
        assert!(env.cookies.is_none());
    }

    #[test]
    fn camel_case_aliases() {
        let env = parse_hook_stdin(
            r#"{"hookName":"inject_credentials","requestParams":{"method":"POST","url":"/x"}}"#,
        )
        .unwrap();
        assert_eq!(env.hook, "inject_credentials");
        assert_eq!(env.request.url, "/x");
    }

    #[test]
    fn missing_hook_name_is_error() {
        assert!(parse_hook_stdin(r#"{"request":{"method":"GET"}}"#).is_err());
    }
}
