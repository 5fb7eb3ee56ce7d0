use anyhow::Context;
use tether_core::Config;

use crate::hooks::{run_hook, Hook, HookCall};
use crate::jar::{CookieJar, EnvelopeJar};
use crate::parse::{parse_hook_stdin, HookReply};

// ── Hook Result ──

/// Result from a hook dispatch.
///
/// - `stdout`: JSON [`HookReply`] for the engine (step continues, exit 0)
/// - `stderr`: failure message (engine aborts the step, exit 1)
#[derive(Debug, Default, Clone)]
pub struct HookResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl HookResult {
    /// Construct a result with stdout only (step continues).
    pub fn output(stdout: String) -> Self {
        Self {
            stdout: Some(stdout),
            stderr: None,
        }
    }

    /// Construct an abort result carrying the failure message.
    pub fn abort(msg: String) -> Self {
        Self {
            stdout: None,
            stderr: Some(msg),
        }
    }

    /// Construct an empty result (no output, exit 0).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_abort(&self) -> bool {
        self.stderr.is_some()
    }
}

// ── Hook dispatch ──

/// Main hook entrypoint: parse stdin, run the named hook, render the reply.
///
/// Hook failures come back as [`HookResult::abort`]; `Err` means the envelope
/// itself was unusable.
pub fn hook_entrypoint_from_stdin(stdin: &str, config: &Config) -> anyhow::Result<HookResult> {
    if stdin.trim().is_empty() {
        return Ok(HookResult::empty());
    }
    let envelope = parse_hook_stdin(stdin).context("invalid hook envelope")?;
    let hook = Hook::from_name(&envelope.hook)
        .with_context(|| format!("unknown hook \"{}\"", envelope.hook))?;

    let mut request = envelope.request;
    let mut vars = envelope.vars;
    let mut jar = envelope.cookies.map(EnvelopeJar::new);

    let span = tracing::debug_span!("hook", name = hook.name(), url = %request.url);
    let _enter = span.enter();

    let mut call = HookCall {
        config,
        request: &mut request,
        response: envelope.response.as_ref(),
        vars: &mut vars,
        jar: jar.as_mut().map(|j| j as &mut dyn CookieJar),
        directive: Default::default(),
    };
    if let Err(e) = run_hook(hook, &mut call, &mut rand::thread_rng()) {
        tracing::warn!(error = %format!("{e:#}"), "hook aborted step");
        return Ok(HookResult::abort(format!("{}: {e:#}", hook.name())));
    }
    let cookie_jar = call.directive;

    let reply = HookReply {
        request,
        vars,
        cookie_jar,
    };
    Ok(HookResult::output(serde_json::to_string(&reply)?))
}
