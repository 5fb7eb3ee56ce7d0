//! Named hooks the engine can call before a request or after a response.

use anyhow::{bail, Context};
use rand::Rng;
use tether_core::{
    cookies_from_response, Catalog, Config, CorrelateError, CredentialMode, LifecycleState,
    RequestDescriptor, ResponseDescriptor, SessionState, Snapshot,
};

use crate::jar::{CookieJar, JarDirective};
use crate::state::{get_str, keys, read_var, RunState, RunVars};

// ── Hook names ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    BeforeRequest,
    AfterResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    InjectCredentials,
    DisableCookieJar,
    UpdateSession,
    CaptureBaseline,
    ConfirmSpawn,
    ConfirmDelete,
    CaptureCatalog,
    PickRandomApp,
}

impl Hook {
    pub const ALL: &'static [Hook] = &[
        Hook::InjectCredentials,
        Hook::DisableCookieJar,
        Hook::UpdateSession,
        Hook::CaptureBaseline,
        Hook::ConfirmSpawn,
        Hook::ConfirmDelete,
        Hook::CaptureCatalog,
        Hook::PickRandomApp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Hook::InjectCredentials => "inject_credentials",
            Hook::DisableCookieJar => "disable_cookie_jar",
            Hook::UpdateSession => "update_session",
            Hook::CaptureBaseline => "capture_baseline",
            Hook::ConfirmSpawn => "confirm_spawn",
            Hook::ConfirmDelete => "confirm_delete",
            Hook::CaptureCatalog => "capture_catalog",
            Hook::PickRandomApp => "pick_random_app",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|h| h.name() == name)
    }

    pub fn phase(self) -> HookPhase {
        match self {
            Hook::InjectCredentials | Hook::DisableCookieJar => HookPhase::BeforeRequest,
            _ => HookPhase::AfterResponse,
        }
    }
}

// ── Hook call ──

/// Inputs and outputs of one hook invocation.
pub struct HookCall<'a> {
    pub config: &'a Config,
    pub request: &'a mut RequestDescriptor,
    pub response: Option<&'a ResponseDescriptor>,
    pub vars: &'a mut RunVars,
    pub jar: Option<&'a mut dyn CookieJar>,
    pub directive: JarDirective,
}

/// Load run state from the variables, run `hook`, and store the state back.
///
/// On error the variables are left as they were.
pub fn run_hook<R: Rng + ?Sized>(hook: Hook, call: &mut HookCall<'_>, rng: &mut R) -> anyhow::Result<()> {
    let mut state = RunState::load(call.vars)?;
    let jar = call.jar.as_mut().map(|j| &mut **j as &mut dyn CookieJar);

    match hook.phase() {
        HookPhase::BeforeRequest => match hook {
            Hook::InjectCredentials => inject_credentials(
                call.config,
                &state.session,
                call.request,
                jar,
                &mut call.directive,
            )?,
            Hook::DisableCookieJar => {
                disable_cookie_jar(&call.request.url, jar, &mut call.directive)
            }
            _ => unreachable!("after-response hook in before-request phase"),
        },
        HookPhase::AfterResponse => {
            let response = call
                .response
                .with_context(|| format!("hook {} needs a response", hook.name()))?;
            match hook {
                Hook::UpdateSession => update_session(call.config, &mut state.session, response),
                Hook::CaptureBaseline => capture_baseline(call.config, &mut state, response)?,
                Hook::ConfirmSpawn => confirm_spawn(call.config, &mut state, response, call.vars)?,
                Hook::ConfirmDelete => confirm_delete(call.config, &mut state, response)?,
                Hook::CaptureCatalog => capture_catalog(call.config, response, call.vars)?,
                Hook::PickRandomApp => pick_random_app(call.config, call.vars, rng)?,
                _ => unreachable!("before-request hook in after-response phase"),
            }
        }
    }

    // Once off, the jar stays off for the rest of the run.
    if call.directive.enabled == Some(false)
        || call.config.credentials.mode == CredentialMode::ExplicitCookie
    {
        state.jar_disabled = true;
    }
    if state.jar_disabled {
        call.directive.enabled = Some(false);
    }

    state.store(call.vars)
}

// ── Before request ──

/// Attach credentials to an outbound request.
///
/// In explicit-cookie mode the engine jar is disabled and cleared, and the
/// session travels in a hand-built `Cookie` header. A request that fails the
/// CSRF check leaves the request and the jar untouched.
pub fn inject_credentials(
    config: &Config,
    session: &SessionState,
    request: &mut RequestDescriptor,
    jar: Option<&mut dyn CookieJar>,
    directive: &mut JarDirective,
) -> Result<(), CorrelateError> {
    let creds = &config.credentials;
    session.inject(request, creds)?;
    if creds.mode == CredentialMode::ExplicitCookie {
        disable_cookie_jar(&request.url, jar, directive);
        if let Some(cookie) = session.cookie_header(creds) {
            request
                .headers
                .retain(|name, _| !name.eq_ignore_ascii_case("cookie"));
            request.headers.insert("Cookie".into(), cookie);
        }
    }
    tracing::debug!(method = %request.method, url = %request.url, "credentials injected");
    Ok(())
}

/// Turn the engine jar off and drop whatever it holds.
pub fn disable_cookie_jar(url: &str, jar: Option<&mut dyn CookieJar>, directive: &mut JarDirective) {
    directive.enabled = Some(false);
    if let Some(jar) = jar {
        let stale = jar.cookies_for_url(url);
        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "clearing engine cookie jar");
        }
        jar.remove_all();
        directive.cleared = true;
    }
}

// ── After response ──

pub fn update_session(config: &Config, session: &mut SessionState, response: &ResponseDescriptor) {
    let cookies = cookies_from_response(response);
    session.update(&cookies, &config.credentials);
}

pub fn capture_baseline(
    config: &Config,
    state: &mut RunState,
    response: &ResponseDescriptor,
) -> Result<(), CorrelateError> {
    state
        .lifecycle
        .ensure_transition("capture_baseline", LifecycleState::BaselineCaptured)?;
    let snapshot = Snapshot::parse(&response.body, &config.listing.id_field)?;
    tracing::info!(count = snapshot.len(), "baseline captured");
    state.lifecycle.capture_baseline(snapshot)
}

pub fn confirm_spawn(
    config: &Config,
    state: &mut RunState,
    response: &ResponseDescriptor,
    vars: &RunVars,
) -> Result<(), CorrelateError> {
    state
        .lifecycle
        .ensure_transition("confirm_spawn", LifecycleState::SpawnConfirmed)?;
    let listing = &config.listing;
    let target = get_str(vars, &listing.target_id_var);
    if listing.require_target_id && target.is_none() {
        return Err(CorrelateError::MissingTargetId(listing.target_id_var.clone()));
    }
    let snapshot = Snapshot::parse(&response.body, &listing.id_field)?;
    state.lifecycle.confirm_spawn(snapshot, target)?;
    Ok(())
}

pub fn confirm_delete(
    config: &Config,
    state: &mut RunState,
    response: &ResponseDescriptor,
) -> Result<(), CorrelateError> {
    state
        .lifecycle
        .ensure_transition("confirm_delete", LifecycleState::DeleteConfirmed)?;
    let snapshot = Snapshot::parse(&response.body, &config.listing.id_field)?;
    state.lifecycle.confirm_delete(snapshot)
}

/// Validate the available-apps body and keep it under `available_apps`.
pub fn capture_catalog(
    config: &Config,
    response: &ResponseDescriptor,
    vars: &mut RunVars,
) -> anyhow::Result<()> {
    let catalog = Catalog::parse(&response.body, &config.catalog.id_field)?;
    tracing::debug!(count = catalog.len(), "catalog captured");
    // Already validated by Catalog::parse.
    let raw: serde_json::Value = serde_json::from_str(&response.body)?;
    vars.insert(keys::AVAILABLE_APPS.into(), raw);
    Ok(())
}

/// Pick one entry of `available_apps` into `random_app`.
pub fn pick_random_app<R: Rng + ?Sized>(
    config: &Config,
    vars: &mut RunVars,
    rng: &mut R,
) -> anyhow::Result<()> {
    let Some(raw) = read_var::<serde_json::Value>(vars, keys::AVAILABLE_APPS)? else {
        bail!(
            "run variable '{}' is not set; capture the catalog first",
            keys::AVAILABLE_APPS
        );
    };
    let catalog = Catalog::from_value(raw.clone(), &config.catalog.id_field).map_err(|reason| {
        CorrelateError::ParseFailure {
            reason,
            body: raw.to_string(),
        }
    })?;
    let entry = catalog.pick_random(rng)?;
    tracing::info!(app_id = %entry.app_id, "random app picked");

    let mut picked = entry.attrs.clone();
    picked
        .entry(config.catalog.id_field.clone())
        .or_insert_with(|| entry.app_id.clone().into());
    vars.insert(keys::RANDOM_APP.into(), serde_json::Value::Object(picked));
    Ok(())
}
