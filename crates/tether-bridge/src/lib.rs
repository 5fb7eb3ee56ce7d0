pub mod hooks;
pub mod jar;
pub mod state;

mod dispatch;
mod parse;

// Re-export public API (CLI consumers)
pub use dispatch::{hook_entrypoint_from_stdin, HookResult};
pub use hooks::{run_hook, Hook, HookCall, HookPhase};
pub use jar::{CookieJar, EnvelopeJar, JarCookie, JarDirective};
pub use parse::{HookEnvelope, HookReply};
pub use state::{keys, RunState, RunVars};
