pub mod catalog;
pub mod config;
pub mod cookie;
pub mod error;
pub mod lifecycle;
pub mod session;
pub mod snapshot;
pub mod types;

pub use catalog::{AppEntry, Catalog};
pub use config::{CatalogConfig, Config, CredentialConfig, CredentialMode, ListingConfig};
pub use cookie::{cookies_from_response, parse_set_cookies, CookieMap};
pub use error::{CorrelateError, Result};
pub use lifecycle::{LifecycleState, LifecycleTracker, TrackedResource};
pub use session::{is_safe_method, SessionState};
pub use snapshot::{ResourceRecord, Snapshot};
pub use types::*;
