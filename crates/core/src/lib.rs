//! Domain models, configuration, and error definitions.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ClientConfig, OAuthConfig, RefreshPolicy};
pub use error::{RuleSwitchError, RuleSwitchResult};
pub use types::{BulkToggleReport, Credentials, Session, ToggleOutcome, ValidationRule};
