//! On-Call Access Checker
//!
//! Reports whether a user has the VPN, production and config tool access an
//! on-call engineer needs, by combining Okta group membership with the AWS
//! caller identity of the configured profile.
//!
//! ## Modes
//!
//! - **Live**: Okta Users API and AWS STS `GetCallerIdentity`
//! - **Mock**: a fixed table of known users, used whenever the provider
//!   credentials are absent (local development and tests)

pub mod api;
pub mod checker;
pub mod config;
pub mod error;
pub mod lookups;
pub mod models;

pub use api::{router, AppState};
pub use checker::AccessChecker;
pub use config::Config;
pub use error::{AccessCheckError, CloudLookupError, IdentityLookupError};
pub use lookups::{CloudIdentityLookup, IdentityGroupLookup, Lookups};
