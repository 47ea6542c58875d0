//! Access Lookups
//!
//! Trait-based seams for the two upstream collaborators:
//!
//! - **Identity groups**: Okta group membership for VPN, production and config tool
//! - **Cloud identity**: AWS STS caller identity for the configured profile
//!
//! Each seam has a live and a mock implementation. Which one runs is decided
//! once at startup from [`Config`]; the aggregator only sees the trait objects.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, LookupMode};
use crate::error::{CloudLookupError, IdentityLookupError};
use crate::models::{AccessStatus, CloudProfile};

pub mod mock;
pub mod okta;
pub mod sts;

pub use mock::{MockCloudLookup, MockGroupLookup};
pub use okta::{OktaApiError, OktaGroupLookup};
pub use sts::StsCloudLookup;

/// Answers "is this user in the VPN, production and config tool groups"
#[async_trait]
pub trait IdentityGroupLookup: Send + Sync {
    async fn check_access(&self, email: &str) -> Result<AccessStatus, IdentityLookupError>;
}

/// Answers "which cloud account identity do our credentials map to"
#[async_trait]
pub trait CloudIdentityLookup: Send + Sync {
    async fn profile_info(&self, email: &str) -> Result<CloudProfile, CloudLookupError>;
}

/// The pair of collaborators handed to the aggregator
#[derive(Clone)]
pub struct Lookups {
    pub identity: Arc<dyn IdentityGroupLookup>,
    pub cloud: Arc<dyn CloudIdentityLookup>,
}

impl Lookups {
    /// Both collaborators backed by the mock user table
    pub fn mock() -> Self {
        Self {
            identity: Arc::new(MockGroupLookup::new()),
            cloud: Arc::new(MockCloudLookup::new()),
        }
    }
}

/// Build the HTTP client for the Okta lookup
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("oncall-access-checker/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Construct the configured collaborators
pub fn build(config: &Config) -> Result<Lookups> {
    let identity: Arc<dyn IdentityGroupLookup> = match config.okta() {
        LookupMode::Live(settings) => {
            info!("Okta group lookup enabled (host: {})", settings.host);
            let client = http_client(config.http_timeout())?;
            Arc::new(OktaGroupLookup::new(client, settings))
        }
        LookupMode::Mock => {
            warn!("Running in Okta mock mode - no credentials provided");
            Arc::new(MockGroupLookup::new())
        }
    };

    let cloud: Arc<dyn CloudIdentityLookup> = match config.aws() {
        LookupMode::Live(settings) => {
            info!(
                "AWS identity lookup enabled (profile: {}, region: {})",
                settings.profile, settings.region
            );
            Arc::new(StsCloudLookup::new(settings, config.http_timeout()))
        }
        LookupMode::Mock => {
            warn!("Running in AWS mock mode - no credentials provided");
            Arc::new(MockCloudLookup::new())
        }
    };

    Ok(Lookups { identity, cloud })
}
