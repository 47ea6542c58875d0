//! Okta Group Lookup
//!
//! Resolves a user by login and checks membership of the three on-call
//! groups using the Okta Users API (`SSWS` token auth).

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::IdentityGroupLookup;
use crate::config::OktaSettings;
use crate::error::IdentityLookupError;
use crate::models::{AccessGroup, AccessStatus};

/// Failure talking to the Okta API
#[derive(Debug, Error)]
pub enum OktaApiError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("Okta returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Deserialize)]
struct OktaUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OktaGroup {
    profile: OktaGroupProfile,
}

#[derive(Debug, Deserialize)]
struct OktaGroupProfile {
    name: String,
}

/// Live identity-group lookup against an Okta org
pub struct OktaGroupLookup {
    client: Client,
    settings: OktaSettings,
}

impl OktaGroupLookup {
    pub fn new(client: Client, settings: OktaSettings) -> Self {
        Self { client, settings }
    }

    fn group_name(&self, group: AccessGroup) -> &str {
        match group {
            AccessGroup::Vpn => &self.settings.groups.vpn,
            AccessGroup::Production => &self.settings.groups.production,
            AccessGroup::ConfigTool => &self.settings.groups.config_tool,
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, OktaApiError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("SSWS {}", self.settings.token))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OktaApiError::Status { status, body });
        }

        Ok(response.json().await?)
    }

    async fn find_user(&self, email: &str) -> Result<OktaUser, IdentityLookupError> {
        let url = format!(
            "{}/api/v1/users/{}",
            self.settings.host,
            urlencoding::encode(email)
        );

        self.get(&url)
            .await
            .map_err(|e| IdentityLookupError::UserLookupFailed {
                email: email.to_string(),
                source: e.into(),
            })
    }

    async fn is_member(&self, user_id: &str, group: AccessGroup) -> Result<bool, IdentityLookupError> {
        let group_name = self.group_name(group);
        let url = format!(
            "{}/api/v1/users/{}/groups",
            self.settings.host,
            urlencoding::encode(user_id)
        );

        let groups: Vec<OktaGroup> =
            self.get(&url)
                .await
                .map_err(|e| IdentityLookupError::MembershipQueryFailed {
                    group: group.label().to_string(),
                    source: e.into(),
                })?;

        let member = groups.iter().any(|g| g.profile.name == group_name);
        debug!("Okta membership {} -> {}: {}", user_id, group_name, member);
        Ok(member)
    }
}

#[async_trait]
impl IdentityGroupLookup for OktaGroupLookup {
    async fn check_access(&self, email: &str) -> Result<AccessStatus, IdentityLookupError> {
        let user = self.find_user(email).await?;

        let vpn = self.is_member(&user.id, AccessGroup::Vpn).await?;
        let production = self.is_member(&user.id, AccessGroup::Production).await?;
        let config_tool = self.is_member(&user.id, AccessGroup::ConfigTool).await?;

        Ok(AccessStatus::new(vpn, production, config_tool))
    }
}
