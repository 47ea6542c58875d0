//! Access Check Types
//!
//! Request, lookup and response shapes for the access check endpoint.

use serde::{Deserialize, Serialize};

/// Environment name that makes a production grant carry an expiry
pub const PRODUCTION_ENVIRONMENT: &str = "Production";

/// Incoming access check request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub environment: String,
}

/// Group membership reported by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessStatus {
    pub vpn: bool,
    pub production: bool,
    pub config_tool: bool,
}

impl AccessStatus {
    pub const fn new(vpn: bool, production: bool, config_tool: bool) -> Self {
        Self {
            vpn,
            production,
            config_tool,
        }
    }

    /// Labels of the groups the user is not in, in report order
    pub fn missing_groups(&self) -> Vec<String> {
        AccessGroup::ALL
            .iter()
            .filter(|group| !self.has(**group))
            .map(|group| group.label().to_string())
            .collect()
    }

    pub fn has(&self, group: AccessGroup) -> bool {
        match group {
            AccessGroup::Vpn => self.vpn,
            AccessGroup::Production => self.production,
            AccessGroup::ConfigTool => self.config_tool,
        }
    }
}

/// One of the three groups an on-call engineer needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessGroup {
    Vpn,
    Production,
    ConfigTool,
}

impl AccessGroup {
    /// Fixed order used for `missingGroups`
    pub const ALL: [AccessGroup; 3] = [
        AccessGroup::Vpn,
        AccessGroup::Production,
        AccessGroup::ConfigTool,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AccessGroup::Vpn => "VPN",
            AccessGroup::Production => "Production",
            AccessGroup::ConfigTool => "Config Tool",
        }
    }
}

impl std::fmt::Display for AccessGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Cloud account identity the service's credentials map to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProfile {
    pub name: String,
    pub arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// Consolidated access report returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResponse {
    pub vpn: bool,
    pub production: bool,
    pub config_tool: bool,
    pub current_profile: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub profile_arn: String,
    pub missing_groups: Vec<String>,
    /// RFC 3339 expiry of a production grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

/// Error body for 4xx/5xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
