//! Service Configuration
//!
//! Every option is a CLI flag backed by an environment variable, so the
//! service can run from a `.env` file locally and from injected env in K8s.
//! Whether each collaborator runs live or mocked is decided here, once, at
//! startup.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// On-call access checker configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "access-checker")]
#[command(about = "On-call access checker (Okta groups + AWS identity)", long_about = None)]
#[command(version)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Okta org URL (e.g. https://example.okta.com)
    #[arg(long, env = "OKTA_HOST")]
    pub okta_host: Option<String>,

    /// Okta API token
    #[arg(long, env = "OKTA_TOKEN", hide_env_values = true)]
    pub okta_token: Option<String>,

    /// Okta group granting VPN access
    #[arg(long, env = "OKTA_VPN_GROUP", default_value = "VPN_Access")]
    pub okta_vpn_group: String,

    /// Okta group granting production access
    #[arg(long, env = "OKTA_PRODUCTION_GROUP", default_value = "Production_Access")]
    pub okta_production_group: String,

    /// Okta group granting config tool access
    #[arg(long, env = "OKTA_CONFIG_TOOL_GROUP", default_value = "Config_Tool_Access")]
    pub okta_config_tool_group: String,

    /// AWS region for STS
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub aws_region: String,

    /// Named AWS profile
    #[arg(long, env = "AWS_PROFILE")]
    pub aws_profile: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub aws_session_token: Option<String>,

    /// Shared config file (default: ~/.aws/config)
    #[arg(long, env = "AWS_CONFIG_FILE")]
    pub aws_config_file: Option<PathBuf>,

    /// Shared credentials file (default: ~/.aws/credentials)
    #[arg(long, env = "AWS_SHARED_CREDENTIALS_FILE")]
    pub aws_shared_credentials_file: Option<PathBuf>,

    /// Override the STS endpoint (default: the regional endpoint)
    #[arg(long, env = "AWS_STS_ENDPOINT")]
    pub sts_endpoint: Option<String>,

    /// Timeout for upstream HTTP calls, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Run both lookups in mock mode even when credentials are present
    #[arg(long, env = "FORCE_MOCK")]
    pub force_mock: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Whether a collaborator talks to its provider or to the mock table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupMode<T> {
    Mock,
    Live(T),
}

/// Okta group names checked for each access type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OktaGroups {
    pub vpn: String,
    pub production: String,
    pub config_tool: String,
}

/// Settings for the live Okta lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OktaSettings {
    pub host: String,
    pub token: String,
    pub groups: OktaGroups,
}

/// Access key pair taken straight from the environment
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Settings for the live STS lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: String,
    pub profile: String,
    /// Used instead of the profile when both key and secret are set
    pub static_credentials: Option<StaticCredentials>,
    pub config_file: Option<PathBuf>,
    pub shared_credentials_file: Option<PathBuf>,
    pub sts_endpoint: Option<String>,
}

const DEFAULT_AWS_PROFILE: &str = "default";

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Okta runs live only when both host and token are set
    pub fn okta(&self) -> LookupMode<OktaSettings> {
        if self.force_mock {
            return LookupMode::Mock;
        }

        match (non_empty(&self.okta_host), non_empty(&self.okta_token)) {
            (Some(host), Some(token)) => LookupMode::Live(OktaSettings {
                host: host.trim_end_matches('/').to_string(),
                token: token.to_string(),
                groups: OktaGroups {
                    vpn: self.okta_vpn_group.clone(),
                    production: self.okta_production_group.clone(),
                    config_tool: self.okta_config_tool_group.clone(),
                },
            }),
            _ => LookupMode::Mock,
        }
    }

    /// AWS runs mocked only when key, secret and profile are all absent
    pub fn aws(&self) -> LookupMode<AwsSettings> {
        let access_key_id = non_empty(&self.aws_access_key_id);
        let secret_access_key = non_empty(&self.aws_secret_access_key);
        let profile = non_empty(&self.aws_profile);

        if self.force_mock
            || (access_key_id.is_none() && secret_access_key.is_none() && profile.is_none())
        {
            return LookupMode::Mock;
        }

        let static_credentials = match (access_key_id, secret_access_key) {
            (Some(key), Some(secret)) => Some(StaticCredentials {
                access_key_id: key.to_string(),
                secret_access_key: secret.to_string(),
                session_token: non_empty(&self.aws_session_token).map(str::to_string),
            }),
            _ => None,
        };

        let sts_endpoint =
            non_empty(&self.sts_endpoint).map(|e| e.trim_end_matches('/').to_string());

        LookupMode::Live(AwsSettings {
            region: self.aws_region.clone(),
            profile: profile.unwrap_or(DEFAULT_AWS_PROFILE).to_string(),
            static_credentials,
            config_file: self.aws_config_file.clone(),
            shared_credentials_file: self.aws_shared_credentials_file.clone(),
            sts_endpoint,
        })
    }
}
