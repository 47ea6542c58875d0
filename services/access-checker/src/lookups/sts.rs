//! AWS STS Cloud-Identity Lookup
//!
//! Resolves credentials for the configured profile the same way the AWS CLI
//! does (`~/.aws/config` and `~/.aws/credentials`, including `role_arn`,
//! `credential_process` and SSO profiles), then calls `GetCallerIdentity`
//! once per check.

use async_trait::async_trait;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_sdk_sts::config::Region;
use aws_sdk_sts::error::DisplayErrorContext;
use std::time::Duration;
use tracing::debug;

use super::CloudIdentityLookup;
use crate::config::AwsSettings;
use crate::error::CloudLookupError;
use crate::models::CloudProfile;

/// Live cloud-identity lookup against AWS STS
pub struct StsCloudLookup {
    settings: AwsSettings,
    timeout: Duration,
}

impl StsCloudLookup {
    pub fn new(settings: AwsSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }

    /// Shared config/credentials files, honouring explicit overrides
    fn profile_files(&self) -> EnvConfigFiles {
        let builder = EnvConfigFiles::builder();

        let builder = match &self.settings.config_file {
            Some(path) => builder.with_file(EnvConfigFileKind::Config, path.clone()),
            None => builder.include_default_config_file(true),
        };
        let builder = match &self.settings.shared_credentials_file {
            Some(path) => builder.with_file(EnvConfigFileKind::Credentials, path.clone()),
            None => builder.include_default_credentials_file(true),
        };

        builder.build()
    }

    async fn credentials(&self) -> Result<Credentials, CloudLookupError> {
        if let Some(keys) = &self.settings.static_credentials {
            return Ok(Credentials::new(
                keys.access_key_id.clone(),
                keys.secret_access_key.clone(),
                keys.session_token.clone(),
                None,
                "environment",
            ));
        }

        debug!("Resolving AWS profile '{}'", self.settings.profile);

        ProfileFileCredentialsProvider::builder()
            .profile_name(self.settings.profile.clone())
            .profile_files(self.profile_files())
            .build()
            .provide_credentials()
            .await
            .map_err(|e| CloudLookupError::ConfigLoadFailed(DisplayErrorContext(&e).to_string()))
    }

    async fn client(&self, credentials: Credentials) -> aws_sdk_sts::Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.settings.region.clone()))
            .profile_name(self.settings.profile.clone())
            .profile_files(self.profile_files())
            .credentials_provider(credentials)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(self.timeout)
                    .build(),
            );

        if let Some(endpoint) = &self.settings.sts_endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        aws_sdk_sts::Client::new(&loader.load().await)
    }
}

#[async_trait]
impl CloudIdentityLookup for StsCloudLookup {
    /// The caller identity belongs to the service's credentials, not to `email`
    async fn profile_info(&self, _email: &str) -> Result<CloudProfile, CloudLookupError> {
        let credentials = self.credentials().await?;
        let client = self.client(credentials).await;

        let identity = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| CloudLookupError::IdentityQueryFailed(DisplayErrorContext(&e).to_string()))?;

        let arn = identity.arn().ok_or_else(|| {
            CloudLookupError::IdentityQueryFailed("STS response has no Arn".to_string())
        })?;

        debug!("STS caller identity: {}", arn);

        Ok(CloudProfile {
            name: self.settings.profile.clone(),
            arn: arn.to_string(),
            account_id: identity.account().map(str::to_string),
        })
    }
}
