//! Mock lookups backed by a fixed table of known users
//!
//! Used for local development and tests when no Okta or AWS credentials are
//! configured.

use async_trait::async_trait;

use super::{CloudIdentityLookup, IdentityGroupLookup};
use crate::error::{CloudLookupError, IdentityLookupError};
use crate::models::{AccessStatus, CloudProfile};

/// A known user in the mock directory
#[derive(Debug, Clone, Copy)]
pub struct MockUser {
    pub email: &'static str,
    pub access: AccessStatus,
    pub profile_name: &'static str,
    pub profile_arn: &'static str,
}

pub const MOCK_USERS: &[MockUser] = &[
    MockUser {
        email: "user1@companya.com",
        access: AccessStatus::new(true, true, true),
        profile_name: "prod",
        profile_arn: "arn:aws:iam::123456789012:user/user1",
    },
    MockUser {
        email: "user2@companyb.com",
        access: AccessStatus::new(true, false, false),
        profile_name: "dev",
        profile_arn: "arn:aws:iam::123456789013:user/user2",
    },
];

const MOCK_PROFILE_NAME: &str = "mock-profile";
const MOCK_PROFILE_ARN: &str = "arn:aws:iam::123456789012:user/mock-user";
const MOCK_ACCOUNT_ID: &str = "123456789012";

fn find_user(email: &str) -> Option<&'static MockUser> {
    let email = email.trim();
    MOCK_USERS
        .iter()
        .find(|user| user.email.eq_ignore_ascii_case(email))
}

/// Account id segment of an IAM ARN (`arn:aws:iam::<account>:...`)
fn account_from_arn(arn: &str) -> Option<String> {
    arn.split(':')
        .nth(4)
        .filter(|account| !account.is_empty())
        .map(str::to_string)
}

/// Identity-group lookup over [`MOCK_USERS`]; unknown emails are not found
#[derive(Debug, Default)]
pub struct MockGroupLookup;

impl MockGroupLookup {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityGroupLookup for MockGroupLookup {
    async fn check_access(&self, email: &str) -> Result<AccessStatus, IdentityLookupError> {
        find_user(email)
            .map(|user| user.access)
            .ok_or_else(|| IdentityLookupError::UserNotFound(email.to_string()))
    }
}

/// Cloud-identity lookup over [`MOCK_USERS`], falling back to a fixed mock profile
#[derive(Debug, Default)]
pub struct MockCloudLookup;

impl MockCloudLookup {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CloudIdentityLookup for MockCloudLookup {
    async fn profile_info(&self, email: &str) -> Result<CloudProfile, CloudLookupError> {
        let profile = match find_user(email) {
            Some(user) => CloudProfile {
                name: user.profile_name.to_string(),
                arn: user.profile_arn.to_string(),
                account_id: account_from_arn(user.profile_arn),
            },
            None => CloudProfile {
                name: MOCK_PROFILE_NAME.to_string(),
                arn: MOCK_PROFILE_ARN.to_string(),
                account_id: Some(MOCK_ACCOUNT_ID.to_string()),
            },
        };

        Ok(profile)
    }
}
