//! Access Aggregator
//!
//! Runs one access check end to end:
//!
//! 1. Validate the request (no upstream call on bad input)
//! 2. Okta group membership
//! 3. AWS caller identity (always, regardless of environment)
//! 4. Merge into an [`AccessCheckResponse`] with missing groups and expiry
//!
//! Any lookup failure aborts the check; there are no retries.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AccessCheckError;
use crate::lookups::{CloudIdentityLookup, IdentityGroupLookup, Lookups};
use crate::models::{
    AccessCheckResponse, AccessRequest, AccessStatus, CloudProfile, PRODUCTION_ENVIRONMENT,
};

/// How long a production grant is reported valid for
pub const PRODUCTION_ACCESS_HOURS: i64 = 12;

/// Syntactic email check: one `@`, non-empty local part, dotted domain
pub fn validate_email(email: &str) -> Result<(), AccessCheckError> {
    let invalid = || AccessCheckError::Validation(format!("invalid email address: {:?}", email));

    if email.is_empty() {
        return Err(AccessCheckError::Validation("email is required".to_string()));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(invalid());
    }

    Ok(())
}

/// Merge lookup results into the response shape
pub fn build_report(
    status: AccessStatus,
    profile: CloudProfile,
    environment: &str,
    now: DateTime<Utc>,
) -> AccessCheckResponse {
    let valid_until = (status.production && environment == PRODUCTION_ENVIRONMENT).then(|| {
        (now + Duration::hours(PRODUCTION_ACCESS_HOURS)).to_rfc3339_opts(SecondsFormat::Secs, true)
    });

    AccessCheckResponse {
        vpn: status.vpn,
        production: status.production,
        config_tool: status.config_tool,
        current_profile: profile.name,
        profile_arn: profile.arn,
        missing_groups: status.missing_groups(),
        valid_until,
    }
}

/// Orchestrates the identity-group and cloud-identity lookups
#[derive(Clone)]
pub struct AccessChecker {
    identity: Arc<dyn IdentityGroupLookup>,
    cloud: Arc<dyn CloudIdentityLookup>,
}

impl AccessChecker {
    pub fn new(identity: Arc<dyn IdentityGroupLookup>, cloud: Arc<dyn CloudIdentityLookup>) -> Self {
        Self { identity, cloud }
    }

    pub fn from_lookups(lookups: Lookups) -> Self {
        Self::new(lookups.identity, lookups.cloud)
    }

    pub async fn check_access(
        &self,
        request: &AccessRequest,
    ) -> Result<AccessCheckResponse, AccessCheckError> {
        self.check_access_at(request, Utc::now()).await
    }

    /// Same as [`check_access`](Self::check_access) with an explicit clock
    pub async fn check_access_at(
        &self,
        request: &AccessRequest,
        now: DateTime<Utc>,
    ) -> Result<AccessCheckResponse, AccessCheckError> {
        let email = request.email.trim();
        let environment = request.environment.trim();

        validate_email(email)?;
        if environment.is_empty() {
            return Err(AccessCheckError::Validation(
                "environment is required".to_string(),
            ));
        }

        let status = self.identity.check_access(email).await.map_err(|e| {
            warn!("Identity group lookup failed for {}: {}", email, e);
            AccessCheckError::from(e)
        })?;

        let profile = self.cloud.profile_info(email).await.map_err(|e| {
            warn!("Cloud identity lookup failed for {}: {}", email, e);
            AccessCheckError::from(e)
        })?;

        let report = build_report(status, profile, environment, now);

        info!(
            email = %email,
            environment = %environment,
            missing = report.missing_groups.len(),
            "Access check complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CloudLookupError, IdentityLookupError};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and answers with a fixed status
    #[derive(Default)]
    struct CountingLookup {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl IdentityGroupLookup for CountingLookup {
        async fn check_access(&self, _email: &str) -> Result<AccessStatus, IdentityLookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(IdentityLookupError::MembershipQueryFailed {
                    group: "VPN".to_string(),
                    source: "connection reset".into(),
                });
            }
            Ok(AccessStatus::new(true, true, true))
        }
    }

    #[async_trait]
    impl CloudIdentityLookup for CountingLookup {
        async fn profile_info(&self, _email: &str) -> Result<CloudProfile, CloudLookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CloudLookupError::IdentityQueryFailed("expired token".to_string()));
            }
            Ok(CloudProfile {
                name: "ops".to_string(),
                arn: "arn:aws:iam::111111111111:user/ops".to_string(),
                account_id: None,
            })
        }
    }

    fn request(email: &str, environment: &str) -> AccessRequest {
        AccessRequest {
            email: email.to_string(),
            environment: environment.to_string(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_email() {
        for ok in ["user1@companya.com", "a.b+tag@sub.example.org", "x@y.io"] {
            assert!(validate_email(ok).is_ok(), "{ok}");
        }
        for bad in [
            "",
            "user1companya.com",
            "@companya.com",
            "user@",
            "user@localhost",
            "user@@companya.com",
            "a@b@c.com",
            "user@companya..com",
            "user@.com",
            "us er@companya.com",
        ] {
            assert!(
                matches!(validate_email(bad), Err(AccessCheckError::Validation(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_build_report_production_grant_has_expiry() {
        let report = build_report(
            AccessStatus::new(true, true, true),
            CloudProfile {
                name: "prod".to_string(),
                arn: "arn".to_string(),
                account_id: None,
            },
            "Production",
            fixed_now(),
        );

        assert!(report.missing_groups.is_empty());
        assert_eq!(report.valid_until.as_deref(), Some("2026-10-19T21:00:00Z"));
    }

    #[test]
    fn test_build_report_expiry_rules() {
        let profile = || CloudProfile {
            name: "p".to_string(),
            arn: String::new(),
            account_id: None,
        };

        // denied production
        let denied = build_report(AccessStatus::new(true, false, true), profile(), "Production", fixed_now());
        assert!(denied.valid_until.is_none());

        // non-production environment
        let staging = build_report(AccessStatus::new(true, true, true), profile(), "Staging", fixed_now());
        assert!(staging.valid_until.is_none());

        // exact match only
        let lowercase = build_report(AccessStatus::new(true, true, true), profile(), "production", fixed_now());
        assert!(lowercase.valid_until.is_none());
    }

    #[tokio::test]
    async fn test_mock_user1_production() {
        let checker = AccessChecker::from_lookups(Lookups::mock());
        let before = Utc::now();

        let report = checker
            .check_access(&request("user1@companya.com", "Production"))
            .await
            .unwrap();

        assert!(report.vpn && report.production && report.config_tool);
        assert!(report.missing_groups.is_empty());
        assert_eq!(report.current_profile, "prod");
        assert_eq!(report.profile_arn, "arn:aws:iam::123456789012:user/user1");

        let valid_until = DateTime::parse_from_rfc3339(report.valid_until.as_deref().unwrap())
            .unwrap()
            .with_timezone(&Utc);
        let expected = before + Duration::hours(PRODUCTION_ACCESS_HOURS);
        assert!((valid_until - expected).num_seconds().abs() <= 5);
    }

    #[tokio::test]
    async fn test_mock_user2_missing_groups() {
        let checker = AccessChecker::from_lookups(Lookups::mock());

        let report = checker
            .check_access(&request("user2@companyb.com", "Production"))
            .await
            .unwrap();

        assert!(report.vpn);
        assert!(!report.production);
        assert!(!report.config_tool);
        assert_eq!(report.missing_groups, vec!["Production", "Config Tool"]);
        assert!(report.valid_until.is_none());
        assert_eq!(report.current_profile, "dev");
    }

    #[tokio::test]
    async fn test_cloud_lookup_runs_outside_production() {
        let checker = AccessChecker::from_lookups(Lookups::mock());

        let report = checker
            .check_access(&request("user1@companya.com", "Staging"))
            .await
            .unwrap();

        assert_eq!(report.current_profile, "prod");
        assert!(report.valid_until.is_none());
    }

    #[tokio::test]
    async fn test_mock_unknown_user_is_upstream_error() {
        let checker = AccessChecker::from_lookups(Lookups::mock());

        let err = checker
            .check_access(&request("stranger@example.com", "Production"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AccessCheckError::Identity(IdentityLookupError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_skips_lookups() {
        let identity = Arc::new(CountingLookup::default());
        let cloud = Arc::new(CountingLookup::default());
        let checker = AccessChecker::new(identity.clone(), cloud.clone());

        for (email, environment) in [
            ("not-an-email", "Production"),
            ("", "Production"),
            ("user1@companya.com", "   "),
        ] {
            let err = checker
                .check_access_at(&request(email, environment), fixed_now())
                .await
                .unwrap_err();
            assert!(matches!(err, AccessCheckError::Validation(_)));
        }

        assert_eq!(identity.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cloud.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_identity_failure_short_circuits() {
        let identity = Arc::new(CountingLookup {
            fail: true,
            ..Default::default()
        });
        let cloud = Arc::new(CountingLookup::default());
        let checker = AccessChecker::new(identity.clone(), cloud.clone());

        let err = checker
            .check_access_at(&request("oncall@example.com", "Production"), fixed_now())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "failed to check VPN access: connection reset");
        assert_eq!(identity.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cloud.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cloud_failure_is_surfaced() {
        let identity = Arc::new(CountingLookup::default());
        let cloud = Arc::new(CountingLookup {
            fail: true,
            ..Default::default()
        });
        let checker = AccessChecker::new(identity, cloud);

        let err = checker
            .check_access_at(&request("oncall@example.com", "Production"), fixed_now())
            .await
            .unwrap_err();

        assert!(matches!(err, AccessCheckError::Cloud(_)));
        assert_eq!(err.to_string(), "failed to get AWS caller identity: expired token");
    }

    #[tokio::test]
    async fn test_email_is_trimmed_before_lookup() {
        let checker = AccessChecker::from_lookups(Lookups::mock());

        let report = checker
            .check_access_at(&request("  user2@companyb.com ", "Production"), fixed_now())
            .await
            .unwrap();
        assert_eq!(report.missing_groups, vec!["Production", "Config Tool"]);
    }
}
