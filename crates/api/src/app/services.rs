//! Token store selection, lifecycle and credential verifier construction.

use std::sync::Arc;

use anyhow::Context;

use campus_auth::{
    ClaimsCodec, InMemoryCredentialVerifier, InMemoryTokenStore, Role, StoreError, SubjectId,
    TokenLifecycle, TokenStore,
};
use campus_infra::AppConfig;

/// Build the lifecycle from configuration.
///
/// `USE_PERSISTENT_STORES=true` selects Redis when the `redis` feature is
/// compiled in; otherwise the in-memory store is used.
pub fn build_lifecycle(config: &AppConfig) -> Result<Arc<TokenLifecycle>, StoreError> {
    let store = build_token_store(config)?;
    Ok(Arc::new(TokenLifecycle::new(
        ClaimsCodec::new(&config.jwt_secret),
        store,
    )))
}

pub fn build_token_store(config: &AppConfig) -> Result<Arc<dyn TokenStore>, StoreError> {
    if config.use_persistent_stores {
        #[cfg(feature = "redis")]
        {
            tracing::info!(redis_url = %config.redis_url, "using redis token store");
            let store = campus_infra::token_store::RedisTokenStore::new(
                &config.redis_url,
                config.redis_timeout,
            )?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "redis"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but redis feature not enabled, falling back to in-memory"
            );
        }
    }

    tracing::info!("using in-memory token store");
    Ok(Arc::new(InMemoryTokenStore::new()))
}

/// Account table for `/auth/login`.
///
/// Only the bootstrap super-admin (if configured) is seeded; the admin's
/// identifier doubles as its subject id.
pub fn build_credential_verifier(
    config: &AppConfig,
) -> anyhow::Result<Arc<InMemoryCredentialVerifier>> {
    let verifier = InMemoryCredentialVerifier::new();

    match &config.bootstrap_admin {
        Some(admin) => {
            let subject = SubjectId::new(admin.identifier.clone())
                .context("bootstrap admin identifier")?;
            verifier
                .add_account(&admin.identifier, &admin.password, subject, Role::SuperAdmin)
                .context("seeding bootstrap admin")?;
            tracing::info!(identifier = %admin.identifier, "bootstrap super-admin seeded");
        }
        None => tracing::warn!("no bootstrap admin configured; login has no accounts"),
    }

    Ok(Arc::new(verifier))
}

#[cfg(test)]
mod tests {
    use campus_auth::{CredentialError, CredentialVerifier, Credentials, IdentityNamespace};

    use super::*;

    fn config(use_persistent_stores: bool) -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret".to_string()),
            "USE_PERSISTENT_STORES" => Some(use_persistent_stores.to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn in_memory_lifecycle_issues_and_verifies() {
        let lifecycle = build_lifecycle(&config(false)).unwrap();
        let subject = SubjectId::new("u1").unwrap();

        let pair = lifecycle.issue_pair(&subject, Role::Lecturer).unwrap();
        let principal = lifecycle.verify_access(&pair.access_token).unwrap();
        assert_eq!(principal.role, Role::Lecturer);
    }

    #[test]
    fn bootstrap_admin_can_log_in() {
        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret".to_string()),
            "BOOTSTRAP_ADMIN_IDENTIFIER" => Some("root@campus.test".to_string()),
            "BOOTSTRAP_ADMIN_PASSWORD" => Some("hunter2".to_string()),
            _ => None,
        })
        .unwrap();
        let verifier = build_credential_verifier(&config).unwrap();

        let mut creds = Credentials {
            namespace: IdentityNamespace::Admin,
            identifier: "root@campus.test".to_string(),
            secret: "hunter2".to_string(),
        };
        let (subject, role) = verifier.verify(&creds).unwrap();
        assert_eq!(subject.as_str(), "root@campus.test");
        assert_eq!(role, Role::SuperAdmin);

        creds.secret = "wrong".to_string();
        assert_eq!(verifier.verify(&creds), Err(CredentialError::InvalidCredentials));
    }

    #[test]
    fn no_bootstrap_admin_means_no_accounts() {
        let verifier = build_credential_verifier(&config(false)).unwrap();
        let creds = Credentials {
            namespace: IdentityNamespace::Admin,
            identifier: "root@campus.test".to_string(),
            secret: "hunter2".to_string(),
        };
        assert_eq!(verifier.verify(&creds), Err(CredentialError::InvalidCredentials));
    }

    #[cfg(not(feature = "redis"))]
    #[test]
    fn persistent_request_without_redis_feature_falls_back() {
        assert!(build_lifecycle(&config(true)).is_ok());
    }
}
