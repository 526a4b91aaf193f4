//! Credential verification seam.
//!
//! Hashing and account persistence live outside this crate. A verifier turns
//! submitted credentials into the `(subject, role)` the lifecycle issues a
//! pair for.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::{IdentityNamespace, Role, SubjectId};

/// Submitted login credentials. `secret` is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub namespace: IdentityNamespace,
    pub identifier: String,
    pub secret: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("namespace", &self.namespace)
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Unknown identifier or wrong secret; the two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is deactivated")]
    Deactivated,

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credentials: &Credentials) -> Result<(SubjectId, Role), CredentialError>;
}

impl<V> CredentialVerifier for Arc<V>
where
    V: CredentialVerifier + ?Sized,
{
    fn verify(&self, credentials: &Credentials) -> Result<(SubjectId, Role), CredentialError> {
        (**self).verify(credentials)
    }
}

#[derive(Debug, Clone)]
struct Account {
    secret: String,
    subject: SubjectId,
    role: Role,
    active: bool,
}

/// In-memory account table for tests/dev and the bootstrap administrator.
///
/// Accounts are keyed by `(namespace, identifier)`; the namespace follows
/// from the account's role.
#[derive(Debug, Default)]
pub struct InMemoryCredentialVerifier {
    accounts: RwLock<HashMap<(IdentityNamespace, String), Account>>,
}

impl InMemoryCredentialVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account.
    pub fn add_account(
        &self,
        identifier: impl Into<String>,
        secret: impl Into<String>,
        subject: SubjectId,
        role: Role,
    ) -> Result<(), CredentialError> {
        let mut accounts = self.write()?;
        accounts.insert(
            (role.namespace(), identifier.into()),
            Account {
                secret: secret.into(),
                subject,
                role,
                active: true,
            },
        );
        Ok(())
    }

    /// Returns false when no such account exists.
    pub fn deactivate(
        &self,
        namespace: IdentityNamespace,
        identifier: &str,
    ) -> Result<bool, CredentialError> {
        let mut accounts = self.write()?;
        Ok(match accounts.get_mut(&(namespace, identifier.to_string())) {
            Some(account) => {
                account.active = false;
                true
            }
            None => false,
        })
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<(IdentityNamespace, String), Account>>, CredentialError>
    {
        self.accounts
            .write()
            .map_err(|_| CredentialError::Unavailable("lock poisoned".to_string()))
    }
}

impl CredentialVerifier for InMemoryCredentialVerifier {
    fn verify(&self, credentials: &Credentials) -> Result<(SubjectId, Role), CredentialError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| CredentialError::Unavailable("lock poisoned".to_string()))?;

        let account = accounts
            .get(&(credentials.namespace, credentials.identifier.clone()))
            .ok_or(CredentialError::InvalidCredentials)?;

        if !secrets_match(account.secret.as_bytes(), credentials.secret.as_bytes()) {
            return Err(CredentialError::InvalidCredentials);
        }
        if !account.active {
            return Err(CredentialError::Deactivated);
        }

        Ok((account.subject.clone(), account.role))
    }
}

/// Comparison time does not depend on where the inputs first differ.
fn secrets_match(stored: &[u8], submitted: &[u8]) -> bool {
    if stored.len() != submitted.len() {
        return false;
    }
    stored
        .iter()
        .zip(submitted)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
