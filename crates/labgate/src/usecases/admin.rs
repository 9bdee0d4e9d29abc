use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use subtle::ConstantTimeEq;

use crate::common::mutex_lock_or_recover;
use crate::domain::LabError;
use crate::usecases::ports::Entropy;

const ADMIN_TOKEN_BYTES: usize = 16;

/// The administrator username/password pair for this process.
#[derive(Clone)]
pub struct AdminCredential {
    username: String,
    password: String,
}

impl AdminCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & pass_ok).into()
    }
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Proof that an admin token was verified. Only [`AdminAuthenticator::verify`] builds one.
#[derive(Debug)]
pub struct AdminGrant {
    _private: (),
}

#[cfg(test)]
impl AdminGrant {
    pub(crate) fn for_tests() -> Self {
        Self { _private: () }
    }
}

pub struct AdminAuthenticator {
    credential: AdminCredential,
    sessions: Mutex<HashSet<String>>,
    entropy: Arc<dyn Entropy>,
}

impl AdminAuthenticator {
    pub fn new(credential: AdminCredential, entropy: Arc<dyn Entropy>) -> Self {
        Self {
            credential,
            sessions: Mutex::new(HashSet::new()),
            entropy,
        }
    }

    /// Checks the credential and mints a fresh admin session token.
    pub fn login(&self, username: &str, password: &str) -> Result<String, LabError> {
        if !self.credential.matches(username, password) {
            return Err(LabError::Unauthorized);
        }
        let mut bytes = [0u8; ADMIN_TOKEN_BYTES];
        self.entropy.fill_bytes(&mut bytes);
        let token: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        mutex_lock_or_recover(&self.sessions).insert(token.clone());
        Ok(token)
    }

    pub fn verify(&self, admin_token: &str) -> Result<AdminGrant, LabError> {
        let admin_token = admin_token.trim();
        if admin_token.is_empty() || !mutex_lock_or_recover(&self.sessions).contains(admin_token) {
            return Err(LabError::Unauthorized);
        }
        Ok(AdminGrant { _private: () })
    }

    pub fn logout(&self, admin_token: &str) -> bool {
        mutex_lock_or_recover(&self.sessions).remove(admin_token.trim())
    }
}
