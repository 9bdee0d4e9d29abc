use std::sync::Arc;

use crate::domain::{AccessToken, LabError};
use crate::usecases::admin::AdminAuthenticator;
use crate::usecases::ports::MetricsSink;
use crate::usecases::token_store::TokenStore;

pub trait AdminLoginUseCase: Send + Sync {
    fn execute(&self, username: &str, password: &str) -> Result<String, LabError>;
}

pub trait AdminLogoutUseCase: Send + Sync {
    fn execute(&self, admin_token: &str) -> bool;
}

pub trait IssueTokenUseCase: Send + Sync {
    fn execute(&self, admin_token: &str) -> Result<AccessToken, LabError>;
}

pub trait RevokeTokenUseCase: Send + Sync {
    /// `Ok(false)` when the token is unknown or already redeemed.
    fn execute(&self, admin_token: &str, token: &str) -> Result<bool, LabError>;
}

pub struct AdminLoginUseCaseImpl {
    admin: Arc<AdminAuthenticator>,
}

impl AdminLoginUseCaseImpl {
    pub fn new(admin: Arc<AdminAuthenticator>) -> Self {
        Self { admin }
    }
}

impl AdminLoginUseCase for AdminLoginUseCaseImpl {
    fn execute(&self, username: &str, password: &str) -> Result<String, LabError> {
        self.admin.login(username, password)
    }
}

pub struct AdminLogoutUseCaseImpl {
    admin: Arc<AdminAuthenticator>,
}

impl AdminLogoutUseCaseImpl {
    pub fn new(admin: Arc<AdminAuthenticator>) -> Self {
        Self { admin }
    }
}

impl AdminLogoutUseCase for AdminLogoutUseCaseImpl {
    fn execute(&self, admin_token: &str) -> bool {
        self.admin.logout(admin_token)
    }
}

pub struct IssueTokenUseCaseImpl {
    admin: Arc<AdminAuthenticator>,
    tokens: Arc<TokenStore>,
    metrics: Arc<dyn MetricsSink>,
}

impl IssueTokenUseCaseImpl {
    pub fn new(
        admin: Arc<AdminAuthenticator>,
        tokens: Arc<TokenStore>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            admin,
            tokens,
            metrics,
        }
    }
}

impl IssueTokenUseCase for IssueTokenUseCaseImpl {
    fn execute(&self, admin_token: &str) -> Result<AccessToken, LabError> {
        let grant = self.admin.verify(admin_token)?;
        let token = self.tokens.issue(&grant);
        self.metrics.token_issued();
        Ok(token)
    }
}

pub struct RevokeTokenUseCaseImpl {
    admin: Arc<AdminAuthenticator>,
    tokens: Arc<TokenStore>,
}

impl RevokeTokenUseCaseImpl {
    pub fn new(admin: Arc<AdminAuthenticator>, tokens: Arc<TokenStore>) -> Self {
        Self { admin, tokens }
    }
}

impl RevokeTokenUseCase for RevokeTokenUseCaseImpl {
    fn execute(&self, admin_token: &str, token: &str) -> Result<bool, LabError> {
        self.admin.verify(admin_token)?;
        Ok(self.tokens.revoke(token))
    }
}
