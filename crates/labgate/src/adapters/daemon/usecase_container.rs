use std::sync::Arc;

use crate::usecases::ports::{HealthProbe, MetricsSink};
use crate::usecases::{
    AdminAuthenticator, AdminLoginUseCaseImpl, AdminLogoutUseCaseImpl, AdmissionController,
    IssueTokenUseCaseImpl, RevokeTokenUseCaseImpl, SessionDeps, StatusUseCaseImpl, TokenStore,
};

/// Everything the HTTP and session handlers need, built once per daemon.
pub struct UseCaseContainer {
    pub status: StatusUseCaseImpl,
    pub admin: AdminUseCases,
    pub session_deps: SessionDeps,
    pub tokens: Arc<TokenStore>,
    pub admission: Arc<AdmissionController>,
    pub authenticator: Arc<AdminAuthenticator>,
    pub metrics: Arc<dyn MetricsSink>,
    pub health: Arc<dyn HealthProbe>,
}

pub struct AdminUseCases {
    pub login: AdminLoginUseCaseImpl,
    pub logout: AdminLogoutUseCaseImpl,
    pub issue_token: IssueTokenUseCaseImpl,
    pub revoke_token: RevokeTokenUseCaseImpl,
}
