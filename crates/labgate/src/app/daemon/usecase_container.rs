use std::sync::Arc;

use crate::adapters::daemon::usecase_container::{AdminUseCases, UseCaseContainer};
use crate::infra::daemon::{DaemonConfig, DaemonMetrics, OsEntropy, SystemClock};
use crate::usecases::ports::{Clock, Entropy, HealthProbe, MetricsSink};
use crate::usecases::{
    AdminAuthenticator, AdminCredential, AdminLoginUseCaseImpl, AdminLogoutUseCaseImpl,
    AdmissionController, IssueTokenUseCaseImpl, RevokeTokenUseCaseImpl, SessionDeps,
    StatusUseCaseImpl, TokenStore,
};

impl UseCaseContainer {
    pub fn new(
        config: &DaemonConfig,
        credential: AdminCredential,
        health: Arc<dyn HealthProbe>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let entropy: Arc<dyn Entropy> = Arc::new(OsEntropy);
        let metrics: Arc<dyn MetricsSink> = Arc::new(DaemonMetrics::new());

        let tokens = Arc::new(TokenStore::new(Arc::clone(&entropy), Arc::clone(&clock)));
        let admission = Arc::new(AdmissionController::new(config.max_sessions()));
        let authenticator = Arc::new(AdminAuthenticator::new(credential, entropy));

        Self {
            status: StatusUseCaseImpl::new(Arc::clone(&admission), Arc::clone(&health)),
            admin: AdminUseCases {
                login: AdminLoginUseCaseImpl::new(Arc::clone(&authenticator)),
                logout: AdminLogoutUseCaseImpl::new(Arc::clone(&authenticator)),
                issue_token: IssueTokenUseCaseImpl::new(
                    Arc::clone(&authenticator),
                    Arc::clone(&tokens),
                    Arc::clone(&metrics),
                ),
                revoke_token: RevokeTokenUseCaseImpl::new(
                    Arc::clone(&authenticator),
                    Arc::clone(&tokens),
                ),
            },
            session_deps: SessionDeps {
                tokens: Arc::clone(&tokens),
                admission: Arc::clone(&admission),
                clock,
                metrics: Arc::clone(&metrics),
                policy: config.session_policy(),
            },
            tokens,
            admission,
            authenticator,
            metrics,
            health,
        }
    }
}
