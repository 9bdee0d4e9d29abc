mod admin;
mod admission;
mod session;
mod status;
mod token_store;
mod tokens;

pub use admin::{AdminAuthenticator, AdminCredential, AdminGrant};
pub use admission::{AdmissionController, DEFAULT_MAX_SESSIONS, SessionLease};
pub use session::{
    DEFAULT_AUTH_TIMEOUT, DEFAULT_GRACE_PERIOD, DEFAULT_SESSION_DURATION, Session, SessionDeps,
    SessionPolicy,
};
pub use status::{StatusUseCase, StatusUseCaseImpl};
pub use token_store::TokenStore;
pub use tokens::{
    AdminLoginUseCase, AdminLoginUseCaseImpl, AdminLogoutUseCase, AdminLogoutUseCaseImpl,
    IssueTokenUseCase, IssueTokenUseCaseImpl, RevokeTokenUseCase, RevokeTokenUseCaseImpl,
};
pub mod ports;
