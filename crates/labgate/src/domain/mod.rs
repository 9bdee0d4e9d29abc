//! Domain layer: value types and business rules.

pub mod dispatch;
pub mod error;
pub mod events;
pub mod messages;
pub mod session_types;
pub mod status;
pub mod token;

pub use dispatch::{Control, Dispatch, DispatchContext, PROMPT, dispatch};
pub use error::LabError;
pub use events::{ClientEvent, ServerEvent};
pub use session_types::{EndReason, SessionId, SessionStatus};
pub use status::{CapacitySnapshot, ServiceState, StatusSnapshot};
pub use token::{AccessToken, TokenFormatError, TokenString};
