pub use self::error::ActionError;
#[cfg(test)]
pub use self::error::{GENERIC_FAILURE_MESSAGE, PERMISSION_DENIED_MESSAGE};
pub use self::payload::ActionPayload;
pub use self::service::ActionService;

pub mod callback;
mod error;
pub mod identity;
pub mod payload;
pub mod permission;
pub mod reply;
pub mod router;
mod service;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;
