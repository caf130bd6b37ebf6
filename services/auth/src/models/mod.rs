//! Authentication service models

pub mod session;
pub mod user;

// Re-export for convenience
pub use session::Session;
pub use user::{NewUser, User, UserAccount};
