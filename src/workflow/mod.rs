pub mod confirm;
pub mod session;

pub use confirm::{Confirm, StdinConfirm};
pub use session::Session;
