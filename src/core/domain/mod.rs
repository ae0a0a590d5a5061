//! Domain types.

mod project;
mod secrets;
mod user;

pub use project::{Project, ProjectId};
pub use secrets::{PerUserSecrets, UserSecrets};
pub use user::User;
