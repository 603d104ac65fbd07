pub mod project;
pub mod user;

pub use project::{Project, ProjectId, ProjectInput, ProjectStatus, ProjectType, ProjectYear};
pub use user::{Role, User};
