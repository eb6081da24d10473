//! Projects (tenants) and the memberships that grant users access to them.

mod membership;
mod model;
mod repository;

pub use membership::{MembershipRepository, MembershipScope};
pub use model::{MAX_PROJECT_NAME, Project, ProjectMember, ProjectRole};
pub use repository::{ProjectRepository, ProjectScope};
