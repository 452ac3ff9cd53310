mod handler;
mod import;
mod model;

pub use handler::{get_project_members, get_projects, grant_auth, import_project};
pub use import::{ImportBatch, normalize_rows};
pub use model::{
    ACTIVE_STATUS, AddProjectRequest, Auth, BootstrapStep, Project, ProjectCreated,
    ProjectMemberView,
};
