//! Project tools.

mod list;

pub use list::{ProjectsListOutput, ProjectsListParams, ProjectsListTool};
