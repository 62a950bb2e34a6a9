//! List projects tool definition.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domains::things::{BackendResult, Project, TaskBackend};
use crate::domains::tools::definition::ToolDefinition;
use crate::domains::tools::error::{HandlerError, ToolError};

/// The projects tool takes no parameters.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ProjectsListParams {}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectsListOutput {
    pub count: usize,
    pub projects: Vec<Project>,
}

/// List projects tool.
pub struct ProjectsListTool;

impl ProjectsListTool {
    pub const NAME: &'static str = "projects_list";

    pub const DESCRIPTION: &'static str = "List Things3 projects with the number of open to-dos in each.";

    pub async fn execute(backend: &dyn TaskBackend) -> BackendResult<ProjectsListOutput> {
        info!("Listing projects via {}", backend.name());
        let projects = backend.list_projects().await?;
        Ok(ProjectsListOutput {
            count: projects.len(),
            projects,
        })
    }

    pub fn definition(backend: Arc<dyn TaskBackend>) -> Result<ToolDefinition, ToolError> {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, move |_: ProjectsListParams| {
            let backend = backend.clone();
            async move { Self::execute(backend.as_ref()).await.map_err(HandlerError::from) }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::things::{InMemoryBackend, NewTodo};

    #[tokio::test]
    async fn test_projects_listed() {
        let backend = InMemoryBackend::new();
        backend
            .create_todo(NewTodo {
                title: "Paint fence".to_string(),
                project: Some("House".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let output = ProjectsListTool::execute(&backend).await.unwrap();
        assert_eq!(output.count, 1);
        assert_eq!(output.projects[0].name, "House");
        assert_eq!(output.projects[0].open_todos, 1);
    }

    #[tokio::test]
    async fn test_definition_ignores_arguments() {
        let definition = ProjectsListTool::definition(Arc::new(InMemoryBackend::new())).unwrap();
        let value = definition.handler().call(Default::default()).await.unwrap();
        assert_eq!(value["count"], 0);
    }
}
