//! Things3 backend driven through AppleScript.
//!
//! Every operation runs a short script with `osascript`. Scripts join fields
//! with the ASCII unit separator and end each record with the ASCII record
//! separator, so titles and notes may contain tabs and newlines.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::backend::{BackendError, BackendResult, TaskBackend};
use super::model::{NewTodo, Project, Todo, TodoFilter, TodoStatus};

const APP_NAME: &str = "Things3";

/// Backend that talks to a running Things3 application.
#[derive(Debug, Clone)]
pub struct ThingsScriptBackend {
    osascript: String,
}

impl ThingsScriptBackend {
    /// Create a backend using the given `osascript` executable.
    pub fn new(osascript: impl Into<String>) -> Self {
        Self {
            osascript: osascript.into(),
        }
    }

    async fn run_script(&self, script: &str) -> BackendResult<String> {
        let output = Command::new(&self.osascript)
            .arg("-e")
            .arg(script)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("osascript failed: {}", stderr);
            return Err(BackendError::script(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    async fn ensure_running(&self) -> BackendResult<()> {
        let script = format!("application \"{APP_NAME}\" is running");
        match self.run_script(&script).await?.trim() {
            "true" => Ok(()),
            _ => Err(BackendError::NotRunning),
        }
    }

    async fn run_in_app(&self, script: &str) -> BackendResult<String> {
        self.ensure_running().await?;
        self.run_script(script).await
    }
}

/// Quote a string as an AppleScript literal.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Separates fields within a record.
const UNIT_SEP: char = '\u{1f}';
/// Terminates a record.
const RECORD_SEP: char = '\u{1e}';

const TODO_FIELDS: &str = "(id of t) & (character id 31) & (name of t) & (character id 31) & (status of t as string) & (character id 31) & (notes of t) & (character id 31) & (tag names of t) & (character id 30)";

fn list_todos_script(filter: TodoFilter, project: Option<&str>) -> String {
    let source = match project {
        Some(project) => format!("to dos of list {} whose project is project {}", quote(filter.list_name()), quote(project)),
        None => format!("to dos of list {}", quote(filter.list_name())),
    };
    format!(
        "tell application \"{APP_NAME}\"\n\
         set out to \"\"\n\
         repeat with t in ({source})\n\
         set out to out & {TODO_FIELDS}\n\
         end repeat\n\
         return out\n\
         end tell"
    )
}

fn create_todo_script(todo: &NewTodo) -> String {
    let mut properties = vec![format!("name:{}", quote(&todo.title))];
    if let Some(notes) = &todo.notes {
        properties.push(format!("notes:{}", quote(notes)));
    }
    if !todo.tags.is_empty() {
        properties.push(format!("tag names:{}", quote(&todo.tags.join(", "))));
    }

    let target = match (&todo.project, todo.list) {
        (Some(project), _) => format!(" at beginning of project {}", quote(project)),
        (None, Some(list)) => format!(" at beginning of list {}", quote(list.list_name())),
        (None, None) => String::new(),
    };

    format!(
        "tell application \"{APP_NAME}\"\n\
         set t to make new to do with properties {{{}}}{target}\n\
         return {TODO_FIELDS}\n\
         end tell",
        properties.join(", ")
    )
}

fn complete_todo_script(id: &str) -> String {
    format!(
        "tell application \"{APP_NAME}\"\n\
         set t to to do id {}\n\
         set status of t to completed\n\
         return {TODO_FIELDS}\n\
         end tell",
        quote(id)
    )
}

fn list_projects_script() -> String {
    format!(
        "tell application \"{APP_NAME}\"\n\
         set out to \"\"\n\
         repeat with p in projects\n\
         set out to out & (name of p) & (character id 31) & (count of (to dos of p whose status is open)) & (character id 30)\n\
         end repeat\n\
         return out\n\
         end tell"
    )
}

/// Records of the script output, without blank ones.
fn records(output: &str) -> impl Iterator<Item = &str> {
    output
        .split(RECORD_SEP)
        .map(|record| record.trim_start_matches(['\n', '\r']))
        .filter(|record| !record.trim().is_empty())
}

/// Parse the to-do records produced by the scripts.
fn parse_todos(output: &str, project: Option<&str>) -> Vec<Todo> {
    records(output)
        .filter_map(|record| {
            let fields: Vec<&str> = record.split(UNIT_SEP).collect();
            if fields.len() < 3 {
                debug!("Skipping malformed to-do record: {:?}", record);
                return None;
            }
            let notes = fields.get(3).map(|n| n.trim()).filter(|n| !n.is_empty());
            let tags = fields
                .get(4)
                .map(|t| {
                    t.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(Todo {
                id: fields[0].trim().to_string(),
                title: fields[1].to_string(),
                notes: notes.map(str::to_string),
                status: TodoStatus::parse(fields[2]),
                project: project.map(str::to_string),
                tags,
                created_at: None,
            })
        })
        .collect()
}

fn parse_projects(output: &str) -> Vec<Project> {
    records(output)
        .filter_map(|record| {
            let (name, count) = record.split_once(UNIT_SEP)?;
            Some(Project {
                name: name.to_string(),
                open_todos: count.trim().parse().unwrap_or(0),
            })
        })
        .collect()
}

#[async_trait]
impl TaskBackend for ThingsScriptBackend {
    fn name(&self) -> &str {
        "things3"
    }

    #[instrument(skip(self))]
    async fn list_todos(&self, filter: TodoFilter, project: Option<&str>) -> BackendResult<Vec<Todo>> {
        let output = self.run_in_app(&list_todos_script(filter, project)).await?;
        Ok(parse_todos(&output, project))
    }

    #[instrument(skip(self, todo), fields(title = %todo.title))]
    async fn create_todo(&self, todo: NewTodo) -> BackendResult<Todo> {
        if todo.title.trim().is_empty() {
            return Err(BackendError::invalid_input("title cannot be empty"));
        }
        if todo.list == Some(TodoFilter::Logbook) {
            return Err(BackendError::invalid_input(
                "to-dos cannot be created directly in the Logbook",
            ));
        }
        let output = self.run_in_app(&create_todo_script(&todo)).await?;
        parse_todos(&output, todo.project.as_deref())
            .pop()
            .ok_or_else(|| BackendError::script("Things3 returned no to-do"))
    }

    #[instrument(skip(self))]
    async fn complete_todo(&self, id: &str) -> BackendResult<Todo> {
        let output = self
            .run_in_app(&complete_todo_script(id))
            .await
            .map_err(|e| match e {
                BackendError::Script(msg) if msg.contains("-1728") => {
                    BackendError::not_found(format!("to-do {id}"))
                }
                other => other,
            })?;
        parse_todos(&output, None)
            .pop()
            .ok_or_else(|| BackendError::not_found(format!("to-do {id}")))
    }

    #[instrument(skip(self))]
    async fn list_projects(&self) -> BackendResult<Vec<Project>> {
        let output = self.run_in_app(&list_projects_script()).await?;
        Ok(parse_projects(&output))
    }
}
