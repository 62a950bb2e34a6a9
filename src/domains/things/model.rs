//! Task-management data types shared by the backends and the tools.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Built-in Things3 lists a to-do can be listed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    #[default]
    Inbox,
    Today,
    Upcoming,
    Anytime,
    Someday,
    /// Completed to-dos.
    Logbook,
}

impl TodoFilter {
    /// The list name as Things3 spells it.
    pub fn list_name(self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Today => "Today",
            Self::Upcoming => "Upcoming",
            Self::Anytime => "Anytime",
            Self::Someday => "Someday",
            Self::Logbook => "Logbook",
        }
    }
}

/// Completion status of a to-do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    #[default]
    Open,
    Completed,
    Canceled,
}

impl TodoStatus {
    /// Parse the status string Things3 reports.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "completed" => Self::Completed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Open,
        }
    }
}

/// A single to-do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: TodoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a to-do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTodo {
    pub title: String,
    pub notes: Option<String>,
    /// Target list; Things3 puts to-dos without one in the Inbox.
    pub list: Option<TodoFilter>,
    pub project: Option<String>,
    pub tags: Vec<String>,
}

/// A project and how many open to-dos it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub open_todos: usize,
}
