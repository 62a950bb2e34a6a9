//! To-do tools.

mod complete;
mod create;
mod list;

pub use complete::{TodosCompleteParams, TodosCompleteTool};
pub use create::{TodosCreateParams, TodosCreateTool};
pub use list::{TodoListOutput, TodosListParams, TodosListTool};
