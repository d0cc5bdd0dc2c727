//! # Task abstractions and results.
//!
//! This module provides the core task-related types:
//! - [`Task`] - trait for implementing async cancelable units of work
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskId`] - identifier carried from submission to result
//! - [`TaskResult`] - outcome of one task that ran to completion

mod result;
mod task;
mod task_fn;

pub use result::{TaskId, TaskResult};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
