//! Core data types shared by the tasklane client crates.
//!
//! The server owns every value defined here; the client only holds cached
//! copies. Wire formats follow the REST API the client talks to.

mod query;
mod task;
mod timestamp;
mod user;

pub use query::{SortBy, TaskQuery};
pub use task::{
    DraftError, ParseStatusError, Priority, PriorityError, PriorityLevel, Task, TaskDraft,
    TaskId, TaskStatus,
};
pub use user::{TokenResponse, User};
