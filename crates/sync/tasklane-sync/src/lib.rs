//! Task synchronization for the tasklane client.
//!
//! [`TaskSync`] reads the collection for the current [`TaskQuery`], keeps the
//! last good result on screen while a read is pending, discards responses
//! that belong to superseded reads and invalidates after every successful
//! mutation. [`EditFlow`] is the modal protocol that drives those
//! mutations from a form.
//!
//! [`TaskQuery`]: tasklane_types::TaskQuery

mod error;
mod flow;
mod service;
mod sync;

pub use error::{FlowError, SyncError, SyncResult};
pub use flow::{CloseReason, EditFlow, EditState};
pub use service::TaskService;
pub use sync::{SyncEvent, TaskListState, TaskSync};
