mod error;
mod json;
mod memory;
mod notify;
mod record;
mod traits;

pub mod conformance;

pub use error::{DirectoryError, NotifyError};
pub use json::JsonDirectory;
pub use memory::{default_username_rule, DirectoryState, MemoryDirectory};
pub use notify::{LogNotifier, OutboxMessage, OutboxNotifier, RecordingNotifier, SentMessage};
pub use record::{AccountFields, GroupHandle, UserHandle};
pub use traits::{DirectoryStore, Notifier};
