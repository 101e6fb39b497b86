/// All errors that can be returned by a `DirectoryStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// An account with this username has already been persisted.
    #[error("user already exists: {username}")]
    UserExists { username: String },

    /// No persisted account with the given username.
    #[error("user not found: {username}")]
    UserNotFound { username: String },

    /// No group with the given name. Groups are never created implicitly.
    #[error("group not found: {name}")]
    GroupNotFound { name: String },

    /// The backing file could not be read or written.
    #[error("directory I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing file does not hold a valid directory document.
    #[error("directory serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend-specific failure (remote directory, injected test failure, etc.).
    #[error("directory backend error: {0}")]
    Backend(String),
}

/// Errors returned by a `Notifier` implementation.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The outbox could not be written.
    #[error("outbox I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("notification serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The delivery mechanism refused the message.
    #[error("notification to {recipient} rejected: {reason}")]
    Rejected { recipient: String, reason: String },
}
