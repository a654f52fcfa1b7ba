use thiserror::Error;

// ─── Per-message dispatch errors ─────────────────────────────────────────────

/// Terminal failure kinds for one message passing through the dispatcher.
///
/// Every variant ends processing of the affected message; nothing in the
/// dispatcher retries. The handler loops stay up regardless: they log the
/// error and move on to the next identifier on the topic stream.
#[derive(Debug, Error)]
pub enum DispatchError {
    // ── Store backend ───────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Absent records ──────────────────────────────────────────────────
    #[error("message {id} not found in store")]
    MissingMessage { id: String },

    #[error("reply {id} references missing original {response_to}")]
    MissingOriginal { id: String, response_to: String },

    #[error("no worker registered for handler {handler}")]
    MissingWorker { handler: String },

    // ── Role mismatches ─────────────────────────────────────────────────
    #[error("message {id} is a reply, not inbound data")]
    UnexpectedReply { id: String },

    #[error("message {id} carries no reply correlation")]
    UnexpectedInbound { id: String },

    // ── Detached content ────────────────────────────────────────────────
    #[error("content of message {id} is not a JSON URL string: {reason}")]
    ContentEnvelope { id: String, reason: String },

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Api(#[from] ApiResponseError),
}

// ─── Remote API errors ──────────────────────────────────────────────────────

/// A content-service response with status ≥ 400, kept with its body so the
/// remote failure can be logged verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unexpected API response status {status_code}: {body}")]
pub struct ApiResponseError {
    pub status_code: u16,
    pub body: String,
}

// ─── Store errors ───────────────────────────────────────────────────────────

/// Backend failures of the record store. Absence of a record is not an
/// error; lookups report it as `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is closed")]
    Closed,

    #[error("store writer lock poisoned")]
    Poisoned,
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("client identity rejected: {0}")]
    Identity(String),

    #[error("ca bundle rejected: {0}")]
    CaBundle(String),

    #[error("client construction failed: {0}")]
    Build(String),

    #[error("invalid header name or value for {name}")]
    Header { name: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

// ─── Config errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
