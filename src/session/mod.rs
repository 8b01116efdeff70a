//! Reasoning-session domain model and concurrency-safe storage.
//!
//! A [`ThinkingSession`] owns an ordered sequence of [`Thought`] steps plus the
//! metadata a client needs to continue, revise, or branch a reasoning trace.
//! The canonical copy of every session lives in a [`store::SessionStore`]; all
//! values handed out of the store are deep copies, and all mutation flows
//! through the store's version-checked compare-and-swap cycle.

pub mod export;
pub mod ops;
pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Errors produced by session lookup, mutation, and export.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The referenced session id is not registered in the store.
    #[error("session not found: {0}")]
    NotFound(String),
    /// The caller supplied an argument the operation cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Sustained write contention exhausted the compare-and-swap retry budget.
    #[error("session '{id}' stayed contended across {attempts} update attempts")]
    Conflict {
        /// Session whose updates kept losing the version race.
        id: String,
        /// Number of attempts made before giving up.
        attempts: u32,
    },
    /// An export projection could not be serialized.
    #[error("failed to serialize session data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One numbered step in a reasoning session.
///
/// Indices are 1-based, equal the thought's position at creation time, and are
/// never reused or renumbered; revision rewrites content in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    /// 1-based position in the owning session's sequence.
    pub index: u32,
    /// The thinking step itself.
    pub content: String,
    /// When the thought was first recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Whether the content has been rewritten after creation.
    pub revised: bool,
    /// Branch origin step, recorded on the first thought after a branch.
    /// Reserved for cross-session linking; not interpreted today.
    pub parent_index: Option<u32>,
}

/// Lifecycle state of a [`ThinkingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The session accepts further thoughts.
    Active,
    /// A continuation signalled that no further thought is needed.
    Completed,
    /// Reserved state; never produced by the current operations.
    Paused,
}

impl SessionStatus {
    /// Stable lowercase label used in rendered reviews and payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Paused => "paused",
        }
    }
}

/// Aggregate owning one reasoning trace: problem statement, ordered thoughts,
/// branch links, and the optimistic-concurrency version counter.
///
/// All fields are owned data, so [`Clone`] is the deep-copy operation the
/// store relies on; a cloned session shares nothing with the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingSession {
    /// Globally unique opaque identifier.
    pub id: String,
    /// Problem statement the session reasons about.
    pub problem: String,
    /// Ordered thought sequence; `thoughts[i].index == i + 1` always holds.
    pub thoughts: Vec<Thought>,
    /// Index of the most recently appended thought (0 while empty).
    pub current_thought: u32,
    /// Caller's current estimate of total steps needed.
    pub estimated_total: u32,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// When the session was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the session last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity_at: OffsetDateTime,
    /// Ids of branch sessions forked from this one, in creation order.
    pub branches: Vec<String>,
    /// Increases by exactly one on every successful store mutation.
    pub version: u64,
}

impl ThinkingSession {
    /// Initial version assigned at registration time.
    pub const INITIAL_VERSION: u64 = 1;

    /// Construct an empty active session.
    pub fn new(id: String, problem: String, estimated_total: u32) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            problem,
            thoughts: Vec::new(),
            current_thought: 0,
            estimated_total,
            status: SessionStatus::Active,
            created_at: now,
            last_activity_at: now,
            branches: Vec::new(),
            version: Self::INITIAL_VERSION,
        }
    }
}
