//! Read-only projections: review rendering and JSON export.

use serde::Serialize;
use serde_json::Value;

use crate::session::store::SessionStore;
use crate::session::{SessionError, ThinkingSession};

/// Serializable wrapper for the all-sessions export.
#[derive(Debug, Serialize)]
struct SessionsExport<'a> {
    count: usize,
    sessions: &'a [ThinkingSession],
}

/// Render a deterministic textual review of one session.
///
/// Layout: header lines (id, problem, status, progress), branch ids when any
/// exist, then the thought sequence in order with a `[revised]` marker on
/// rewritten steps.
pub fn render_review(session: &ThinkingSession) -> String {
    let mut out = String::new();
    out.push_str(&format!("Session: {}\n", session.id));
    out.push_str(&format!("Problem: {}\n", session.problem));
    out.push_str(&format!("Status: {}\n", session.status.label()));
    out.push_str(&format!(
        "Progress: {} of ~{} steps\n",
        session.thoughts.len(),
        session.estimated_total
    ));
    if !session.branches.is_empty() {
        out.push_str(&format!("Branches: {}\n", session.branches.join(", ")));
    }
    out.push('\n');
    for thought in &session.thoughts {
        let marker = if thought.revised { "[revised] " } else { "" };
        out.push_str(&format!(
            "  {}. {}{}\n",
            thought.index, marker, thought.content
        ));
    }
    out
}

/// Export one session as a JSON-serializable snapshot.
pub fn export_session(store: &SessionStore, id: &str) -> Result<Value, SessionError> {
    let snapshot = store.snapshot(id)?;
    Ok(serde_json::to_value(&snapshot)?)
}

/// Export every session, ordered deterministically.
pub fn export_all(store: &SessionStore) -> Result<Value, SessionError> {
    let snapshots = store.list_snapshots();
    Ok(serde_json::to_value(SessionsExport {
        count: snapshots.len(),
        sessions: &snapshots,
    })?)
}
