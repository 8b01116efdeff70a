//! Formatting helpers shared across MCP handlers and resources.

use rmcp::model::ResourceContents;
use serde::Serialize;

use crate::config::get_config;

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Which kind of step a banner describes.
#[derive(Debug)]
pub(crate) enum BannerKind {
    /// Ordinary continuation.
    Thought,
    /// Rewrite of an earlier step.
    Revision {
        /// 1-based step being reconsidered.
        step: u32,
    },
    /// First step on a freshly forked branch.
    Branch {
        /// Branch origin step in the parent.
        from: u32,
        /// Id of the branch session.
        id: String,
    },
}

/// Render the boxed trace banner for one processed thought.
///
/// The box width tracks the longer of the header and the content so both fit
/// inside the border.
pub(crate) fn thought_banner(kind: &BannerKind, number: u32, total: u32, content: &str) -> String {
    let (prefix, context) = match kind {
        BannerKind::Thought => ("💭 Thought".to_string(), String::new()),
        BannerKind::Revision { step } => {
            ("🔄 Revision".to_string(), format!(" (revising thought {step})"))
        }
        BannerKind::Branch { from, id } => (
            "🌿 Branch".to_string(),
            format!(" (from thought {from}, ID: {id})"),
        ),
    };

    let header = format!("{prefix} {number}/{total}{context}");
    let header_len = header.chars().count();
    let content_len = content.chars().count();
    let inner = header_len.max(content_len) + 2;
    let border: String = "─".repeat(inner);

    format!(
        "\n┌{border}┐\n│ {header}{} │\n├{border}┤\n│ {content}{} │\n└{border}┘",
        " ".repeat(inner - header_len - 2),
        " ".repeat(inner - content_len - 2),
    )
}

/// Write the thought banner to stderr unless trace logging is disabled.
pub(crate) fn log_thought(kind: &BannerKind, number: u32, total: u32, content: &str) {
    if get_config().disable_thought_logging {
        return;
    }
    eprintln!("{}", thought_banner(kind, number, total, content));
}
