//! JSON schema builders for MCP tools.

use serde_json::{Map, Value, json};

use crate::config::get_config;

/// Build the schema describing the `start-thinking` tool input.
pub(crate) fn start_input_schema() -> Map<String, Value> {
    let default_estimate = get_config().default_estimated_steps;

    let mut properties = Map::new();
    properties.insert(
        "problem".into(),
        string_schema("Problem statement the session will reason about"),
    );
    properties.insert(
        "session_id".into(),
        string_schema("Optional explicit session id; generated when omitted"),
    );
    properties.insert(
        "estimated_steps".into(),
        integer_schema(
            "Initial estimate of thoughts needed (can be adjusted later)",
            Some(default_estimate as u64),
        ),
    );

    finalize_object_schema(properties, &["problem"])
}

/// Build the schema describing the `continue-thinking` tool input.
pub(crate) fn continue_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "session_id".into(),
        string_schema("Session returned by start-thinking"),
    );
    properties.insert(
        "thought".into(),
        string_schema("Your current thinking step"),
    );
    properties.insert(
        "next_thought_needed".into(),
        boolean_schema(
            "Whether another thought step is needed; false completes the session. \
             Ignored when revise_step is set",
        ),
    );
    properties.insert(
        "revise_step".into(),
        integer_schema(
            "Which earlier thought number is being reconsidered; only its content changes",
            None,
        ),
    );
    properties.insert(
        "create_branch".into(),
        boolean_schema("Fork an alternate reasoning path and record this thought on it"),
    );
    properties.insert(
        "estimated_total".into(),
        integer_schema(
            "Updated estimate of total thoughts needed. Ignored when revise_step is set",
            None,
        ),
    );

    let mut schema = finalize_object_schema(properties, &["session_id", "thought"]);

    let example_append = json!({
        "session_id": "a2f6…",
        "thought": "pick destination",
        "next_thought_needed": true
    });
    let example_revise = json!({
        "session_id": "a2f6…",
        "thought": "book train instead",
        "revise_step": 2
    });
    schema.insert(
        "examples".into(),
        Value::Array(vec![example_append, example_revise]),
    );

    schema
}

/// Build the schema describing the `review-thinking` tool input.
pub(crate) fn review_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "session_id".into(),
        string_schema("Session to render a review for"),
    );
    finalize_object_schema(properties, &["session_id"])
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn boolean_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("boolean".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn integer_schema(description: &str, default: Option<u64>) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("integer".into()));
    schema.insert("description".into(), Value::String(description.into()));
    schema.insert("minimum".into(), Value::Number(1.into()));
    if let Some(default) = default {
        schema.insert(
            "default".into(),
            Value::Number(serde_json::Number::from(default)),
        );
    }
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}
