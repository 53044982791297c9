// ABOUTME: Provider-agnostic tool-call shapes and their normalization into persisted invocation records
// ABOUTME: Handles both content-embedded tool-call parts and top-level tool-call lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use commerce_core::constants::chat::TOOL_STATE_OUTPUT_AVAILABLE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool call embedded in a response message's content parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPart {
    pub tool_name: String,
    #[serde(default)]
    pub tool_call_id: Option<String>,
    #[serde(default)]
    pub args: Value,
}

/// Tool call reported in a top-level list next to the response text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// The two ways providers report tool calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "calls", rename_all = "snake_case")]
pub enum ToolCallShape {
    /// `{ type: "tool-call", toolName, toolCallId, args }` parts inside message content
    MessageParts(Vec<ToolCallPart>),
    /// `{ toolName, args | input, toolCallId | id }` entries beside the message
    TopLevel(Vec<TopLevelToolCall>),
}

/// Tool call reduced to what the chat turn needs
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCall {
    pub tool_name: String,
    pub input: Value,
    pub tool_call_id: Option<String>,
}

/// Persisted snapshot of a tool call and its output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    /// `tool-<name>`
    #[serde(rename = "type")]
    pub kind: String,
    pub input: Value,
    pub state: String,
    pub output: Value,
    #[serde(rename = "toolCallId")]
    pub tool_call_id: Option<String>,
}

impl ToolCallShape {
    /// Pick the shape to use: embedded parts win whenever there are any
    #[must_use]
    pub fn select(parts: Vec<ToolCallPart>, top_level: Vec<TopLevelToolCall>) -> Option<Self> {
        if !parts.is_empty() {
            Some(Self::MessageParts(parts))
        } else if !top_level.is_empty() {
            Some(Self::TopLevel(top_level))
        } else {
            None
        }
    }

    /// Whether no calls are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::MessageParts(parts) => parts.is_empty(),
            Self::TopLevel(calls) => calls.is_empty(),
        }
    }

    /// Flatten either shape into a common list
    #[must_use]
    pub fn calls(&self) -> Vec<NormalizedCall> {
        match self {
            Self::MessageParts(parts) => parts
                .iter()
                .map(|part| NormalizedCall {
                    tool_name: part.tool_name.clone(),
                    input: part.args.clone(),
                    tool_call_id: part.tool_call_id.clone(),
                })
                .collect(),
            Self::TopLevel(calls) => calls
                .iter()
                .map(|call| NormalizedCall {
                    tool_name: call.tool_name.clone(),
                    input: call
                        .args
                        .clone()
                        .or_else(|| call.input.clone())
                        .unwrap_or(Value::Null),
                    tool_call_id: call.tool_call_id.clone().or_else(|| call.id.clone()),
                })
                .collect(),
        }
    }

    /// First call to `tool_name`, if any
    #[must_use]
    pub fn find(&self, tool_name: &str) -> Option<NormalizedCall> {
        self.calls().into_iter().find(|c| c.tool_name == tool_name)
    }

    /// Snapshot every call with the tool's output for persistence
    #[must_use]
    pub fn to_invocations(&self, output: &Value) -> Vec<ToolInvocationRecord> {
        self.calls()
            .into_iter()
            .map(|call| ToolInvocationRecord {
                kind: format!("tool-{}", call.tool_name),
                input: call.input,
                state: TOOL_STATE_OUTPUT_AVAILABLE.to_owned(),
                output: output.clone(),
                tool_call_id: call.tool_call_id,
            })
            .collect()
    }
}
