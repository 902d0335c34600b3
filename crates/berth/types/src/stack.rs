//! Declarative infrastructure stack types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Provider statuses that end a stack operation unsuccessfully.
pub const FAILED_STATUSES: &[&str] = &[
    "CREATE_FAILED",
    "DELETE_FAILED",
    "ROLLBACK_FAILED",
    "UPDATE_ROLLBACK_COMPLETE",
    "ROLLBACK_COMPLETE",
    "DELETE_COMPLETE",
    "UPDATE_ROLLBACK_FAILED",
];

/// Provider statuses that end a stack operation successfully.
pub const SUCCEEDED_STATUSES: &[&str] = &["CREATE_COMPLETE", "UPDATE_COMPLETE"];

/// Capabilities acknowledged when submitting a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "CAPABILITY_IAM")]
    Iam,
    #[serde(rename = "CAPABILITY_NAMED_IAM")]
    NamedIam,
}

impl Capability {
    /// Provider wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Iam => "CAPABILITY_IAM",
            Capability::NamedIam => "CAPABILITY_NAMED_IAM",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single template parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackParameter {
    pub key: String,
    pub value: String,
}

/// Request to converge a named stack onto a template.
///
/// The request is immutable once built; the reconciler submits the same
/// request to update and, if the stack is missing, to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackRequest {
    name: String,
    template: serde_json::Value,
    parameters: Vec<StackParameter>,
    capabilities: Vec<Capability>,
}

impl StackRequest {
    /// Create a request for `name` with an opaque template document
    pub fn new(name: impl Into<String>, template: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            template,
            parameters: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    /// Append a template parameter, preserving insertion order
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(StackParameter {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Acknowledge a capability
    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &serde_json::Value {
        &self.template
    }

    /// Template serialised the way providers expect it in a request body
    pub fn template_body(&self) -> String {
        self.template.to_string()
    }

    pub fn parameters(&self) -> &[StackParameter] {
        &self.parameters
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }
}

/// One declared stack output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StackOutput {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: None,
        }
    }
}

/// A stack as described by the provider at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescription {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub outputs: Vec<StackOutput>,
}

impl StackDescription {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            outputs: Vec::new(),
        }
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.outputs.push(StackOutput::new(key, value));
        self
    }

    /// Classify the reported status
    pub fn state(&self) -> StackState {
        StackState::classify(&self.status)
    }
}

/// Local view of a provider stack status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum StackState {
    /// The provider does not (yet) know the stack
    Nonexistent,
    /// An operation is still in flight
    Pending(String),
    /// Terminal success
    Succeeded(String),
    /// Terminal failure, carrying the status for diagnostics
    Failed(String),
}

impl StackState {
    /// Map a provider status string onto a state. Anything outside the two
    /// terminal sets is pending.
    pub fn classify(status: &str) -> Self {
        if SUCCEEDED_STATUSES.contains(&status) {
            StackState::Succeeded(status.to_string())
        } else if FAILED_STATUSES.contains(&status) {
            StackState::Failed(status.to_string())
        } else {
            StackState::Pending(status.to_string())
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StackState::Succeeded(_) | StackState::Failed(_))
    }
}

impl fmt::Display for StackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackState::Nonexistent => f.write_str("nonexistent"),
            StackState::Pending(status)
            | StackState::Succeeded(status)
            | StackState::Failed(status) => f.write_str(status),
        }
    }
}

/// Flattened stack outputs, output key to output value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackOutputs(BTreeMap<String, String>);

impl StackOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten the outputs of a single stack
    pub fn from_stack(stack: &StackDescription) -> Self {
        stack
            .outputs
            .iter()
            .map(|o| (o.key.clone(), o.value.clone()))
            .collect()
    }

    /// Flatten the outputs of every described stack whose name is `name`.
    /// Stacks with other names are ignored.
    pub fn from_matching(name: &str, stacks: &[StackDescription]) -> Self {
        stacks
            .iter()
            .filter(|s| s.name == name)
            .flat_map(|s| s.outputs.iter())
            .map(|o| (o.key.clone(), o.value.clone()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for StackOutputs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for StackOutputs {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}
