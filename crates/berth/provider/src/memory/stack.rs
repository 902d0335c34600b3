//! Simulated infrastructure-stack provider

use super::Journal;
use crate::api::StackApi;
use async_trait::async_trait;
use berth_types::{
    ProviderError, ProviderResult, StackDescription, StackOutputs, StackOutput, StackParameter,
    StackRequest,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Operations that accept injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackOperation {
    Describe,
    Create,
    Update,
}

/// A call received by [`InMemoryStackApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackCall {
    Describe(String),
    Create(String),
    Update(String),
}

/// What a scripted poll reports
#[derive(Debug, Clone)]
enum ScriptedPoll {
    Status(String),
    NotFound,
}

#[derive(Debug, Clone)]
struct SimulatedStack {
    description: StackDescription,
    template_body: String,
    parameters: Vec<StackParameter>,
    /// Polls left before the in-flight operation settles
    polls_remaining: u32,
    /// Status reached once the in-flight operation settles
    settles_to: Option<String>,
    script: VecDeque<ScriptedPoll>,
}

/// In-memory stack provider.
///
/// Create and update put a stack into `*_IN_PROGRESS` for `pending_polls`
/// describes before it settles to `*_COMPLETE`. Outputs declared with
/// [`InMemoryStackApi::declare_outputs`] are published when a stack is created
/// or updated.
pub struct InMemoryStackApi {
    stacks: DashMap<String, SimulatedStack>,
    declared_outputs: DashMap<String, StackOutputs>,
    failures: DashMap<StackOperation, VecDeque<ProviderError>>,
    pending_polls: u32,
    journal: Journal<StackCall>,
}

impl InMemoryStackApi {
    /// Create a provider whose operations settle on the first describe
    pub fn new() -> Self {
        Self::with_pending_polls(0)
    }

    /// Create a provider whose operations stay in progress for `polls` describes
    pub fn with_pending_polls(polls: u32) -> Self {
        Self {
            stacks: DashMap::new(),
            declared_outputs: DashMap::new(),
            failures: DashMap::new(),
            pending_polls: polls,
            journal: Journal::new(),
        }
    }

    /// Insert an already existing stack
    pub fn seed(&self, description: StackDescription) {
        self.stacks.insert(
            description.name.clone(),
            SimulatedStack {
                description,
                template_body: String::new(),
                parameters: Vec::new(),
                polls_remaining: 0,
                settles_to: None,
                script: VecDeque::new(),
            },
        );
    }

    /// Outputs the stack will expose once created or updated
    pub fn declare_outputs(&self, name: impl Into<String>, outputs: StackOutputs) {
        self.declared_outputs.insert(name.into(), outputs);
    }

    /// Queue statuses reported by the next describes of an existing stack,
    /// ahead of the simulated lifecycle
    pub fn script_statuses<I, S>(&self, name: &str, statuses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(mut stack) = self.stacks.get_mut(name) {
            stack
                .script
                .extend(statuses.into_iter().map(|s| ScriptedPoll::Status(s.into())));
        }
    }

    /// Make an existing stack invisible to the next `polls` describes
    pub fn hide_for(&self, name: &str, polls: u32) {
        if let Some(mut stack) = self.stacks.get_mut(name) {
            for _ in 0..polls {
                stack.script.push_front(ScriptedPoll::NotFound);
            }
        }
    }

    /// Fail the next call of `operation` with `error`
    pub fn fail_next(&self, operation: StackOperation, error: ProviderError) {
        self.failures.entry(operation).or_default().push_back(error);
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<StackCall> {
        self.journal.snapshot()
    }

    /// Number of calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&StackCall) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    /// Current provider-side status, if the stack exists
    pub fn status(&self, name: &str) -> Option<String> {
        self.stacks.get(name).map(|s| s.description.status.clone())
    }

    fn injected(&self, operation: StackOperation) -> Option<ProviderError> {
        self.failures
            .get_mut(&operation)
            .and_then(|mut queue| queue.pop_front())
    }

    fn outputs_for(&self, name: &str) -> Vec<StackOutput> {
        self.declared_outputs
            .get(name)
            .map(|outputs| {
                outputs
                    .iter()
                    .map(|(k, v)| StackOutput::new(k, v))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn not_found(operation: &str, name: &str) -> ProviderError {
        ProviderError::not_found(operation, format!("Stack with id {name} does not exist"))
            .with_code("ValidationError")
    }
}

impl Default for InMemoryStackApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StackApi for InMemoryStackApi {
    async fn describe_stacks(&self, name: &str) -> ProviderResult<Vec<StackDescription>> {
        self.journal.record(StackCall::Describe(name.to_string()));
        if let Some(err) = self.injected(StackOperation::Describe) {
            return Err(err);
        }

        let mut stack = self
            .stacks
            .get_mut(name)
            .ok_or_else(|| Self::not_found("DescribeStacks", name))?;

        match stack.script.pop_front() {
            Some(ScriptedPoll::NotFound) => return Err(Self::not_found("DescribeStacks", name)),
            Some(ScriptedPoll::Status(status)) => {
                stack.description.status = status;
            }
            None => {
                if stack.polls_remaining > 0 {
                    stack.polls_remaining -= 1;
                } else if let Some(settled) = stack.settles_to.take() {
                    stack.description.status = settled;
                }
            }
        }

        debug!(stack = %name, status = %stack.description.status, "Simulated describe");
        Ok(vec![stack.description.clone()])
    }

    async fn create_stack(&self, request: &StackRequest) -> ProviderResult<()> {
        let name = request.name();
        self.journal.record(StackCall::Create(name.to_string()));
        if let Some(err) = self.injected(StackOperation::Create) {
            return Err(err);
        }

        if self.stacks.contains_key(name) {
            return Err(ProviderError::already_exists(
                "CreateStack",
                format!("Stack [{name}] already exists"),
            )
            .with_code("AlreadyExistsException"));
        }

        let mut description = StackDescription::new(name, "CREATE_IN_PROGRESS");
        description.outputs = self.outputs_for(name);
        self.stacks.insert(
            name.to_string(),
            SimulatedStack {
                description,
                template_body: request.template_body(),
                parameters: request.parameters().to_vec(),
                polls_remaining: self.pending_polls,
                settles_to: Some("CREATE_COMPLETE".into()),
                script: VecDeque::new(),
            },
        );
        Ok(())
    }

    async fn update_stack(&self, request: &StackRequest) -> ProviderResult<()> {
        let name = request.name();
        self.journal.record(StackCall::Update(name.to_string()));
        if let Some(err) = self.injected(StackOperation::Update) {
            return Err(err);
        }

        let outputs = self.outputs_for(name);
        let mut stack = self
            .stacks
            .get_mut(name)
            .ok_or_else(|| Self::not_found("UpdateStack", name))?;

        let body = request.template_body();
        if stack.template_body == body && stack.parameters == request.parameters() {
            return Err(
                ProviderError::no_updates("UpdateStack", "No updates are to be performed.")
                    .with_code("ValidationError"),
            );
        }

        stack.template_body = body;
        stack.parameters = request.parameters().to_vec();
        stack.description.status = "UPDATE_IN_PROGRESS".into();
        if !outputs.is_empty() {
            stack.description.outputs = outputs;
        }
        stack.polls_remaining = self.pending_polls;
        stack.settles_to = Some("UPDATE_COMPLETE".into());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> StackRequest {
        StackRequest::new("app-x-dev", json!({"Resources": {"A": {}}}))
    }

    #[tokio::test]
    async fn test_create_settles_after_pending_polls() {
        let api = InMemoryStackApi::with_pending_polls(2);
        api.create_stack(&request()).await.unwrap();

        let statuses: Vec<String> = [
            api.describe_stacks("app-x-dev").await.unwrap(),
            api.describe_stacks("app-x-dev").await.unwrap(),
            api.describe_stacks("app-x-dev").await.unwrap(),
        ]
        .into_iter()
        .map(|stacks| stacks[0].status.clone())
        .collect();

        assert_eq!(
            statuses,
            vec!["CREATE_IN_PROGRESS", "CREATE_IN_PROGRESS", "CREATE_COMPLETE"]
        );
    }

    #[tokio::test]
    async fn test_update_reports_missing_and_unchanged_stacks() {
        let api = InMemoryStackApi::new();

        let err = api.update_stack(&request()).await.unwrap_err();
        assert!(err.is_not_found());

        api.create_stack(&request()).await.unwrap();
        let err = api.update_stack(&request()).await.unwrap_err();
        assert!(err.is_no_updates());

        let changed = StackRequest::new("app-x-dev", json!({"Resources": {"B": {}}}));
        api.update_stack(&changed).await.unwrap();
        assert_eq!(api.status("app-x-dev").as_deref(), Some("UPDATE_IN_PROGRESS"));
    }

    #[tokio::test]
    async fn test_injected_failure_is_used_once() {
        let api = InMemoryStackApi::new();
        api.fail_next(
            StackOperation::Create,
            ProviderError::other("CreateStack", "Template format error"),
        );

        assert!(api.create_stack(&request()).await.is_err());
        assert!(api.create_stack(&request()).await.is_ok());
        assert_eq!(api.count_calls(|c| matches!(c, StackCall::Create(_))), 2);
    }

    #[tokio::test]
    async fn test_hidden_stack_reports_not_found() {
        let api = InMemoryStackApi::new();
        api.seed(StackDescription::new("cluster", "CREATE_COMPLETE"));
        api.hide_for("cluster", 1);

        assert!(api.describe_stacks("cluster").await.unwrap_err().is_not_found());
        assert_eq!(api.describe_stacks("cluster").await.unwrap()[0].status, "CREATE_COMPLETE");
    }
}
