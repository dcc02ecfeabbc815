//! A provider that replays canned answers and records what it was asked

use super::CompletionProvider;
use crate::error::{Error, Result};
use crate::types::{CompletionOptions, CompletionResult, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub options: CompletionOptions,
}

/// Answers are returned in the order they were queued; once the queue is
/// empty every call fails with [`Error::InvalidResponseFormat`].
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    answers: Mutex<VecDeque<Result<CompletionResult>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.push(Ok(CompletionResult::text(content)))
    }

    /// A completion without any content
    pub fn with_empty(self) -> Self {
        self.push(Ok(CompletionResult::new(None)))
    }

    pub fn with_error(self, error: Error) -> Self {
        self.push(Err(error))
    }

    fn push(self, answer: Result<CompletionResult>) -> Self {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(answer);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn create_completion(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                messages: messages.to_vec(),
                options: options.clone(),
            });

        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(Error::invalid_response("no scripted answer left")))
    }
}
