//! Ordered, append-only message history for one session.
//!
//! Invariants:
//! - Every tool-result message answers the tool calls of the assistant
//!   message immediately before it, all of them, in emission order.
//! - No user text is accepted while tool calls are unanswered.
//! - The number of messages never exceeds the configured limit.

use crate::message::{ContentBlock, Message, Role, ToolResult};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("history limit of {limit} messages reached")]
    LimitReached { limit: usize },
    #[error("{count} tool call(s) are still awaiting results")]
    PendingToolCalls { count: usize },
    #[error("no tool calls are awaiting results")]
    NothingPending,
    #[error("tool results {got:?} do not match pending calls {expected:?}")]
    ResultMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct History {
    messages: Vec<Message>,
    max_messages: usize,
}

impl History {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Whether `additional` more messages still fit.
    pub fn has_room_for(&self, additional: usize) -> bool {
        self.messages.len() + additional <= self.max_messages
    }

    /// Ids of tool calls in the last assistant message that have no result yet.
    pub fn pending_tool_calls(&self) -> Vec<String> {
        match self.messages.last() {
            Some(last) if last.role == Role::Assistant => {
                last.tool_calls().into_iter().map(|c| c.id).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn push_user_text(&mut self, text: impl Into<String>) -> Result<(), HistoryError> {
        self.ensure_no_pending()?;
        self.push(Message::user_text(text))
    }

    pub fn push_assistant(&mut self, content: Vec<ContentBlock>) -> Result<(), HistoryError> {
        self.ensure_no_pending()?;
        self.push(Message::assistant(content))
    }

    /// Append an assistant message that requested tools together with the
    /// results of those tools, so the pair is committed atomically.
    pub fn push_tool_round(
        &mut self,
        assistant: Vec<ContentBlock>,
        results: Vec<ToolResult>,
    ) -> Result<(), HistoryError> {
        self.ensure_no_pending()?;
        if !self.has_room_for(2) {
            return Err(HistoryError::LimitReached {
                limit: self.max_messages,
            });
        }

        let assistant = Message::assistant(assistant);
        let expected: Vec<String> = assistant.tool_calls().into_iter().map(|c| c.id).collect();
        if expected.is_empty() {
            return Err(HistoryError::NothingPending);
        }
        let answers = Message::tool_results(results);
        check_results(&expected, &answers)?;

        self.messages.push(assistant);
        self.messages.push(answers);
        Ok(())
    }

    /// Drop screenshots from older tool results so at most `keep` remain.
    ///
    /// Removal happens in multiples of `chunk` (oldest first) so the prefix
    /// of the history stays stable across several steps.
    pub fn prune_images(&mut self, keep: usize, chunk: usize) -> usize {
        let chunk = chunk.max(1);
        let total = self.count_tool_result_images();
        let mut to_remove = total.saturating_sub(keep);
        to_remove -= to_remove % chunk;
        let removed = to_remove;

        if to_remove == 0 {
            return 0;
        }

        for message in self.messages.iter_mut().filter(|m| m.is_tool_result()) {
            for block in &mut message.content {
                if let ContentBlock::ToolResult { content, .. } = block {
                    content.retain(|inner| {
                        if inner.is_image() && to_remove > 0 {
                            to_remove -= 1;
                            false
                        } else {
                            true
                        }
                    });
                }
            }
        }

        removed
    }

    fn count_tool_result_images(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.is_tool_result())
            .flat_map(|m| m.content.iter())
            .map(|b| match b {
                ContentBlock::ToolResult { content, .. } => {
                    content.iter().filter(|c| c.is_image()).count()
                }
                _ => 0,
            })
            .sum()
    }

    fn ensure_no_pending(&self) -> Result<(), HistoryError> {
        let pending = self.pending_tool_calls();
        if pending.is_empty() {
            Ok(())
        } else {
            Err(HistoryError::PendingToolCalls {
                count: pending.len(),
            })
        }
    }

    fn push(&mut self, message: Message) -> Result<(), HistoryError> {
        if !self.has_room_for(1) {
            return Err(HistoryError::LimitReached {
                limit: self.max_messages,
            });
        }
        self.messages.push(message);
        Ok(())
    }
}

fn check_results(expected: &[String], answers: &Message) -> Result<(), HistoryError> {
    let got = answers.tool_result_ids();
    if got.iter().copied().ne(expected.iter().map(String::as_str)) {
        return Err(HistoryError::ResultMismatch {
            expected: expected.to_vec(),
            got: got.into_iter().map(String::from).collect(),
        });
    }
    Ok(())
}
