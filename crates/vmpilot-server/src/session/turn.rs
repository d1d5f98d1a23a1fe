//! One user turn: sample, run the requested tools, repeat until the model
//! answers without tool calls.

use futures_util::future::join_all;
use tracing::{debug, info};
use vmpilot_ai::{
    sample_with_retry, History, ModelChoice, SampleRequest, StreamDelta, TokenTracker, ToolCall,
    ToolResult, ToolSchema,
};
use vmpilot_common::SessionId;
use vmpilot_instance::{InstanceHandle, ToolDispatcher, ToolOutput};

use super::state::SessionState;
use super::Termination;
use crate::app::AppContext;
use crate::protocol::{ServerFrame, TerminateReason};
use crate::transport::Outbox;

/// Fixed per-session sampling setup.
#[derive(Debug, Clone)]
pub struct Agent {
    pub model: ModelChoice,
    pub system: String,
    pub tools: ToolSchema,
}

#[derive(Debug, PartialEq)]
pub enum TurnOutcome {
    Completed,
    Paused,
    Terminate(Termination),
}

/// Borrowed view of the session that a turn may mutate.
pub(super) struct TurnRunner<'a> {
    pub id: &'a SessionId,
    pub ctx: &'a AppContext,
    pub agent: &'a Agent,
    pub outbox: &'a Outbox,
    pub instance: &'a InstanceHandle,
    pub history: &'a mut History,
    pub tokens: &'a mut TokenTracker,
    pub state: &'a mut SessionState,
}

impl TurnRunner<'_> {
    pub async fn run(self) -> TurnOutcome {
        let agent_config = &self.ctx.config.agent;
        let dispatcher = ToolDispatcher::new(self.ctx.timeouts.tool);
        let mut rounds: u32 = 0;

        loop {
            let pruned = self.history.prune_images(
                agent_config.images_to_keep as usize,
                agent_config.image_removal_chunk as usize,
            );
            if pruned > 0 {
                debug!(session = %self.id, pruned, "Pruned old screenshots");
            }

            self.state.advance(SessionState::Sampling);
            let completion = {
                let outbox = self.outbox.clone();
                let on_delta = move |delta: StreamDelta| {
                    outbox.send(match delta {
                        StreamDelta::Text(content) => ServerFrame::Text { content },
                        StreamDelta::Reasoning(content) => ServerFrame::Reasoning { content },
                    });
                };
                let request = SampleRequest {
                    model: self.agent.model,
                    system: &self.agent.system,
                    messages: self.history.messages(),
                    tools: &self.agent.tools,
                };
                match sample_with_retry(self.ctx.sampler.as_ref(), &request, &on_delta, &self.ctx.retry)
                    .await
                {
                    Ok(completion) => completion,
                    Err(e) => {
                        return TurnOutcome::Terminate(Termination::new(
                            TerminateReason::SamplingFailed,
                            e.to_string(),
                        ))
                    }
                }
            };
            self.tokens.record(self.agent.model, &completion.usage);

            if completion.is_final() {
                if let Err(e) = self.history.push_assistant(completion.content) {
                    return history_full(e);
                }
                self.state.advance(SessionState::Ready);
                self.outbox.send(ServerFrame::loop_complete());
                return TurnOutcome::Completed;
            }
            let calls = completion.tool_calls();

            if !self.history.has_room_for(2) {
                return TurnOutcome::Terminate(Termination::new(
                    TerminateReason::HistoryLimit,
                    format!(
                        "history limit of {} messages reached",
                        self.history.max_messages()
                    ),
                ));
            }

            self.state.advance(SessionState::ExecutingTools);
            let results = self.execute_tools(&dispatcher, &calls).await;
            if let Err(e) = self.history.push_tool_round(completion.content, results) {
                return history_full(e);
            }

            rounds += 1;
            if rounds >= agent_config.max_tool_rounds {
                info!(session = %self.id, rounds, "Tool round limit reached");
                self.outbox.send(ServerFrame::error(format!(
                    "Stopped after {rounds} tool rounds; send another message to continue"
                )));
                self.state.advance(SessionState::Ready);
                self.outbox.send(ServerFrame::loop_complete());
                return TurnOutcome::Completed;
            }
        }
    }

    /// Run a batch of tool calls. Results come back in call order whether
    /// the calls ran one after another or concurrently.
    async fn execute_tools(&self, dispatcher: &ToolDispatcher, calls: &[ToolCall]) -> Vec<ToolResult> {
        for call in calls {
            self.outbox.send(ServerFrame::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.input.clone(),
            });
        }

        if self.ctx.config.agent.parallel_tool_calls {
            let outputs = join_all(
                calls
                    .iter()
                    .map(|call| dispatcher.execute(self.instance, &call.name, &call.input)),
            )
            .await;
            calls
                .iter()
                .zip(outputs)
                .map(|(call, output)| self.report(call, output))
                .collect()
        } else {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                let output = dispatcher
                    .execute(self.instance, &call.name, &call.input)
                    .await;
                results.push(self.report(call, output));
            }
            results
        }
    }

    /// Echo a tool outcome to the client and convert it for the history.
    fn report(&self, call: &ToolCall, output: ToolOutput) -> ToolResult {
        self.outbox.send(ServerFrame::ToolResult {
            tool_use_id: call.id.clone(),
            output: output.output.clone(),
            error: output.error.clone(),
            has_image: output.base64_image.is_some(),
        });
        ToolResult {
            tool_use_id: call.id.clone(),
            output: output.output,
            error: output.error,
            base64_image: output.base64_image,
        }
    }
}

fn history_full(e: vmpilot_ai::HistoryError) -> TurnOutcome {
    TurnOutcome::Terminate(Termination::new(TerminateReason::HistoryLimit, e.to_string()))
}
