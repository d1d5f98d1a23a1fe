//! Session orchestrator.
//!
//! One session owns one client connection, one remote instance and one
//! message history, and drives the sampling loop until it terminates.
//! Client input stays readable while a turn runs, so a pause, terminate
//! or disconnect cancels the turn at whatever it is awaiting.

mod state;
mod turn;

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vmpilot_ai::prompt::resolve_system_prompt;
use vmpilot_ai::{History, ModelChoice, TokenTracker, ToolSchema};
use vmpilot_common::SessionId;
use vmpilot_instance::{InstanceHandle, ProvisionOptions};

use crate::app::AppContext;
use crate::credits::CreditError;
use crate::protocol::{ClientFrame, Command, Hello, ServerFrame, TerminateReason};
use crate::table::SessionEntry;
use crate::transport::{Inbound, Outbox};
use state::SessionState;
use turn::{Agent, TurnOutcome, TurnRunner};

/// Why and how a session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Termination {
    pub reason: TerminateReason,
    pub message: Option<String>,
}

impl Termination {
    pub fn new(reason: TerminateReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: Some(message.into()),
        }
    }

    pub fn bare(reason: TerminateReason) -> Self {
        Self {
            reason,
            message: None,
        }
    }

    fn from_credit_error(e: CreditError) -> Self {
        let reason = if e.is_refusal() {
            TerminateReason::InsufficientCredits
        } else {
            TerminateReason::CreditError
        };
        Self::new(reason, e.to_string())
    }
}

pub struct Session {
    id: SessionId,
    peer: SocketAddr,
    ctx: AppContext,
    outbox: Outbox,
    cancel: CancellationToken,
    state: SessionState,
    history: History,
    tokens: TokenTracker,
    instance: Option<InstanceHandle>,
    api_key: String,
}

impl Session {
    pub fn new(ctx: AppContext, outbox: Outbox, peer: SocketAddr) -> Self {
        let cancel = ctx.shutdown.child_token();
        let history = History::new(ctx.config.agent.max_history_messages as usize);
        Self {
            id: SessionId::new(),
            peer,
            ctx,
            outbox,
            cancel,
            state: SessionState::Idle,
            history,
            tokens: TokenTracker::new(),
            instance: None,
            api_key: String::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Run the session to completion. The instance, if any, is released
    /// before this returns.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<Inbound>) {
        self.ctx
            .table
            .insert(
                self.id.clone(),
                SessionEntry::new(self.peer, self.cancel.clone()),
            )
            .await;
        info!(session = %self.id, peer = %self.peer, "Session opened");

        let termination = self.drive(&mut inbound).await;
        self.terminate(termination).await;
    }

    async fn drive(&mut self, inbound: &mut mpsc::Receiver<Inbound>) -> Termination {
        let hello = match self.await_hello(inbound).await {
            Ok(hello) => hello,
            Err(t) => return t,
        };
        let agent = match self.setup(hello).await {
            Ok(agent) => agent,
            Err(t) => return t,
        };
        self.serve(inbound, &agent).await
    }

    async fn await_hello(
        &mut self,
        inbound: &mut mpsc::Receiver<Inbound>,
    ) -> Result<Hello, Termination> {
        let hello_timeout = self.ctx.timeouts.hello;
        let next = tokio::select! {
            _ = self.cancel.cancelled() => return Err(Termination::bare(TerminateReason::Shutdown)),
            next = tokio::time::timeout(hello_timeout, inbound.recv()) => next,
        };

        let text = match next {
            Err(_) => {
                return Err(Termination::new(
                    TerminateReason::HelloTimeout,
                    format!("no hello within {hello_timeout:?}"),
                ))
            }
            Ok(None) | Ok(Some(Inbound::Closed)) => {
                return Err(Termination::bare(TerminateReason::ClientDisconnected))
            }
            Ok(Some(Inbound::Malformed(e))) => {
                return Err(Termination::new(TerminateReason::ProtocolError, e))
            }
            Ok(Some(Inbound::Text(text))) => text,
        };

        let hello: Hello = serde_json::from_str(&text).map_err(|e| {
            Termination::new(TerminateReason::ProtocolError, format!("invalid hello: {e}"))
        })?;
        if hello.api_key.trim().is_empty() {
            return Err(Termination::new(
                TerminateReason::ProtocolError,
                "api_key required",
            ));
        }
        Ok(hello)
    }

    /// Admission, provisioning and agent setup.
    async fn setup(&mut self, hello: Hello) -> Result<Agent, Termination> {
        let model_name = hello
            .model_name
            .as_deref()
            .unwrap_or(&self.ctx.config.agent.default_model);
        let model = ModelChoice::from_name(model_name)
            .map_err(|e| Termination::new(TerminateReason::InvalidModel, e.to_string()))?;
        self.api_key = hello.api_key;

        if let Some(policy) = &self.ctx.credits {
            policy
                .admit(&self.api_key)
                .await
                .map_err(Termination::from_credit_error)?;
        }

        let mut status = String::from("Deploying instance");
        if hello.auth_state_id.is_some() {
            status.push_str(" with auth state");
        }
        self.outbox.send(ServerFrame::status(status));

        // Provisioning is not raced against client input: once started it
        // runs to completion so the instance can always be released.
        let opts = ProvisionOptions {
            api_key: self.api_key.clone(),
            instance_type: self.ctx.config.instance.instance_type.clone(),
            auth_state_id: hello.auth_state_id,
        };
        let handle = InstanceHandle::provision(
            self.ctx.provider.clone(),
            &opts,
            self.ctx.timeouts.instance,
        )
        .await
        .map_err(|e| {
            warn!(session = %self.id, error = %e, "Provisioning failed");
            Termination::new(TerminateReason::ProvisionFailed, e.to_string())
        })?;
        self.ctx.table.set_instance(&self.id, handle.id()).await;
        let handle = self.instance.insert(handle);

        if let Some(policy) = &self.ctx.credits {
            policy
                .charge_session(&self.api_key)
                .await
                .map_err(Termination::from_credit_error)?;
        }
        if self.cancel.is_cancelled() {
            return Err(Termination::bare(TerminateReason::Shutdown));
        }

        self.outbox.send(ServerFrame::status("Launching agent"));
        let url = tokio::select! {
            _ = self.cancel.cancelled() => return Err(Termination::bare(TerminateReason::Shutdown)),
            url = handle.stream_url() => match url {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(session = %self.id, error = %e, "Stream URL unavailable");
                    None
                }
            },
        };
        self.outbox.send(ServerFrame::InstanceInfo {
            url,
            instance_id: handle.id().to_string(),
            launch_time: handle.info().launch_time.to_rfc3339(),
        });

        self.state.advance(SessionState::Ready);
        info!(session = %self.id, model = %model, instance = %handle.id(), "Session ready");

        let display = self.ctx.display();
        Ok(Agent {
            model,
            system: resolve_system_prompt(self.ctx.config.agent.system_prompt.as_deref(), display),
            tools: ToolSchema::computer_use(model.tool_version(), display),
        })
    }

    /// Wait for client input between turns.
    async fn serve(&mut self, inbound: &mut mpsc::Receiver<Inbound>, agent: &Agent) -> Termination {
        let idle = self.ctx.timeouts.idle;
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return Termination::bare(TerminateReason::Shutdown),
                _ = tokio::time::sleep(idle) => {
                    return Termination::new(
                        TerminateReason::IdleTimeout,
                        format!("no activity for {idle:?}"),
                    )
                }
                next = inbound.recv() => next,
            };

            match classify(next) {
                Err(t) => return t,
                Ok(ClientFrame::Command {
                    command: Command::Terminate,
                }) => return Termination::bare(TerminateReason::ClientTerminated),
                Ok(ClientFrame::Command {
                    command: Command::Pause,
                }) => debug!(session = %self.id, "Pause with no turn running"),
                Ok(ClientFrame::Message { message }) => {
                    match self.run_turn(message, inbound, agent).await {
                        TurnOutcome::Completed => {}
                        TurnOutcome::Paused => {
                            self.state.advance(SessionState::Ready);
                            self.outbox.send(ServerFrame::loop_paused());
                        }
                        TurnOutcome::Terminate(t) => return t,
                    }
                }
            }
        }
    }

    /// Run one turn while still listening to the client.
    async fn run_turn(
        &mut self,
        message: String,
        inbound: &mut mpsc::Receiver<Inbound>,
        agent: &Agent,
    ) -> TurnOutcome {
        if let Some(policy) = &self.ctx.credits {
            if let Err(e) = policy.charge_turn(&self.api_key).await {
                return TurnOutcome::Terminate(Termination::from_credit_error(e));
            }
        }
        if let Err(e) = self.history.push_user_text(message) {
            return TurnOutcome::Terminate(Termination::new(
                TerminateReason::HistoryLimit,
                e.to_string(),
            ));
        }
        let Some(instance) = self.instance.as_ref() else {
            return TurnOutcome::Terminate(Termination::new(
                TerminateReason::ProvisionFailed,
                "no instance bound",
            ));
        };

        let work = TurnRunner {
            id: &self.id,
            ctx: &self.ctx,
            agent,
            outbox: &self.outbox,
            instance,
            history: &mut self.history,
            tokens: &mut self.tokens,
            state: &mut self.state,
        }
        .run();
        tokio::pin!(work);

        loop {
            tokio::select! {
                outcome = &mut work => return outcome,
                _ = self.cancel.cancelled() => {
                    return TurnOutcome::Terminate(Termination::bare(TerminateReason::Shutdown))
                }
                next = inbound.recv() => match classify(next) {
                    Err(t) => return TurnOutcome::Terminate(t),
                    Ok(ClientFrame::Command { command: Command::Terminate }) => {
                        return TurnOutcome::Terminate(Termination::bare(
                            TerminateReason::ClientTerminated,
                        ))
                    }
                    Ok(ClientFrame::Command { command: Command::Pause }) => {
                        info!(session = %self.id, "Turn paused by client");
                        return TurnOutcome::Paused;
                    }
                    Ok(ClientFrame::Message { .. }) => {
                        self.outbox.send(ServerFrame::error(
                            "a turn is already running; pause it or wait for loop_complete",
                        ));
                    }
                }
            }
        }
    }

    /// Enter `Terminated`: release the instance, send the terminal frame,
    /// leave the table. Calling it again does nothing.
    async fn terminate(&mut self, termination: Termination) {
        let from = self.state;
        if !self.state.advance(SessionState::Terminated) {
            return;
        }

        if let Some(instance) = &self.instance {
            instance.release().await;
        }

        if termination.reason.client_reachable() {
            self.outbox.send(ServerFrame::Terminated {
                reason: termination.reason,
                message: termination.message.clone(),
            });
        }

        self.ctx.table.remove(&self.id).await;

        let usage = self.tokens.total();
        info!(
            session = %self.id,
            reason = ?termination.reason,
            message = termination.message.as_deref().unwrap_or(""),
            from = ?from,
            samples = self.tokens.call_count(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Session terminated"
        );
    }
}

/// Interpret the next inbound event after the hello.
fn classify(next: Option<Inbound>) -> Result<ClientFrame, Termination> {
    match next {
        None | Some(Inbound::Closed) => Err(Termination::bare(TerminateReason::ClientDisconnected)),
        Some(Inbound::Malformed(e)) => Err(Termination::new(TerminateReason::ProtocolError, e)),
        Some(Inbound::Text(text)) => serde_json::from_str(&text).map_err(|e| {
            Termination::new(TerminateReason::ProtocolError, format!("invalid frame: {e}"))
        }),
    }
}
