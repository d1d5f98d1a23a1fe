//! Scripted collaborators and a session harness for tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use vmpilot_ai::{
    AiError, Completion, ContentBlock, DeltaFn, SampleRequest, Sampler, StreamDelta, TokenUsage,
};
use vmpilot_config::PilotConfig;
pub use vmpilot_instance::fake::FakeProvider;

use crate::app::AppContext;
use crate::protocol::ServerFrame;
use crate::session::Session;
use crate::transport::{Inbound, Outbound, Outbox};

/// One scripted sampling step.
pub enum Step {
    Reply(Completion),
    Fail(AiError),
    /// Never returns; only a cancelled turn gets past it.
    Hang,
}

pub fn text_reply(text: &str) -> Step {
    Step::Reply(Completion {
        content: vec![ContentBlock::text(text)],
        stop_reason: Some("end_turn".into()),
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        },
    })
}

pub fn tool_reply(calls: &[(&str, &str, Value)]) -> Step {
    let content = calls
        .iter()
        .map(|(id, name, input)| ContentBlock::ToolUse {
            id: (*id).into(),
            name: (*name).into(),
            input: input.clone(),
        })
        .collect();
    Step::Reply(Completion {
        content,
        stop_reason: Some("tool_use".into()),
        usage: TokenUsage {
            input_tokens: 20,
            output_tokens: 8,
        },
    })
}

/// Sampler that plays back a script and records the history length it saw.
#[derive(Default)]
pub struct FakeSampler {
    script: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<usize>>,
}

impl FakeSampler {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// History length at each call.
    pub fn seen(&self) -> Vec<usize> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sampler for FakeSampler {
    async fn sample(
        &self,
        request: &SampleRequest<'_>,
        on_delta: &DeltaFn,
    ) -> Result<Completion, AiError> {
        self.seen.lock().unwrap().push(request.messages.len());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(completion)) => {
                let text = completion.text();
                if !text.is_empty() {
                    on_delta(StreamDelta::Text(text));
                }
                Ok(completion)
            }
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) => std::future::pending::<Result<Completion, AiError>>().await,
            None => Err(AiError::ApiError("script exhausted".into())),
        }
    }
}

/// Context with short time bounds and no credits.
pub fn context(sampler: Arc<FakeSampler>, provider: Arc<FakeProvider>) -> AppContext {
    context_with(PilotConfig::default(), sampler, provider)
}

pub fn context_with(
    config: PilotConfig,
    sampler: Arc<FakeSampler>,
    provider: Arc<FakeProvider>,
) -> AppContext {
    let mut ctx = AppContext::new(config, sampler, provider, None);
    ctx.timeouts.hello = Duration::from_secs(2);
    ctx.timeouts.idle = Duration::from_secs(5);
    ctx.timeouts.tool = Duration::from_secs(1);
    ctx.timeouts.instance.provision = Duration::from_secs(2);
    ctx.timeouts.instance.release = Duration::from_secs(1);
    ctx.retry.initial_backoff = Duration::from_millis(1);
    ctx.retry.max_backoff = Duration::from_millis(2);
    ctx
}

const FRAME_WAIT: Duration = Duration::from_secs(5);

/// A running session driven through its channels.
pub struct Harness {
    inbound: mpsc::Sender<Inbound>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    task: JoinHandle<()>,
}

impl Harness {
    pub fn start(ctx: AppContext) -> Self {
        let (outbox, outbound) = Outbox::channel();
        let (inbound, in_rx) = mpsc::channel(16);
        let peer: SocketAddr = ([127, 0, 0, 1], 40000).into();
        let session = Session::new(ctx, outbox, peer);
        let task = tokio::spawn(session.run(in_rx));
        Self {
            inbound,
            outbound,
            task,
        }
    }

    pub async fn send(&self, frame: Value) {
        self.push(Inbound::Text(frame.to_string())).await;
    }

    pub async fn hello(&self) {
        self.send(serde_json::json!({"api_key": "key-1"})).await;
    }

    pub async fn push(&self, event: Inbound) {
        self.inbound.send(event).await.unwrap();
    }

    pub async fn next_frame(&mut self) -> Option<ServerFrame> {
        loop {
            let next = tokio::time::timeout(FRAME_WAIT, self.outbound.recv())
                .await
                .expect("timed out waiting for a frame");
            match next? {
                Outbound::Frame(frame) => return Some(frame),
                Outbound::Control(_) => continue,
            }
        }
    }

    /// Frames up to and including the first one matching `done`.
    pub async fn until(&mut self, done: impl Fn(&ServerFrame) -> bool) -> Vec<ServerFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame().await {
            let stop = done(&frame);
            frames.push(frame);
            if stop {
                return frames;
            }
        }
        panic!("session ended before the expected frame: {frames:?}");
    }

    /// Wait for the session to end and return every remaining frame.
    pub async fn finish(mut self) -> Vec<ServerFrame> {
        tokio::time::timeout(FRAME_WAIT, &mut self.task)
            .await
            .expect("session did not end")
            .unwrap();
        let mut frames = Vec::new();
        while let Ok(event) = self.outbound.try_recv() {
            if let Outbound::Frame(frame) = event {
                frames.push(frame);
            }
        }
        frames
    }

    /// Drop the client side of the inbound channel, as a vanished peer would.
    pub fn disconnect(&mut self) {
        let (closed, _) = mpsc::channel(1);
        self.inbound = closed;
    }
}
