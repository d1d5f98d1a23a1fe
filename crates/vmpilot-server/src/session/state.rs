/// Lifecycle of a session.
///
/// `Idle -> Ready -> Sampling <-> ExecutingTools -> Ready`, and
/// `Terminated` from anywhere. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the hello and the instance.
    Idle,
    /// Instance bound, waiting for a user message.
    Ready,
    Sampling,
    ExecutingTools,
    Terminated,
}

impl SessionState {
    pub fn is_terminated(self) -> bool {
        self == SessionState::Terminated
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Terminated, _) => false,
            (_, Terminated) => true,
            (Idle, Ready) => true,
            (Ready, Sampling) => true,
            (Sampling, ExecutingTools) | (ExecutingTools, Sampling) => true,
            // Final answer, pause, or tool-round limit.
            (Sampling, Ready) | (ExecutingTools, Ready) => true,
            (a, b) => a == b,
        }
    }

    /// Move to `next` if allowed. Returns whether the state changed.
    pub fn advance(&mut self, next: SessionState) -> bool {
        if !self.can_transition_to(next) {
            tracing::warn!(from = ?self, to = ?next, "Rejected session state transition");
            return false;
        }
        *self = next;
        true
    }
}
