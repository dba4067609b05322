//! Human-in-the-loop agent.
//!
//! `ChannelAgent` forwards every lifecycle event to a [`ChannelController`]
//! over crossbeam channels and waits for the controller's reply until the
//! request's deadline. The controller side can live on any thread: a
//! terminal prompt, a network bridge or a test.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::core::{Move, View};
use crate::error::AgentError;

use super::agent::{Agent, MatchInfo, MoveRequest};

/// Lifecycle events delivered to the controller.
#[derive(Clone, Debug)]
pub enum ControllerEvent {
    Prepare(MatchInfo),
    Request(MoveRequest),
    Concluded { view: View, goal: i64 },
    Aborted,
}

/// The agent half, bound to a role.
#[derive(Debug)]
pub struct ChannelAgent {
    name: String,
    events: Sender<ControllerEvent>,
    replies: Receiver<Move>,
}

/// The controller half.
#[derive(Debug, Clone)]
pub struct ChannelController {
    events: Receiver<ControllerEvent>,
    replies: Sender<Move>,
}

impl ChannelAgent {
    /// Create a connected agent/controller pair.
    #[must_use]
    pub fn pair(name: impl Into<String>) -> (ChannelAgent, ChannelController) {
        let (event_tx, event_rx) = unbounded();
        let (reply_tx, reply_rx) = unbounded();
        (
            ChannelAgent {
                name: name.into(),
                events: event_tx,
                replies: reply_rx,
            },
            ChannelController {
                events: event_rx,
                replies: reply_tx,
            },
        )
    }

    fn send(&self, event: ControllerEvent) -> Result<(), AgentError> {
        self.events.send(event).map_err(|_| AgentError::Disconnected)
    }
}

impl Agent for ChannelAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, info: &MatchInfo) -> Result<(), AgentError> {
        self.send(ControllerEvent::Prepare(info.clone()))
    }

    fn propose_move(&mut self, request: &MoveRequest) -> Result<Move, AgentError> {
        // Replies to abandoned requests must not answer this one.
        while self.replies.try_recv().is_ok() {}

        self.send(ControllerEvent::Request(request.clone()))?;
        match request.deadline {
            Some(deadline) => self.replies.recv_deadline(deadline).map_err(|e| match e {
                RecvTimeoutError::Timeout => AgentError::Timeout,
                RecvTimeoutError::Disconnected => AgentError::Disconnected,
            }),
            None => self.replies.recv().map_err(|_| AgentError::Disconnected),
        }
    }

    fn conclude(&mut self, view: &View, goal: i64) {
        let _ = self.send(ControllerEvent::Concluded {
            view: view.clone(),
            goal,
        });
    }

    fn abort(&mut self) {
        let _ = self.send(ControllerEvent::Aborted);
    }
}

impl ChannelController {
    /// Wait for the next event.
    pub fn next_event(&self, timeout: Duration) -> Option<ControllerEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Wait for the next move request, skipping other events.
    pub fn next_request(&self, timeout: Duration) -> Option<MoveRequest> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            match self.events.recv_deadline(deadline).ok()? {
                ControllerEvent::Request(request) => return Some(request),
                _ => continue,
            }
        }
    }

    /// Answer the outstanding request.
    pub fn reply(&self, action: Move) -> Result<(), AgentError> {
        self.replies.send(action).map_err(|_| AgentError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Role, Term};
    use std::time::Instant;

    fn request(deadline: Option<Instant>) -> MoveRequest {
        MoveRequest {
            role: Role::new("first"),
            ply: 3,
            view: View::new(),
            legal_moves: vec![Move::constant("noop")],
            remaining: None,
            deadline,
            history: None,
        }
    }

    #[test]
    fn test_controller_answers() {
        let (mut agent, controller) = ChannelAgent::pair("human");
        let handle = std::thread::spawn(move || {
            let request = controller.next_request(Duration::from_secs(5)).unwrap();
            assert_eq!(request.ply, 3);
            controller.reply(request.legal_moves[0].clone()).unwrap();
        });

        let action = agent.propose_move(&request(None)).unwrap();
        assert_eq!(action, Move::new(Term::constant("noop")));
        handle.join().unwrap();
    }

    #[test]
    fn test_deadline_times_out() {
        let (mut agent, _controller) = ChannelAgent::pair("human");
        let deadline = Instant::now() + Duration::from_millis(20);
        assert_eq!(agent.propose_move(&request(Some(deadline))), Err(AgentError::Timeout));
    }

    #[test]
    fn test_stale_reply_discarded() {
        let (mut agent, controller) = ChannelAgent::pair("human");
        controller.reply(Move::constant("stale")).unwrap();

        let deadline = Instant::now() + Duration::from_millis(20);
        assert_eq!(agent.propose_move(&request(Some(deadline))), Err(AgentError::Timeout));
    }

    #[test]
    fn test_dropped_controller_disconnects() {
        let (mut agent, controller) = ChannelAgent::pair("human");
        drop(controller);
        assert_eq!(agent.propose_move(&request(None)), Err(AgentError::Disconnected));
    }
}
