//! Per-role worker threads.
//!
//! Each role's agent lives on its own thread and is driven through a small
//! job queue. Every request gets a one-shot reply channel, so the
//! orchestrator can stop waiting at the deadline without the agent's
//! cooperation. A seat that misses a deadline is wedged: its job queue is
//! closed, the thread is detached, and whatever it eventually replies lands
//! in a channel nobody reads.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, warn};

use crate::agents::{Agent, MatchInfo, MoveRequest};
use crate::core::{Move, Role, View};
use crate::error::{AgentError, MatchError};

const JOB_QUEUE_CAPACITY: usize = 4;

/// How long a finished match waits for an idle seat to shut down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

enum Job {
    Prepare {
        info: MatchInfo,
        reply: Sender<Reply<()>>,
    },
    Propose {
        request: MoveRequest,
        reply: Sender<Reply<Move>>,
    },
    Conclude {
        view: View,
        goal: i64,
    },
    Abort,
}

/// An agent's answer, stamped on the seat thread when the call returned.
#[derive(Debug)]
pub(crate) struct Reply<T> {
    pub result: Result<T, AgentError>,
    pub finished_at: Instant,
}

impl<T> Reply<T> {
    fn now(result: Result<T, AgentError>) -> Self {
        Self {
            result,
            finished_at: Instant::now(),
        }
    }
}

/// An outstanding request.
#[derive(Debug)]
pub(crate) struct Pending<T> {
    rx: Receiver<Reply<T>>,
}

impl<T> Pending<T> {
    /// Wait for the reply until `deadline` (forever if `None`).
    pub fn wait(self, deadline: Option<Instant>) -> Result<Reply<T>, AgentError> {
        match deadline {
            Some(deadline) => self.rx.recv_deadline(deadline).map_err(|err| match err {
                RecvTimeoutError::Timeout => AgentError::Timeout,
                RecvTimeoutError::Disconnected => AgentError::Disconnected,
            }),
            None => self.rx.recv().map_err(|_| AgentError::Disconnected),
        }
    }
}

/// One role's agent and the thread it runs on.
pub(crate) struct Seat {
    role: Role,
    agent_name: String,
    wants_history: bool,
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    exited: Receiver<()>,
    wedged: bool,
}

impl Seat {
    /// Move `agent` onto a new thread.
    pub fn spawn(role: Role, agent: Box<dyn Agent>) -> Result<Self, MatchError> {
        let agent_name = agent.name().to_string();
        let wants_history = agent.wants_history();
        let (tx, rx) = bounded::<Job>(JOB_QUEUE_CAPACITY);
        // Never sent on; disconnects when the worker exits.
        let (alive, exited) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name(format!("ggp-seat-{role}"))
            .spawn(move || {
                serve(agent, rx);
                drop(alive);
            })
            .map_err(|err| MatchError::Spawn {
                role: role.clone(),
                message: err.to_string(),
            })?;

        Ok(Self {
            role,
            agent_name,
            wants_history,
            jobs: Some(tx),
            handle: Some(handle),
            exited,
            wedged: false,
        })
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn wants_history(&self) -> bool {
        self.wants_history
    }

    pub fn is_wedged(&self) -> bool {
        self.wedged
    }

    pub fn prepare(&self, info: MatchInfo) -> Result<Pending<()>, AgentError> {
        let (reply, rx) = bounded(1);
        self.submit(Job::Prepare { info, reply })?;
        Ok(Pending { rx })
    }

    pub fn propose(&self, request: MoveRequest) -> Result<Pending<Move>, AgentError> {
        let (reply, rx) = bounded(1);
        self.submit(Job::Propose { request, reply })?;
        Ok(Pending { rx })
    }

    pub fn conclude(&self, view: View, goal: i64) {
        let _ = self.submit(Job::Conclude { view, goal });
    }

    pub fn abort(&self) {
        let _ = self.submit(Job::Abort);
    }

    /// Stop talking to an agent that missed a deadline.
    pub fn wedge(&mut self) {
        if !self.wedged {
            warn!("Seat {} ({}) abandoned after missing its deadline", self.role, self.agent_name);
        }
        self.wedged = true;
        self.jobs = None;
        self.handle = None;
    }

    /// Close the job queue and give the worker a short grace period to
    /// drain it. Wedged seats are not waited for.
    pub fn close(&mut self) {
        self.jobs = None;
        let Some(handle) = self.handle.take() else {
            return;
        };
        match self.exited.recv_deadline(Instant::now() + SHUTDOWN_GRACE) {
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
            }
            _ => debug!("Seat {} still busy at shutdown; detaching", self.role),
        }
    }

    fn submit(&self, job: Job) -> Result<(), AgentError> {
        let jobs = self.jobs.as_ref().ok_or(AgentError::Disconnected)?;
        jobs.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => AgentError::Failed(format!("seat {} is backlogged", self.role)),
            TrySendError::Disconnected(_) => AgentError::Disconnected,
        })
    }
}

impl Drop for Seat {
    fn drop(&mut self) {
        if !self.wedged {
            self.close();
        }
    }
}

fn serve(mut agent: Box<dyn Agent>, jobs: Receiver<Job>) {
    // A failed start poisons every later request.
    let mut started: Result<(), AgentError> = Ok(());
    while let Ok(job) = jobs.recv() {
        match job {
            Job::Prepare { info, reply } => {
                started = agent.prepare(&info);
                let _ = reply.send(Reply::now(started.clone()));
            }
            Job::Propose { request, reply } => {
                let result = match &started {
                    Ok(()) => agent.propose_move(&request),
                    Err(err) => Err(err.clone()),
                };
                let _ = reply.send(Reply::now(result));
            }
            Job::Conclude { view, goal } => agent.conclude(&view, goal),
            Job::Abort => agent.abort(),
        }
    }
}
