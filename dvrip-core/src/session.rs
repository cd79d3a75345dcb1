//! Session state tracking
//!
//! A session represents one authenticated connection to a device and
//! tracks:
//! - Session ID (assigned by device on login)
//! - Sequence counter (increments per request)
//! - Lifecycle state

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection
    Disconnected,

    /// TCP connect in progress
    Connecting,

    /// Connected, login exchange in progress
    Authenticating,

    /// Authenticated and accepting commands
    Ready,

    /// Orderly shutdown in progress
    Closing,

    /// Orderly shutdown complete (terminal)
    Closed,

    /// Unrecoverable transport or protocol failure (terminal)
    Failed,
}

impl SessionState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// Session bookkeeping shared between the caller, the reader task and
/// the keepalive task.
///
/// Thread-safe and cheap to clone (`Arc` internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Session ID assigned by device (0 before login)
    session_id: AtomicU32,

    /// Sequence counter; each request takes the next value
    sequence: AtomicU32,

    /// Current lifecycle state
    state: parking_lot::RwLock<SessionState>,

    /// Instant of the last observed inbound frame
    last_activity: parking_lot::Mutex<Instant>,
}

impl Session {
    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                session_id: AtomicU32::new(0),
                sequence: AtomicU32::new(0),
                state: parking_lot::RwLock::new(SessionState::Disconnected),
                last_activity: parking_lot::Mutex::new(Instant::now()),
            }),
        }
    }

    /// Device-assigned session ID (0 before login)
    pub fn id(&self) -> u32 {
        self.inner.session_id.load(Ordering::Acquire)
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    /// Whether commands may currently be issued
    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Allocate the next sequence number.
    ///
    /// Monotonically increasing, never reused within one session. The
    /// u32 range makes overflow unreachable in practice.
    pub fn next_sequence(&self) -> u32 {
        self.inner.sequence.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Move `Disconnected -> Connecting`
    pub fn begin_connect(&self) -> Result<()> {
        self.transition(SessionState::Disconnected, SessionState::Connecting)
    }

    /// Move `Connecting -> Authenticating`
    pub fn begin_login(&self) -> Result<()> {
        self.transition(SessionState::Connecting, SessionState::Authenticating)
    }

    /// Record the device-assigned ID and move `Authenticating -> Ready`
    pub fn ready(&self, session_id: u32) -> Result<()> {
        let mut state = self.inner.state.write();
        if *state != SessionState::Authenticating {
            return Err(Error::InvalidSessionState(format!(
                "cannot become ready from {:?}",
                *state
            )));
        }
        self.inner.session_id.store(session_id, Ordering::Release);
        *state = SessionState::Ready;
        Ok(())
    }

    /// Move any non-terminal state to `Closing`
    pub fn begin_close(&self) {
        let mut state = self.inner.state.write();
        if !state.is_terminal() {
            *state = SessionState::Closing;
        }
    }

    /// Move to the `Closed` terminal state
    pub fn closed(&self) {
        let mut state = self.inner.state.write();
        if *state != SessionState::Failed {
            *state = SessionState::Closed;
        }
    }

    /// Move any non-terminal state to the `Failed` terminal state.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn fail(&self) -> bool {
        let mut state = self.inner.state.write();
        if state.is_terminal() {
            return false;
        }
        *state = SessionState::Failed;
        true
    }

    /// Note session-layer traffic, for idle-timeout accounting
    pub fn touch(&self) {
        *self.inner.last_activity.lock() = Instant::now();
    }

    /// Instant of the last observed inbound frame
    pub fn last_activity(&self) -> Instant {
        *self.inner.last_activity.lock()
    }

    fn transition(&self, from: SessionState, to: SessionState) -> Result<()> {
        let mut state = self.inner.state.write();
        if *state != from {
            return Err(Error::InvalidSessionState(format!(
                "cannot move to {:?} from {:?}",
                to, *state
            )));
        }
        *state = to;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
