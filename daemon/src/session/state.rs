//! Lifecycle of a session.
//!
//! ```text
//! Created -> Starting -> AwaitingHandshake -> Ready
//!    \___________\______________\______________\___> Terminating -> Exited
//! ```
//! Forward steps only succeed from the state they expect, so each happens at most once.
//! [`State::Exited`] is entered exactly once, whoever gets there first does the cleanup.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum State {
    Created = 0,
    Starting = 1,
    AwaitingHandshake = 2,
    /// The startup record has been consumed, successfully or not.
    Ready = 3,
    Terminating = 4,
    Exited = 5,
}

impl State {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Starting,
            2 => Self::AwaitingHandshake,
            3 => Self::Ready,
            4 => Self::Terminating,
            _ => Self::Exited,
        }
    }
}

pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(State::Created as u8))
    }

    pub(crate) fn get(&self) -> State {
        State::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `from -> to`. Fails if the state is anything but `from`.
    pub(crate) fn advance(&self, from: State, to: State) -> bool {
        let moved = self
            .0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if moved {
            log::debug!("session state {from:?} -> {to:?}");
        }
        moved
    }

    /// Moves to [`State::Terminating`] unless already exited.
    /// Returns the state it left.
    pub(crate) fn terminating(&self) -> State {
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != State::Exited as u8).then_some(State::Terminating as u8)
            })
            .unwrap_or_else(|current| current);
        State::from_u8(previous)
    }

    /// Moves to [`State::Exited`]. Only the first call returns `true`.
    pub(crate) fn exit(&self) -> bool {
        let previous = State::from_u8(self.0.swap(State::Exited as u8, Ordering::AcqRel));
        if previous == State::Exited {
            return false;
        }
        log::debug!("session state {previous:?} -> Exited");
        true
    }
}
