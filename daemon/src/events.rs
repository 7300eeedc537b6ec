//! Initialization outcome of a session.
//!
//! A session reports exactly one [`InitEvent`]. The first report latches, every later one is
//! dropped. Owners either await it with [`Notifier::wait`] or poll [`Notifier::get`].

use smol::channel::{Receiver, Sender};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::handshake::HandshakeError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("cannot spawn the player: {0}")]
    LaunchFailed(String),
    #[error("malformed startup record: {0}")]
    Handshake(#[from] HandshakeError),
    #[error("the player reported a null window handle")]
    ZeroHandle,
    #[error("the player exited unexpectedly")]
    PrematureExit,
    #[error("the player did not report its window in time")]
    HandshakeTimeout,
}

/// How the startup of a session went.
#[derive(Debug, Clone, PartialEq)]
pub struct InitEvent {
    pub success: bool,
    pub error: Option<SessionError>,
    pub message: Option<String>,
}

impl InitEvent {
    #[must_use]
    pub fn ready(message: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn failed(error: SessionError, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error),
            message: Some(message.into()),
        }
    }
}

/// Single-shot holder of the [`InitEvent`].
pub(crate) struct Notifier {
    claimed: AtomicBool,
    outcome: OnceLock<InitEvent>,
    tx: Sender<InitEvent>,
    rx: Receiver<InitEvent>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (tx, rx) = smol::channel::bounded(1);
        Self {
            claimed: AtomicBool::new(false),
            outcome: OnceLock::new(),
            tx,
            rx,
        }
    }

    /// Publishes the outcome unless one has been published already.
    ///
    /// Returns whether this call was the one that got published.
    pub(crate) fn report(&self, event: InitEvent) -> bool {
        if !self.claim() {
            log::debug!("dropping init report {event:?}, already initialized");
            return false;
        }
        self.publish(event);
        true
    }

    /// Like [`Notifier::report`], but `build` only runs for the report that wins.
    ///
    /// Whatever `build` records next to the event is never seen by a session whose outcome was
    /// decided elsewhere.
    pub(crate) fn report_with(&self, build: impl FnOnce() -> InitEvent) -> bool {
        if !self.claim() {
            log::debug!("dropping init report, already initialized");
            return false;
        }
        self.publish(build());
        true
    }

    fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    fn publish(&self, event: InitEvent) {
        if !event.success {
            log::warn!(
                "initialization failed: {}",
                event.message.as_deref().unwrap_or("no message")
            );
        }
        // Only the claimer gets here
        let _ = self.outcome.set(event.clone());
        // Capacity is 1 and this is the only send, so it cannot be full.
        let _ = self.tx.try_send(event);
        self.tx.close();
    }

    pub(crate) fn is_reported(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    pub(crate) fn get(&self) -> Option<InitEvent> {
        self.outcome.get().cloned()
    }

    /// Waits for the outcome. Every caller observes the same event.
    pub(crate) async fn wait(&self) -> InitEvent {
        loop {
            if let Some(event) = self.get() {
                return event;
            }
            // Either the event itself, or `Closed` once someone else consumed it.
            let _ = self.rx.recv().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once() {
        let notifier = Notifier::new();
        assert!(notifier.get().is_none());
        assert!(notifier.report(InitEvent::ready("first")));
        assert!(!notifier.report(InitEvent::failed(SessionError::PrematureExit, "second")));
        assert_eq!(notifier.get(), Some(InitEvent::ready("first")));
    }

    #[test]
    fn every_waiter_sees_the_event() {
        let notifier = Notifier::new();
        notifier.report(InitEvent::failed(SessionError::ZeroHandle, "zero"));
        smol::block_on(async {
            let first = notifier.wait().await;
            let second = notifier.wait().await;
            assert_eq!(first, second);
            assert_eq!(first.error, Some(SessionError::ZeroHandle));
        });
    }

    #[test]
    fn losing_report_builds_nothing() {
        let notifier = Notifier::new();
        assert!(notifier.report(InitEvent::failed(SessionError::HandshakeTimeout, "late")));
        assert!(!notifier.report_with(|| panic!("built after the outcome was decided")));
        assert_eq!(
            notifier.get().and_then(|event| event.error),
            Some(SessionError::HandshakeTimeout)
        );

        let notifier = Notifier::new();
        assert!(notifier.report_with(|| InitEvent::ready("HWND5")));
        assert!(notifier.is_reported());
        assert!(!notifier.report(InitEvent::failed(SessionError::HandshakeTimeout, "late")));
        assert_eq!(notifier.get(), Some(InitEvent::ready("HWND5")));
    }
}
