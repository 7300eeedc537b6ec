//! A session supervises one player process bound to one screen.
//!
//! Working cycle of a session:
//! 1. [`Session::show`] spawns the player with all three standard streams piped.
//! 2. A supervise task reads stdout line by line. The first startup record is turned into the
//!    one and only [`InitEvent`], everything is logged.
//! 3. Commands go to stdin whenever the owner likes, even before the handshake.
//! 4. Once the process is gone, for whatever reason, the session enters [`State::Exited`] and
//!    asks the [`Desktop`] to refresh.
//!
//! Nothing here is retried. Failures either end up in the [`InitEvent`] or in the log.

mod state;
mod supervise;

pub use state::State;

use smol::Task;
use smol::channel::{Receiver, Sender};
use smol::process::Stdio;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::backends::Backend;
use crate::channel::{CommandChannel, Delivery, PlayerCmd};
use crate::config::SupervisorConfig;
use crate::content::{ContentDescriptor, Screen};
use crate::desktop::Desktop;
use crate::events::{InitEvent, Notifier, SessionError};
use crate::handshake::{self, WindowHandle};
use state::AtomicState;

/// State reachable from the supervise task.
struct Shared {
    label: String,
    state: AtomicState,
    handle: OnceLock<WindowHandle>,
    pid: OnceLock<u32>,
    notifier: Notifier,
    channel: CommandChannel,
    desktop: Arc<dyn Desktop>,
    kill: (Sender<()>, Receiver<()>),
}

pub struct Session<B: Backend> {
    backend: B,
    config: SupervisorConfig,
    content: ContentDescriptor,
    screen: Mutex<Screen>,
    shared: Arc<Shared>,
    supervisor: Mutex<Option<Task<()>>>,
}

impl Shared {
    /// Handles one line of player output.
    fn on_line(&self, line: &str) {
        if line.is_empty() {
            return;
        }
        if handshake::is_startup_record(line) && !self.notifier.is_reported() {
            self.notifier.report_with(|| self.handshake(line));
        }
        log::info!("{}: {line}", self.label);
    }

    /// Only runs for the record that decides the outcome.
    fn handshake(&self, line: &str) -> InitEvent {
        let message = format!("player handle: {line}");
        let parsed = handshake::parse(line);
        if let Ok(handle) = &parsed {
            // Stored even when null, the event tells the owner it is unusable.
            let _ = self.handle.set(*handle);
        }
        self.state.advance(State::AwaitingHandshake, State::Ready);
        match parsed {
            Ok(handle) if handle.is_null() => InitEvent::failed(SessionError::ZeroHandle, message),
            Ok(_) => InitEvent::ready(message),
            Err(err) => InitEvent::failed(err.into(), message),
        }
    }

    /// Final step of every session. Runs once, however many paths lead here.
    fn teardown(&self) {
        if self.state.exit() {
            log::info!("{}: exited", self.label);
            self.desktop.refresh();
        }
    }
}

impl<B: Backend> Session<B> {
    /// Creates a session. Nothing is spawned until [`Session::show`].
    #[must_use]
    pub fn new(
        backend: B,
        config: SupervisorConfig,
        content: ContentDescriptor,
        screen: Screen,
        desktop: Arc<dyn Desktop>,
    ) -> Self {
        let label = format!("{}[{screen}]", backend.get_name());
        Self {
            shared: Arc::new(Shared {
                channel: CommandChannel::new(label.clone()),
                label,
                state: AtomicState::new(),
                handle: OnceLock::new(),
                pid: OnceLock::new(),
                notifier: Notifier::new(),
                desktop,
                kill: smol::channel::bounded(1),
            }),
            backend,
            config,
            content,
            screen: Mutex::new(screen),
            supervisor: Mutex::new(None),
        }
    }

    /// Spawns the player and starts supervising it.
    ///
    /// Returns immediately, the outcome arrives through [`Session::initialized`].
    /// If the player cannot be spawned, the session is torn down right away.
    pub fn show(&self) {
        let mut supervisor = self.supervisor.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.shared.state.advance(State::Created, State::Starting) {
            log::warn!("{}: already shown, ignoring", self.shared.label);
            return;
        }

        let mut sys_cmd = self.backend.get_sys_command(&self.config, &self.content);
        sys_cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match sys_cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                log::error!("{}: cannot spawn the player: {err}", self.shared.label);
                self.shared.notifier.report(InitEvent::failed(
                    SessionError::LaunchFailed(err.to_string()),
                    "Failed to start process.",
                ));
                self.shared.teardown();
                return;
            }
        };
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            // Dropping the child kills it
            self.shared.notifier.report(InitEvent::failed(
                SessionError::LaunchFailed("standard streams are not piped".to_string()),
                "Failed to start process.",
            ));
            self.shared.teardown();
            return;
        };
        let _ = self.shared.pid.set(child.id());
        log::info!("{}: started, pid {}", self.shared.label, child.id());

        self.shared.channel.attach(stdin);
        self.shared
            .state
            .advance(State::Starting, State::AwaitingHandshake);
        *supervisor = Some(smol::spawn(supervise::supervise(
            self.shared.clone(),
            child,
            stdout,
            self.config.handshake_timeout,
        )));
    }

    /// Asks the player to quit by itself, killing it if even that cannot be delivered.
    pub async fn close(&self) {
        if self.send(&PlayerCmd::Terminate.encode()).await.is_delivered() {
            self.shared.state.terminating();
        } else {
            self.terminate();
        }
    }

    /// Kills the player.
    ///
    /// Safe to call at any time and any number of times; killing a dead process does nothing.
    pub fn terminate(&self) {
        let supervisor = self.supervisor.lock().unwrap_or_else(PoisonError::into_inner);
        match self.shared.state.terminating() {
            State::Exited => log::debug!("{}: already exited", self.shared.label),
            _ if supervisor.is_none() => self.shared.teardown(),
            _ => {
                // Full means a kill is already pending
                let _ = self.shared.kill.0.try_send(());
            }
        }
    }

    /// Writes one line to the player's stdin.
    pub async fn send(&self, message: &str) -> Delivery {
        self.shared.channel.send(message).await
    }

    pub async fn command(&self, cmd: &PlayerCmd) -> Delivery {
        self.send(&cmd.encode()).await
    }

    pub async fn play(&self) -> Delivery {
        self.command(&PlayerCmd::Play).await
    }

    pub async fn pause(&self) -> Delivery {
        self.command(&PlayerCmd::Pause).await
    }

    pub async fn set_volume(&self, volume: i32) -> Delivery {
        self.command(&PlayerCmd::Volume(volume)).await
    }

    /// Waits for the initialization outcome.
    pub async fn initialized(&self) -> InitEvent {
        self.shared.notifier.wait().await
    }

    /// The initialization outcome, if there is one yet.
    #[must_use]
    pub fn try_initialized(&self) -> Option<InitEvent> {
        self.shared.notifier.get()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.shared.state.get()
    }

    /// The player's window, once the handshake produced one.
    #[must_use]
    pub fn window_handle(&self) -> Option<WindowHandle> {
        self.shared.handle.get().copied()
    }

    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.shared.pid.get().copied()
    }

    #[must_use]
    pub fn content(&self) -> &ContentDescriptor {
        &self.content
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rebinds the session to another screen. The process is left alone.
    pub fn set_screen(&self, screen: Screen) {
        log::info!("{}: moved to {screen}", self.shared.label);
        *self.screen.lock().unwrap_or_else(PoisonError::into_inner) = screen;
    }
}

impl<B: Backend> Drop for Session<B> {
    /// The process does not outlive its session.
    fn drop(&mut self) {
        let supervisor = self
            .supervisor
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = supervisor {
            if self.shared.state.terminating() != State::Exited {
                let _ = self.shared.kill.0.try_send(());
            }
            // Left running so the kill is reaped and the desktop refreshed
            task.detach();
        }
    }
}
