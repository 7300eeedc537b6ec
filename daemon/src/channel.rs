//! Commands written to the player's stdin, one per line.
//!
//! Sending is fire-and-forget. Nothing acknowledges a command, and a failed write is logged
//! and reported as [`Delivery::Failed`], never as an error.

use smol::io::AsyncWriteExt;
use smol::lock::Mutex;
use smol::process::ChildStdin;

pub const TERMINATE: &str = "lively:terminate";
pub const PAUSE: &str = "lively:vid-pause";
pub const PLAY: &str = "lively:vid-play";
pub const VOLUME: &str = "lively:vid-volume";

/// Known player commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCmd {
    Terminate,
    Pause,
    Play,
    Volume(i32),
    /// Anything else, sent as is.
    Raw(String),
}

impl PlayerCmd {
    /// The protocol line for this command, without the newline.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Terminate => TERMINATE.to_string(),
            Self::Pause => PAUSE.to_string(),
            Self::Play => PLAY.to_string(),
            Self::Volume(level) => format!("{VOLUME} {level}"),
            Self::Raw(line) => line.clone(),
        }
    }
}

/// Whether a command reached the player's stdin.
///
/// `Delivered` only means the write succeeded, not that the player acted on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Failed,
}

impl Delivery {
    #[must_use]
    pub fn is_delivered(self) -> bool {
        self == Self::Delivered
    }
}

/// Write end of the player's stdin.
pub(crate) struct CommandChannel {
    label: String,
    stdin: Mutex<Option<ChildStdin>>,
}

impl CommandChannel {
    pub(crate) fn new(label: String) -> Self {
        Self {
            label,
            stdin: Mutex::new(None),
        }
    }

    /// Only contended by concurrent sends, which hold the lock for one write.
    pub(crate) fn attach(&self, stdin: ChildStdin) {
        *self.stdin.lock_blocking() = Some(stdin);
    }

    /// Closes the pipe. Everything sent afterwards fails.
    pub(crate) async fn detach(&self) {
        self.stdin.lock().await.take();
    }

    pub(crate) async fn send(&self, message: &str) -> Delivery {
        let mut stdin = self.stdin.lock().await;
        let Some(pipe) = stdin.as_mut() else {
            log::warn!("{}: cannot send `{message}`, no process", self.label);
            return Delivery::Failed;
        };
        match write_line(pipe, message).await {
            Ok(()) => {
                log::debug!("{}: sent `{message}`", self.label);
                Delivery::Delivered
            }
            Err(err) => {
                log::warn!("{}: cannot send `{message}`: {err}", self.label);
                Delivery::Failed
            }
        }
    }
}

async fn write_line(pipe: &mut ChildStdin, message: &str) -> std::io::Result<()> {
    let mut line = String::with_capacity(message.len() + 1);
    line.push_str(message);
    line.push('\n');
    pipe.write_all(line.as_bytes()).await?;
    pipe.flush().await
}
