//! Async tasks watching a running player.

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use smol::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use smol::process::{Child, ChildStderr, ChildStdout};
use std::sync::Arc;
use std::time::Duration;

use crate::events::{InitEvent, SessionError};
use crate::session::Shared;

/// How long output already on its way is still read once the process is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Longest line taken from the player, in bytes.
const MAX_LINE: u64 = 64 * 1024;

/// Owns the child until it exits, then tears the session down.
pub(super) async fn supervise(
    shared: Arc<Shared>,
    mut child: Child,
    stdout: ChildStdout,
    handshake_timeout: Option<Duration>,
) {
    let reader = smol::spawn(read_output(shared.clone(), stdout));
    let errors = child
        .stderr
        .take()
        .map(|stderr| smol::spawn(read_errors(shared.label.clone(), stderr)));
    let timer =
        handshake_timeout.map(|timeout| smol::spawn(handshake_timer(shared.clone(), timeout)));

    let killed = smol::future::race(
        async {
            match child.status().await {
                Ok(status) => log::info!("{}: player exited ({status})", shared.label),
                Err(err) => log::warn!("{}: lost track of the player: {err}", shared.label),
            }
            false
        },
        async {
            match shared.kill.1.recv().await {
                Ok(()) => true,
                // The session keeps the sender, this cannot close before we are done
                Err(_) => smol::future::pending().await,
            }
        },
    )
    .await;

    if killed {
        force_kill(&shared.label, &mut child);
        match child.status().await {
            Ok(status) => log::info!("{}: player killed ({status})", shared.label),
            Err(err) => log::warn!("{}: lost track of the player: {err}", shared.label),
        }
    }

    smol::future::race(reader, async {
        smol::Timer::after(DRAIN_GRACE).await;
        log::debug!("{}: stdout still open, stop reading", shared.label);
    })
    .await;
    drop(errors);
    drop(timer);

    if !shared.notifier.is_reported() {
        shared.notifier.report(InitEvent::failed(
            SessionError::PrematureExit,
            "Process exited before giving HWND.",
        ));
    }
    shared.channel.detach().await;
    drop(child);
    shared.teardown();
}

/// Sends SIGKILL. A process that is already gone is not an error.
fn force_kill(label: &str, child: &mut Child) {
    let Ok(raw) = i32::try_from(child.id()) else {
        if let Err(err) = child.kill() {
            log::warn!("{label}: failed to kill the player: {err}");
        }
        return;
    };
    match kill(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => log::debug!("{label}: sent SIGKILL"),
        Err(Errno::ESRCH) => log::debug!("{label}: already exited"),
        Err(err) => log::warn!("{label}: failed to kill the player: {err}"),
    }
}

/// The only reader of the player's stdout.
async fn read_output(shared: Arc<Shared>, stdout: ChildStdout) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        match next_line(&shared.label, &mut reader, &mut buf).await {
            Ok(true) => {
                let line = String::from_utf8_lossy(&buf);
                shared.on_line(line.trim_end_matches(['\n', '\r']));
            }
            // EOF
            Ok(false) => break,
            Err(err) => {
                log::warn!("{}: cannot read player output: {err}", shared.label);
                break;
            }
        }
    }
}

/// Keeps stderr from filling up, nothing in there is protocol.
async fn read_errors(label: String, stderr: ChildStderr) {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    while let Ok(true) = next_line(&label, &mut reader, &mut buf).await {
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if !line.is_empty() {
            log::debug!("{label} stderr: {line}");
        }
    }
}

/// Reads the next line into `buf`, dropping lines longer than [`MAX_LINE`].
///
/// Returns `false` at EOF.
async fn next_line<R: AsyncBufRead + Unpin>(
    label: &str,
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> io::Result<bool> {
    let mut dropping = false;
    loop {
        buf.clear();
        let read = (&mut *reader).take(MAX_LINE).read_until(b'\n', buf).await?;
        if read == 0 {
            return Ok(false);
        }
        let complete = buf.last() == Some(&b'\n');
        if dropping {
            dropping = !complete;
            continue;
        }
        if !complete && u64::try_from(read) == Ok(MAX_LINE) {
            log::warn!("{label}: dropping a line longer than {MAX_LINE} bytes");
            dropping = true;
            continue;
        }
        return Ok(true);
    }
}

async fn handshake_timer(shared: Arc<Shared>, timeout: Duration) {
    smol::Timer::after(timeout).await;
    shared.notifier.report(InitEvent::failed(
        SessionError::HandshakeTimeout,
        format!("No HWND within {timeout:?}."),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_long_lines() {
        let mut input = vec![b'x'; usize::try_from(MAX_LINE).unwrap() * 2 + 10];
        input.extend_from_slice(b"\nHWND5\r\nlast words");
        let mut reader = BufReader::new(input.as_slice());
        let mut buf = Vec::new();
        smol::block_on(async {
            assert!(next_line("test", &mut reader, &mut buf).await.unwrap());
            assert_eq!(buf, b"HWND5\r\n");
            assert!(next_line("test", &mut reader, &mut buf).await.unwrap());
            assert_eq!(buf, b"last words");
            assert!(!next_line("test", &mut reader, &mut buf).await.unwrap());
        });
    }

    #[test]
    fn line_of_exactly_the_limit() {
        let mut input = vec![b'x'; usize::try_from(MAX_LINE).unwrap() - 1];
        input.push(b'\n');
        let mut reader = BufReader::new(input.as_slice());
        let mut buf = Vec::new();
        smol::block_on(async {
            assert!(next_line("test", &mut reader, &mut buf).await.unwrap());
            assert_eq!(buf.len(), input.len());
        });
    }
}
