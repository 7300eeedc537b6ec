//! Explicit configuration handed to every session.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default player executable, looked up in `$PATH`.
pub const DEFAULT_BINARY: &str = "libmpvplayer";

#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorConfig {
    /// Player executable.
    pub binary: PathBuf,
    /// Private runtime data directory of the player, passed as `--datadir`.
    pub data_dir: PathBuf,
    /// Working directory of the player. Inherited when unset.
    pub working_dir: Option<PathBuf>,
    /// Gives up waiting for the handshake after this long.
    /// `None` waits for as long as the process lives.
    pub handshake_timeout: Option<Duration>,
}

impl SupervisorConfig {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            data_dir: data_dir.into(),
            working_dir: None,
            handshake_timeout: None,
        }
    }
}

/// Where the player keeps its runtime data.
#[must_use]
pub fn sys_data_dir() -> PathBuf {
    if let Ok(mut value) = env::var("XDG_DATA_HOME") {
        value.push_str("/mpvwalld");
        return PathBuf::from(value);
    }
    if let Ok(mut value) = env::var("HOME") {
        value.push_str("/.local/share/mpvwalld");
        return PathBuf::from(value);
    }
    // This is not persistent anyhow
    PathBuf::from("/tmp/mpvwalld")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Due to [`env::set_var()`] not being thread-safe, just chain them so the variables are not
    // messed around.
    #[test]
    fn getting_locations() {
        unsafe {
            env::set_var("XDG_DATA_HOME", "/some_datay_place");
            assert_eq!(sys_data_dir(), PathBuf::from("/some_datay_place/mpvwalld"));
            env::remove_var("XDG_DATA_HOME");
            env::set_var("HOME", "/somewhere");
            assert_eq!(
                sys_data_dir(),
                PathBuf::from("/somewhere/.local/share/mpvwalld")
            );
            env::remove_var("HOME");
            assert_eq!(sys_data_dir(), PathBuf::from("/tmp/mpvwalld"));
        }
    }

    #[test]
    fn explicit_config() {
        let config = SupervisorConfig::new("/opt/player", "/var/lib/player");
        assert_eq!(config.binary, PathBuf::from("/opt/player"));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/player"));
        assert!(config.working_dir.is_none());
        assert!(config.handshake_timeout.is_none());
    }
}
