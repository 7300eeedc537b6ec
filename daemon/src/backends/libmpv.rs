//! Command line of the external libmpv player.

use smol::process::Command;

use crate::backends::Backend;
use crate::config::SupervisorConfig;
use crate::content::ContentDescriptor;

/// The libmpv based video player plugin.
#[derive(Debug, Default, Clone)]
pub struct LibMpv;

impl Backend for LibMpv {
    fn get_name(&self) -> String {
        "libmpvplayer".to_string()
    }

    /// Gets the [`Command`] to start the player.
    fn get_sys_command(&self, config: &SupervisorConfig, content: &ContentDescriptor) -> Command {
        let mut sys_cmd = Command::new(&config.binary);
        sys_cmd.args(Self::arguments(config, content));
        if let Some(value) = &config.working_dir {
            sys_cmd.current_dir(value);
        }
        sys_cmd
    }
}

impl LibMpv {
    /// Arguments in the order the player expects them.
    #[must_use]
    pub fn arguments(config: &SupervisorConfig, content: &ContentDescriptor) -> Vec<String> {
        vec![
            "--path".to_string(),
            content.path().to_string_lossy().into_owned(),
            "--stream".to_string(),
            content.stream().value().to_string(),
            "--stretch".to_string(),
            content.scaler().value().to_string(),
            "--datadir".to_string(),
            config.data_dir.to_string_lossy().into_owned(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Scaler, StreamQuality};

    #[test]
    fn building_arguments() {
        let config = SupervisorConfig::new("libmpvplayer", "/home/me/.local/share/mpvwalld");
        let content = ContentDescriptor::new("my video.mp4", Scaler::Fit, StreamQuality::Lowest);
        assert_eq!(
            LibMpv::arguments(&config, &content),
            vec![
                "--path",
                "my video.mp4",
                "--stream",
                "0",
                "--stretch",
                "1",
                "--datadir",
                "/home/me/.local/share/mpvwalld",
            ]
        );
    }
}
