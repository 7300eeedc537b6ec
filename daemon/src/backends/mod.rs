mod libmpv;

pub use libmpv::LibMpv;

use smol::process::Command;

use crate::config::SupervisorConfig;
use crate::content::ContentDescriptor;

/// General trait of a backend.
///
/// A backend only knows how to build the player's command line. Standard streams are piped by
/// the session afterwards, whatever the backend sets.
pub trait Backend {
    fn get_name(&self) -> String;

    fn get_sys_command(&self, config: &SupervisorConfig, content: &ContentDescriptor) -> Command;
}
