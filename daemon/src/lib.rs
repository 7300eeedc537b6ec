pub mod backends;
pub mod channel;
pub mod config;
pub mod content;
pub mod daemon;
pub mod desktop;
pub mod events;
pub mod handshake;
pub mod session;

pub use channel::{Delivery, PlayerCmd};
pub use config::SupervisorConfig;
pub use content::{ContentDescriptor, Scaler, Screen, StreamQuality};
pub use daemon::{DaemonError, start};
pub use desktop::Desktop;
pub use events::{InitEvent, SessionError};
pub use handshake::WindowHandle;
pub use session::{Session, State};
