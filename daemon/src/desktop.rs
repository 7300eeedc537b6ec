//! The desktop compositor side of a wallpaper.

/// Whatever composes wallpaper windows into the desktop.
///
/// Sessions call [`Desktop::refresh`] once their process is gone, so a vanished wallpaper window
/// is reflected immediately.
pub trait Desktop: Send + Sync {
    fn refresh(&self);
}
