//! The startup record of the player.
//!
//! Once the player has created its window it prints one line `HWND<digits>` on stdout, the
//! digits being the window handle in base 10. Only the first such line means anything.

use nom::bytes::complete::tag;
use nom::character::complete::{i32 as int32, space0};
use nom::combinator::eof;
use nom::sequence::{delimited, terminated};
use nom::{Finish, IResult, Parser};
use std::fmt;
use thiserror::Error;

/// Marker that starts the startup record.
pub const MARKER: &str = "HWND";

/// Platform handle of the player's window, opaque to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(i64);

impl WindowHandle {
    #[must_use]
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandshakeError {
    /// The line does not start with [`MARKER`].
    #[error("line does not start with `{MARKER}`")]
    MissingMarker,
    /// Whatever follows the marker is not a 32 bit base 10 integer.
    #[error("`{0}` is not a valid window handle")]
    InvalidHandle(String),
}

/// Whether this line is meant as the startup record.
#[must_use]
pub fn is_startup_record(line: &str) -> bool {
    line.contains(MARKER)
}

fn parse_record(input: &str) -> IResult<&str, i32> {
    let (input, _) = tag(MARKER).parse(input)?;
    terminated(delimited(space0, int32, space0), eof).parse(input)
}

/// Parses a startup record into the [`WindowHandle`] it carries.
///
/// A zero handle is returned as is, judging it is up to the caller.
///
/// # Errors
/// [`HandshakeError::MissingMarker`] if the line does not begin with [`MARKER`],
/// [`HandshakeError::InvalidHandle`] if the payload is empty, non-numeric or out of range.
pub fn parse(line: &str) -> Result<WindowHandle, HandshakeError> {
    match parse_record(line).finish() {
        Ok((_, raw)) => Ok(WindowHandle(i64::from(raw))),
        Err(nom::error::Error {
            input: _,
            code: nom::error::ErrorKind::Tag,
        }) if !line.starts_with(MARKER) => Err(HandshakeError::MissingMarker),
        Err(_) => Err(HandshakeError::InvalidHandle(
            line.get(MARKER.len()..).unwrap_or_default().to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognising_records() {
        assert!(is_startup_record("HWND12345"));
        assert!(is_startup_record("mpv: HWND12345"));
        assert!(!is_startup_record("lively:vid-fps 60"));
        assert!(!is_startup_record("hwnd12345"));
    }

    #[test]
    fn parsing_handles() {
        assert_eq!(parse("HWND12345"), Ok(WindowHandle::new(12345)));
        assert_eq!(parse("HWND-42"), Ok(WindowHandle::new(-42)));
        assert_eq!(parse("HWND 7 "), Ok(WindowHandle::new(7)));
        assert!(parse("HWND0").unwrap().is_null());
    }

    #[test]
    fn parsing_error() {
        assert_eq!(
            parse("HWNDabc"),
            Err(HandshakeError::InvalidHandle("abc".to_string()))
        );
        assert_eq!(
            parse("HWND"),
            Err(HandshakeError::InvalidHandle(String::new()))
        );
        assert_eq!(
            parse("HWND12x"),
            Err(HandshakeError::InvalidHandle("12x".to_string()))
        );
        assert_eq!(
            parse("HWND99999999999"),
            Err(HandshakeError::InvalidHandle("99999999999".to_string()))
        );
        assert_eq!(parse("mpv: HWND1"), Err(HandshakeError::MissingMarker));
    }
}
