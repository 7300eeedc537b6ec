//! What the player is asked to render, and where.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum ParseError {
    /// Neither a known name nor a known numeric value.
    #[error("unrecognised value `{0}`")]
    UnknownValue(String),
}

/// Streaming quality the player should prefer for online sources.
///
/// The numeric value is what goes on the player's command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StreamQuality {
    Lowest = 0,
    Low = 1,
    LowMedium = 2,
    Medium = 3,
    MediumHigh = 4,
    High = 5,
    #[default]
    Highest = 6,
}

impl StreamQuality {
    const ALL: [Self; 7] = [
        Self::Lowest,
        Self::Low,
        Self::LowMedium,
        Self::Medium,
        Self::MediumHigh,
        Self::High,
        Self::Highest,
    ];

    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl FromStr for StreamQuality {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = value.parse::<u8>() {
            return Self::ALL
                .into_iter()
                .find(|quality| quality.value() == number)
                .ok_or_else(|| ParseError::UnknownValue(value.to_string()));
        }
        match value.to_ascii_lowercase().as_str() {
            "lowest" => Ok(Self::Lowest),
            "low" => Ok(Self::Low),
            "lowmedium" => Ok(Self::LowMedium),
            "medium" => Ok(Self::Medium),
            "mediumhigh" => Ok(Self::MediumHigh),
            "high" => Ok(Self::High),
            "highest" => Ok(Self::Highest),
            _ => Err(ParseError::UnknownValue(value.to_string())),
        }
    }
}

/// How the content is fitted onto the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Scaler {
    #[default]
    Fill = 0,
    Fit = 1,
    Stretch = 2,
    Tile = 3,
    Center = 4,
    Span = 5,
}

impl Scaler {
    const ALL: [Self; 6] = [
        Self::Fill,
        Self::Fit,
        Self::Stretch,
        Self::Tile,
        Self::Center,
        Self::Span,
    ];

    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl FromStr for Scaler {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = value.parse::<u8>() {
            return Self::ALL
                .into_iter()
                .find(|scaler| scaler.value() == number)
                .ok_or_else(|| ParseError::UnknownValue(value.to_string()));
        }
        match value.to_ascii_lowercase().as_str() {
            "fill" => Ok(Self::Fill),
            "fit" => Ok(Self::Fit),
            "stretch" => Ok(Self::Stretch),
            "tile" => Ok(Self::Tile),
            "center" => Ok(Self::Center),
            "span" => Ok(Self::Span),
            _ => Err(ParseError::UnknownValue(value.to_string())),
        }
    }
}

/// The media a session renders. Fixed for the whole life of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDescriptor {
    path: PathBuf,
    scaler: Scaler,
    stream: StreamQuality,
}

impl ContentDescriptor {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, scaler: Scaler, stream: StreamQuality) -> Self {
        Self {
            path: path.into(),
            scaler,
            stream,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn scaler(&self) -> Scaler {
        self.scaler
    }

    #[must_use]
    pub fn stream(&self) -> StreamQuality {
        self.stream
    }
}

/// A logical display, identified by its output name (e.g. `eDP-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Screen(String);

impl Screen {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_stream_quality() {
        assert_eq!("0".parse(), Ok(StreamQuality::Lowest));
        assert_eq!("Highest".parse(), Ok(StreamQuality::Highest));
        assert_eq!("mediumhigh".parse(), Ok(StreamQuality::MediumHigh));
        assert_eq!(
            "7".parse::<StreamQuality>(),
            Err(ParseError::UnknownValue("7".to_string()))
        );
        assert_eq!(StreamQuality::default().value(), 6);
    }

    #[test]
    fn parsing_scaler() {
        assert_eq!("1".parse(), Ok(Scaler::Fit));
        assert_eq!("span".parse(), Ok(Scaler::Span));
        assert_eq!(
            "zoom".parse::<Scaler>(),
            Err(ParseError::UnknownValue("zoom".to_string()))
        );
        assert_eq!(Scaler::default(), Scaler::Fill);
    }
}
