// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;
use std::io;

use reqwest::StatusCode;

use crate::render::ResizeError;

/// Problems with the contents of a response or stream frame.
#[derive(Debug)]
pub enum PayloadError {
    /// The body was not valid JSON.
    Json(serde_json::Error),

    /// The body was JSON, but not the shape expected.
    Shape(&'static str),

    /// The frame field was present but contained something other than numbers.
    NonNumeric,

    /// A binary stream payload that is not JSON, and whose length is not a multiple of two.
    Unrecognized(usize),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "invalid JSON payload: {}", e),
            Self::Shape(expected) => write!(f, "unexpected payload, expected {}", expected),
            Self::NonNumeric => f.write_str("frame data contains non-numeric values"),
            Self::Unrecognized(len) => write!(f, "unrecognized {} byte binary payload", len),
        }
    }
}

impl StdError for PayloadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// The ways fetching a frame can fail. All of them are recoverable; the previous frame is kept.
#[derive(Debug)]
pub enum FetchError {
    /// Connection failures, timeouts and other errors from the HTTP client.
    Transport(reqwest::Error),

    /// The server responded with something other than success.
    Status(StatusCode),

    /// Reading a frame off a stream failed.
    Io(io::Error),

    /// The response arrived but could not be understood.
    Payload(PayloadError),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Io(e) => e.kind() == io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "request failed: {}", e),
            Self::Status(status) => write!(f, "server responded with {}", status),
            Self::Io(e) => write!(f, "stream read failed: {}", e),
            Self::Payload(e) => e.fmt(f),
        }
    }
}

impl StdError for FetchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Status(_) => None,
            Self::Io(e) => Some(e),
            Self::Payload(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<io::Error> for FetchError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<PayloadError> for FetchError {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

/// The ways turning a frame into an image can fail.
#[derive(Debug)]
pub enum RenderError {
    /// The number of values does not fill the configured grid.
    Shape {
        rows: usize,
        cols: usize,
        actual: usize,
    },

    /// The render settings can't produce an image.
    Settings(&'static str),

    Resize(ResizeError),

    /// JPEG encoding failed.
    Encode(anyhow::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape { rows, cols, actual } => write!(
                f,
                "expected {} values for a {}x{} frame, got {}",
                rows * cols,
                rows,
                cols,
                actual
            ),
            Self::Settings(problem) => write!(f, "invalid render settings: {}", problem),
            Self::Resize(e) => write!(f, "unable to enlarge frame: {}", e),
            Self::Encode(e) => write!(f, "unable to encode JPEG: {}", e),
        }
    }
}

impl StdError for RenderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Resize(e) => Some(e),
            Self::Encode(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<ResizeError> for RenderError {
    fn from(e: ResizeError) -> Self {
        Self::Resize(e)
    }
}
