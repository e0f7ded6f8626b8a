// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// A user-facing error.
///
/// None of the variants is fatal. Each one is shown as an inline message
/// and the user simply tries again.
#[derive(Clone, PartialEq, Debug)]
pub enum Error {
    /// A selected file is not declared as `image/svg+xml`,
    /// or no file was selected at all.
    InvalidUploadType,

    /// The trimmed markup doesn't start with `<svg`.
    EmptyOrMalformedInput,

    /// Rasterization failed.
    ///
    /// The cause is kept for logging, but only a generic message is displayed.
    ConversionFailure(RenderError),

    /// A conversion is already in flight.
    Busy,

    /// A conversion was finished while the session doesn't wait for it.
    NotConverting,
}

impl Error {
    /// Returns the underlying rasterization error, if any.
    pub fn cause(&self) -> Option<&RenderError> {
        match *self {
            Error::ConversionFailure(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Error::ConversionFailure(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::InvalidUploadType => {
                write!(f, "Please upload a valid SVG file.")
            }
            Error::EmptyOrMalformedInput => {
                write!(f, "Please enter valid SVG code.")
            }
            Error::ConversionFailure(_) => {
                write!(f, "An error occurred during conversion. Please try again.")
            }
            Error::Busy => {
                write!(f, "a conversion is already in progress")
            }
            Error::NotConverting => {
                write!(f, "the conversion is not in progress")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::ConversionFailure(ref e) => Some(e),
            _ => None,
        }
    }
}

/// A rasterization error.
#[derive(Clone, PartialEq, Debug)]
pub enum RenderError {
    /// The object URL was revoked before the image has been loaded.
    Revoked,

    /// `usvg` rejected the markup.
    ParsingFailed(String),

    /// SVG has a zero or negative size.
    InvalidSize,

    /// The target bitmap exceeds `Options::max_pixels`
    /// or cannot be allocated.
    TooLarge {
        /// Bitmap width.
        width: u32,
        /// Bitmap height.
        height: u32,
    },

    /// PNG encoding failed.
    EncodingFailed(String),
}

impl From<usvg::Error> for RenderError {
    fn from(e: usvg::Error) -> Self {
        match e {
            usvg::Error::InvalidSize => RenderError::InvalidSize,
            e => RenderError::ParsingFailed(e.to_string()),
        }
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            RenderError::Revoked => {
                write!(f, "the object URL has been revoked")
            }
            RenderError::ParsingFailed(ref e) => {
                write!(f, "SVG data parsing failed cause {}", e)
            }
            RenderError::InvalidSize => {
                write!(f, "SVG has an invalid size")
            }
            RenderError::TooLarge { width, height } => {
                write!(f, "a {}x{} bitmap is too large", width, height)
            }
            RenderError::EncodingFailed(ref e) => {
                write!(f, "PNG encoding failed cause {}", e)
            }
        }
    }
}

impl std::error::Error for RenderError {}
