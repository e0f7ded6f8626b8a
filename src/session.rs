// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::blob::BlobStore;
use crate::pipeline::{is_svg_markup, Conversion, InFlight, Options, RenderedImage};
use crate::{Error, RenderError};

/// A conversion status.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Status {
    /// No conversion was attempted yet.
    #[default]
    Idle,
    /// A conversion is in flight.
    Converting,
    /// The last conversion produced an image.
    Succeeded,
    /// The last conversion was rejected before rasterization.
    Invalid,
    /// The last conversion failed during rasterization.
    Failed,
}

/// A conversion session.
///
/// Holds the current SVG markup, the last rendered image and the message
/// that should be displayed to the user.
/// All the input channels write into the same markup.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) source: String,
    image: Option<RenderedImage>,
    pub(crate) error: Option<Error>,
    status: Status,
    options: Options,
    blobs: BlobStore,
    in_flight: InFlight,
    last_id: u64,
}

impl Session {
    /// Creates an empty session with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty session.
    pub fn with_options(options: Options) -> Self {
        Session {
            options,
            ..Session::default()
        }
    }

    /// Returns the current markup.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the last successfully rendered image.
    ///
    /// The image is not invalidated by further markup changes.
    pub fn image(&self) -> Option<&RenderedImage> {
        self.image.as_ref()
    }

    /// Returns the current error.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns the current error message.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Returns the conversion status.
    pub fn status(&self) -> Status {
        if self.is_converting() {
            Status::Converting
        } else {
            self.status
        }
    }

    /// Checks that a conversion is in flight.
    ///
    /// A convert action should be disabled in this state.
    pub fn is_converting(&self) -> bool {
        self.in_flight.get().is_some()
    }

    /// Returns a convert action label.
    pub fn button_label(&self) -> &'static str {
        if self.is_converting() {
            "Converting..."
        } else {
            "Convert to PNG"
        }
    }

    /// Returns conversion options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns mutable conversion options.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Returns the store that holds blobs of in-flight conversions.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Starts a conversion of the current markup.
    ///
    /// When the markup doesn't look like SVG, the previous image is cleared
    /// and `EmptyOrMalformedInput` is returned.
    /// Returns `Busy` when another conversion is in flight.
    ///
    /// The returned conversion should be loaded and passed
    /// to [`Session::finish_conversion`]. Dropping it instead
    /// ends the conversion without changing the result.
    pub fn begin_conversion(&mut self) -> Result<Conversion, Error> {
        if self.is_converting() {
            return Err(Error::Busy);
        }

        if !is_svg_markup(&self.source) {
            log::debug!("Rejected markup without the '<svg' prefix.");
            self.error = Some(Error::EmptyOrMalformedInput);
            self.image = None;
            self.status = Status::Invalid;
            return Err(Error::EmptyOrMalformedInput);
        }

        self.error = None;
        self.last_id += 1;
        Ok(Conversion::new(
            self.last_id,
            &self.source,
            &self.blobs,
            self.in_flight.clone(),
        ))
    }

    /// Completes a conversion started by [`Session::begin_conversion`].
    ///
    /// On failure, the previous image is preserved.
    /// Returns `NotConverting` and changes nothing when `conversion`
    /// is not the one this session waits for.
    pub fn finish_conversion(
        &mut self,
        conversion: Conversion,
        result: Result<RenderedImage, RenderError>,
    ) -> Result<(), Error> {
        if !conversion.belongs_to(&self.in_flight) {
            log::warn!("Ignored a result of a conversion that is not in progress.");
            return Err(Error::NotConverting);
        }

        self.in_flight.set(None);

        match result {
            Ok(image) => {
                log::debug!("Converted into {}x{} PNG.", image.width(), image.height());
                self.image = Some(image);
                self.status = Status::Succeeded;
                Ok(())
            }
            Err(e) => {
                log::warn!("Conversion failed cause {}.", e);
                let e = Error::ConversionFailure(e);
                self.error = Some(e.clone());
                self.status = Status::Failed;
                Err(e)
            }
        }
    }

    /// Converts the current markup into a PNG.
    pub fn convert(&mut self) -> Result<&RenderedImage, Error> {
        let mut conversion = self.begin_conversion()?;
        let result = conversion.load(&self.options);
        self.finish_conversion(conversion, result)?;

        // Unwrap is safe, because the conversion has succeeded.
        Ok(self.image.as_ref().unwrap())
    }
}
