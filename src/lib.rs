// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`svg2png` converts user-supplied SVG markup into a PNG image.

Markup arrives through one of three channels: a paste event, a file upload
or a manual edit. All of them overwrite the same [`Session`] markup.
A conversion validates the markup, rasterizes it at its intrinsic size
and publishes the result as a [`RenderedImage`].

```no_run
let mut session = svg2png::Session::new();
session.on_text_edited("<svg width='10' height='10'><rect width='10' height='10'/></svg>");
let image = session.convert().unwrap();
image.save(image.file_name()).unwrap();
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)]

pub use resvg;
pub use tiny_skia;
pub use usvg;

mod blob;
mod error;
mod input;
mod pipeline;
mod session;
mod view;

pub use blob::{BlobStore, ObjectUrl, SvgBlob, SVG_BLOB_MEDIA_TYPE, SVG_MEDIA_TYPE};
pub use error::{Error, RenderError};
pub use input::{ClipboardItem, ClipboardPayload, PasteHub, PasteSubscription, UploadedFile};
pub use pipeline::{
    is_svg_markup, rasterize, Conversion, Options, RenderedImage, DOWNLOAD_FILE_NAME,
};
pub use session::{Session, Status};
pub use view::{MountedView, View};
