// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Cow;
use std::cell::Cell;
use std::path;
use std::rc::Rc;

use base64::Engine;
use rgb::RGBA8;

use crate::blob::{BlobStore, ObjectUrl, SvgBlob};
use crate::RenderError;

/// A file name under which a PNG is offered for download.
pub const DOWNLOAD_FILE_NAME: &str = "converted.png";

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

const BOM: char = '\u{feff}';

/// Conversion options.
///
/// There are no output format options. A bitmap always has the SVG intrinsic size
/// and a transparent background.
#[derive(Clone, Debug)]
pub struct Options {
    /// Size to use when the root `svg` element has no `viewBox`
    /// and no `width` and/or `height`.
    ///
    /// Default: `(100, 100)`
    pub default_size: usvg::Size,

    /// The maximum number of pixels a bitmap may have.
    ///
    /// Larger images fail to convert instead of exhausting memory.
    ///
    /// Default: 8192 * 8192
    pub max_pixels: u64,

    /// Directory that will be used during relative paths resolving.
    ///
    /// Default: `None`
    pub resources_dir: Option<path::PathBuf>,

    /// Load system fonts when the SVG has text.
    ///
    /// Default: true
    pub load_system_fonts: bool,

    /// Additional font files.
    pub font_files: Vec<path::PathBuf>,

    /// Additional font directories.
    pub font_dirs: Vec<path::PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            // Unwrap is safe, because the size is positive.
            default_size: usvg::Size::from_wh(100.0, 100.0).unwrap(),
            max_pixels: 8192 * 8192,
            resources_dir: None,
            load_system_fonts: true,
            font_files: Vec::new(),
            font_dirs: Vec::new(),
        }
    }
}

impl Options {
    fn to_usvg(&self, has_text_nodes: bool) -> usvg::Options<'static> {
        let mut opt = usvg::Options::default();
        opt.resources_dir = self.resources_dir.clone();
        opt.default_size = self.default_size;

        #[cfg(feature = "text")]
        {
            // fontdb initialization is pretty expensive, so perform it only when needed.
            if has_text_nodes {
                opt.fontdb = fonts::database(self);
            }
        }

        #[cfg(not(feature = "text"))]
        let _ = has_text_nodes;

        opt
    }
}

#[cfg(feature = "text")]
mod fonts {
    use std::sync::Arc;

    use usvg::fontdb;

    use super::Options;

    #[cfg(feature = "system-fonts")]
    static SYSTEM_FONTS: once_cell::sync::Lazy<Arc<fontdb::Database>> =
        once_cell::sync::Lazy::new(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            log::debug!("Loaded {} system font faces.", db.len());
            Arc::new(db)
        });

    #[cfg(feature = "system-fonts")]
    pub fn database(opt: &Options) -> Arc<fontdb::Database> {
        let base = if opt.load_system_fonts {
            SYSTEM_FONTS.clone()
        } else {
            Arc::new(fontdb::Database::new())
        };

        if opt.font_files.is_empty() && opt.font_dirs.is_empty() {
            return base;
        }

        let mut db = (*base).clone();
        for path in &opt.font_files {
            if let Err(e) = db.load_font_file(path) {
                log::warn!("Failed to load '{}' cause {}.", path.display(), e);
            }
        }

        for path in &opt.font_dirs {
            db.load_fonts_dir(path);
        }

        Arc::new(db)
    }

    #[cfg(not(feature = "system-fonts"))]
    pub fn database(_: &Options) -> Arc<fontdb::Database> {
        Arc::new(fontdb::Database::new())
    }
}

/// Checks that a text looks like SVG markup.
///
/// This is a shallow check of the `<svg` prefix, not an XML validation.
/// Leading whitespace and a byte order mark are ignored.
pub fn is_svg_markup(text: &str) -> bool {
    trim_markup(text).starts_with("<svg")
}

fn trim_markup(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == BOM)
}

/// The id of the conversion a session is waiting for.
pub(crate) type InFlight = Rc<Cell<Option<u64>>>;

/// An in-flight conversion.
///
/// Holds a temporary address of the encoded markup, which is released
/// after loading or when the conversion is dropped.
/// Dropping an unfinished conversion also releases the session it came from.
#[derive(Debug)]
pub struct Conversion {
    id: u64,
    url: Option<ObjectUrl>,
    in_flight: InFlight,
}

impl Conversion {
    pub(crate) fn new(id: u64, markup: &str, store: &BlobStore, in_flight: InFlight) -> Self {
        in_flight.set(Some(id));
        let blob = SvgBlob::new(markup);
        Conversion {
            id,
            url: Some(store.create_object_url(blob)),
            in_flight,
        }
    }

    /// Returns the blob address.
    ///
    /// Returns `None` after the blob has been loaded.
    pub fn url(&self) -> Option<&str> {
        self.url.as_ref().map(|url| url.as_str())
    }

    /// Loads the blob as an image and draws it onto a bitmap of its intrinsic size.
    ///
    /// The blob address is revoked afterwards, so a second call
    /// returns `RenderError::Revoked`.
    pub fn load(&mut self, opt: &Options) -> Result<RenderedImage, RenderError> {
        let url = self.url.take().ok_or(RenderError::Revoked)?;
        let result = match url.resolve() {
            Some(blob) => rasterize(blob.data(), opt),
            None => Err(RenderError::Revoked),
        };

        url.revoke();
        result
    }

    pub(crate) fn belongs_to(&self, in_flight: &InFlight) -> bool {
        Rc::ptr_eq(&self.in_flight, in_flight) && in_flight.get() == Some(self.id)
    }
}

impl Drop for Conversion {
    fn drop(&mut self) {
        if self.in_flight.get() == Some(self.id) {
            log::debug!("Conversion {} was dropped unfinished.", self.id);
            self.in_flight.set(None);
        }
    }
}

/// Rasterizes SVG data.
///
/// The bitmap has the SVG intrinsic size. The image is drawn at the origin,
/// without a background or any additional transform.
pub fn rasterize(data: &[u8], opt: &Options) -> Result<RenderedImage, RenderError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| RenderError::ParsingFailed("provided data has not an UTF-8 encoding".into()))?;

    let text = normalize_root(text, opt.default_size);

    let xml_opt = usvg::roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let xml_tree = usvg::roxmltree::Document::parse_with_options(&text, xml_opt)
        .map_err(|e| RenderError::ParsingFailed(e.to_string()))?;

    let has_text_nodes = xml_tree
        .descendants()
        .any(|n| n.has_tag_name((SVG_NS, "text")));

    let tree = usvg::Tree::from_xmltree(&xml_tree, &opt.to_usvg(has_text_nodes))?;

    let size = tree.size().to_int_size();
    let mut pixmap = new_pixmap(size.width(), size.height(), opt.max_pixels)?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let png = pixmap
        .encode_png()
        .map_err(|e| RenderError::EncodingFailed(e.to_string()))?;

    log::debug!("Rendered a {}x{} bitmap.", pixmap.width(), pixmap.height());

    Ok(RenderedImage { pixmap, png })
}

fn new_pixmap(width: u32, height: u32, max_pixels: u64) -> Result<tiny_skia::Pixmap, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize);
    }

    if width as u64 * height as u64 > max_pixels {
        return Err(RenderError::TooLarge { width, height });
    }

    tiny_skia::Pixmap::new(width, height).ok_or(RenderError::TooLarge { width, height })
}

/// Fixes up the root `svg` start tag of hand-written markup.
///
/// Declares the SVG and XLink namespaces when they are missing, since the parser
/// ignores elements outside of the SVG namespace.
/// Without a `viewBox`, a missing `width` or `height` is taken from `default_size`.
/// Otherwise the image would be sized by its content.
fn normalize_root(text: &str, default_size: usvg::Size) -> Cow<str> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let offset = text.len() - text.trim_start().len();
    if !text[offset..].starts_with("<svg") {
        return Cow::Borrowed(text);
    }

    let name_end = offset + 4;
    match text[name_end..].chars().next() {
        Some(c) if c.is_ascii_whitespace() || c == '/' || c == '>' => {}
        _ => return Cow::Borrowed(text),
    }

    let tag_end = match text[name_end..].find('>') {
        Some(idx) => name_end + idx,
        None => return Cow::Borrowed(text),
    };
    let start_tag = &text[name_end..tag_end];

    let mut attrs = String::new();
    if !has_attribute(start_tag, "xmlns") {
        attrs.push_str(&format!(" xmlns=\"{}\"", SVG_NS));
    }

    if text.contains("xlink:") && !has_attribute(start_tag, "xmlns:xlink") {
        attrs.push_str(&format!(" xmlns:xlink=\"{}\"", XLINK_NS));
    }

    if !has_attribute(start_tag, "viewBox") {
        if !has_attribute(start_tag, "width") {
            attrs.push_str(&format!(" width=\"{}\"", default_size.width()));
        }

        if !has_attribute(start_tag, "height") {
            attrs.push_str(&format!(" height=\"{}\"", default_size.height()));
        }
    }

    if attrs.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut fixed = String::with_capacity(text.len() + attrs.len());
    fixed.push_str(&text[..name_end]);
    fixed.push_str(&attrs);
    fixed.push_str(&text[name_end..]);
    Cow::Owned(fixed)
}

/// Checks that a start tag has an attribute with exactly this name.
fn has_attribute(start_tag: &str, name: &str) -> bool {
    start_tag.match_indices(name).any(|(idx, _)| {
        let preceded = start_tag[..idx]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_ascii_whitespace());
        let followed = start_tag[idx + name.len()..]
            .trim_start()
            .starts_with('=');
        preceded && followed
    })
}

/// A successfully rasterized SVG.
#[derive(Clone, Debug)]
pub struct RenderedImage {
    pixmap: tiny_skia::Pixmap,
    png: Vec<u8>,
}

impl RenderedImage {
    /// Returns bitmap width.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Returns bitmap height.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Returns the PNG-encoded bitmap.
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// Returns the PNG-encoded bitmap as a `data:` URI.
    pub fn data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.png);
        format!("{}{}", PNG_DATA_URI_PREFIX, encoded)
    }

    /// Returns a pixel with demultiplied alpha.
    pub fn pixel(&self, x: u32, y: u32) -> Option<RGBA8> {
        self.pixmap.pixel(x, y).map(demultiply)
    }

    /// Returns all pixels with demultiplied alpha, row by row.
    ///
    /// Suitable for an inline preview.
    pub fn preview(&self) -> Vec<RGBA8> {
        self.pixmap.pixels().iter().map(|p| demultiply(*p)).collect()
    }

    /// Returns a file name under which the image is offered for download.
    pub fn file_name(&self) -> &'static str {
        DOWNLOAD_FILE_NAME
    }

    /// Writes the PNG data into a file.
    pub fn save<P: AsRef<path::Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, &self.png)
    }
}

fn demultiply(c: tiny_skia::PremultipliedColorU8) -> RGBA8 {
    let c = c.demultiply();
    RGBA8::new(c.red(), c.green(), c.blue(), c.alpha())
}
