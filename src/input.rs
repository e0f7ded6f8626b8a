// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::cell::RefCell;
use std::path;
use std::rc::{Rc, Weak};

use crate::blob::SVG_MEDIA_TYPE;
use crate::{Error, Session};

const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// A single clipboard entry.
#[derive(Clone, PartialEq, Debug)]
pub struct ClipboardItem {
    /// Declared media type.
    pub media_type: String,
    /// Raw content.
    pub data: Vec<u8>,
}

impl ClipboardItem {
    /// Creates a new item.
    pub fn new(media_type: &str, data: impl Into<Vec<u8>>) -> Self {
        ClipboardItem {
            media_type: media_type.to_string(),
            data: data.into(),
        }
    }

    fn is_svg(&self) -> bool {
        self.media_type.contains(SVG_MEDIA_TYPE)
    }
}

/// The content of a paste event.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ClipboardPayload {
    /// Clipboard entries in the order the source provided them.
    pub items: Vec<ClipboardItem>,
}

impl ClipboardPayload {
    /// Creates a payload.
    pub fn new(items: Vec<ClipboardItem>) -> Self {
        ClipboardPayload { items }
    }
}

/// A user-selected file.
#[derive(Clone, PartialEq, Debug)]
pub struct UploadedFile {
    /// File name.
    pub name: String,
    /// Declared media type.
    pub media_type: String,
    /// Raw content.
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Creates a new file.
    pub fn new(name: &str, media_type: &str, data: impl Into<Vec<u8>>) -> Self {
        UploadedFile {
            name: name.to_string(),
            media_type: media_type.to_string(),
            data: data.into(),
        }
    }

    /// Reads a file from disk.
    ///
    /// The media type is declared by the file extension, like a file picker does.
    pub fn from_path<P: AsRef<path::Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(UploadedFile {
            media_type: media_type_from_extension(path).to_string(),
            name,
            data,
        })
    }
}

fn media_type_from_extension(path: &path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("svg") => SVG_MEDIA_TYPE,
        _ => UNKNOWN_MEDIA_TYPE,
    }
}

/// Decodes UTF-8 text, replacing invalid sequences and dropping a byte order mark.
fn read_as_text(data: &[u8]) -> String {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    String::from_utf8_lossy(data).into_owned()
}

impl Session {
    /// Handles a paste event.
    ///
    /// Replaces the markup with the last SVG item of the payload.
    /// Payloads without SVG items and items that are not valid UTF-8 are ignored.
    pub fn on_paste(&mut self, payload: &ClipboardPayload) {
        for item in payload.items.iter().filter(|item| item.is_svg()) {
            match std::str::from_utf8(&item.data) {
                Ok(text) => self.source = text.to_string(),
                Err(_) => log::debug!("Skipped a non UTF-8 clipboard item."),
            }
        }
    }

    /// Handles a file selection.
    ///
    /// Only files declared as `image/svg+xml` are accepted. Otherwise the markup
    /// is preserved and `InvalidUploadType` is returned.
    pub fn on_file_selected(&mut self, file: Option<&UploadedFile>) -> Result<(), Error> {
        match file {
            Some(file) if file.media_type == SVG_MEDIA_TYPE => {
                self.source = read_as_text(&file.data);
                Ok(())
            }
            Some(file) => {
                log::debug!("Rejected '{}' of type '{}'.", file.name, file.media_type);
                self.error = Some(Error::InvalidUploadType);
                Err(Error::InvalidUploadType)
            }
            None => {
                self.error = Some(Error::InvalidUploadType);
                Err(Error::InvalidUploadType)
            }
        }
    }

    /// Handles a manual edit. The text is not validated.
    pub fn on_text_edited(&mut self, text: &str) {
        self.source = text.to_string();
    }
}

type Listener = Rc<dyn Fn(&ClipboardPayload)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// A global paste event target.
///
/// Cloning produces a handle to the same target.
#[derive(Clone, Default)]
pub struct PasteHub {
    listeners: Rc<RefCell<Listeners>>,
}

impl PasteHub {
    /// Creates a target without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a listener.
    ///
    /// The listener stays installed until the returned subscription
    /// is disposed or dropped.
    #[must_use]
    pub fn subscribe<F>(&self, listener: F) -> PasteSubscription
    where
        F: Fn(&ClipboardPayload) + 'static,
    {
        let mut listeners = self.listeners.borrow_mut();
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push((id, Rc::new(listener)));

        PasteSubscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Delivers a paste event to all installed listeners.
    ///
    /// Returns the number of listeners the event was delivered to.
    pub fn dispatch(&self, payload: &ClipboardPayload) -> usize {
        // Listeners are allowed to unsubscribe during the dispatch.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in &listeners {
            listener(payload);
        }

        listeners.len()
    }

    /// Returns the number of installed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl std::fmt::Debug for PasteHub {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PasteHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// An installed paste listener.
///
/// Removes the listener when dropped.
#[derive(Debug)]
pub struct PasteSubscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl PasteSubscription {
    /// Removes the listener.
    pub fn dispose(self) {}
}

impl Drop for PasteSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}
