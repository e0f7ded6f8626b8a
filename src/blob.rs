// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// SVG media type.
pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";

/// The media type SVG blobs are tagged with.
pub const SVG_BLOB_MEDIA_TYPE: &str = "image/svg+xml;charset=utf-8";

const URL_PREFIX: &str = "blob:svg2png/";

/// An immutable binary object tagged with a media type.
#[derive(Clone, PartialEq, Debug)]
pub struct SvgBlob {
    data: Rc<[u8]>,
    media_type: &'static str,
}

impl SvgBlob {
    /// Encodes markup as an UTF-8 blob.
    pub fn new(markup: &str) -> Self {
        SvgBlob {
            data: Rc::from(markup.as_bytes()),
            media_type: SVG_BLOB_MEDIA_TYPE,
        }
    }

    /// Returns blob's bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns blob's media type.
    pub fn media_type(&self) -> &str {
        self.media_type
    }

    /// Returns blob's length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks that blob is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Default, Debug)]
struct Registry {
    next_id: u64,
    entries: HashMap<String, SvgBlob>,
}

/// A registry of temporary addresses for blobs.
///
/// Cloning produces a handle to the same registry.
#[derive(Clone, Default, Debug)]
pub struct BlobStore {
    registry: Rc<RefCell<Registry>>,
}

impl BlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a blob and returns an address that resolves to it
    /// until revoked.
    pub fn create_object_url(&self, blob: SvgBlob) -> ObjectUrl {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let url = format!("{}{}", URL_PREFIX, registry.next_id);
        registry.entries.insert(url.clone(), blob);
        log::debug!("Created {}.", url);

        ObjectUrl {
            url,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Looks up a live address.
    pub fn resolve(&self, url: &str) -> Option<SvgBlob> {
        self.registry.borrow().entries.get(url).cloned()
    }

    /// Returns the number of live addresses.
    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    /// Checks that there are no live addresses.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A temporary address of a blob inside a [`BlobStore`].
///
/// The address is released exactly once: either by [`ObjectUrl::revoke`]
/// or when the value is dropped.
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    registry: std::rc::Weak<RefCell<Registry>>,
}

impl ObjectUrl {
    /// Returns the address.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns the blob this address points to.
    ///
    /// Returns `None` when the store is gone.
    pub fn resolve(&self) -> Option<SvgBlob> {
        let registry = self.registry.upgrade()?;
        let registry = registry.borrow();
        registry.entries.get(&self.url).cloned()
    }

    /// Releases the address.
    pub fn revoke(self) {}
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.borrow_mut().entries.remove(&self.url).is_some() {
                log::debug!("Revoked {}.", self.url);
            }
        }
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
