//! Content library: the items that can be scored, recommended and placed in
//! newsletters. Registration order is preserved.

use aquascape_core::types::ContentItem;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

#[derive(Default)]
struct LibraryInner {
    items: Vec<ContentItem>,
    index: HashMap<String, usize>,
}

pub struct ContentLibrary {
    inner: RwLock<LibraryInner>,
}

impl ContentLibrary {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LibraryInner::default()),
        }
    }

    /// Register an item. Items are immutable once registered, so a second
    /// registration under the same id is ignored and returns `false`.
    pub fn register(&self, item: ContentItem) -> bool {
        let mut inner = self.inner.write();
        if inner.index.contains_key(&item.id) {
            debug!(content_id = %item.id, "Content already registered, ignoring");
            return false;
        }
        let position = inner.items.len();
        inner.index.insert(item.id.clone(), position);
        info!(content_id = %item.id, content_type = item.content_type.as_str(), "Content registered");
        inner.items.push(item);
        true
    }

    pub fn get(&self, content_id: &str) -> Option<ContentItem> {
        let inner = self.inner.read();
        inner
            .index
            .get(content_id)
            .map(|&position| inner.items[position].clone())
    }

    pub fn contains(&self, content_id: &str) -> bool {
        self.inner.read().index.contains_key(content_id)
    }

    /// Every item, in registration order.
    pub fn items(&self) -> Vec<ContentItem> {
        self.inner.read().items.clone()
    }

    /// Union of the tags carried by the given items. Unknown ids are skipped.
    pub fn tags_of<'a>(&self, content_ids: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
        let inner = self.inner.read();
        content_ids
            .into_iter()
            .filter_map(|id| inner.index.get(id))
            .flat_map(|&position| inner.items[position].tags.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ContentLibrary {
    fn default() -> Self {
        Self::new()
    }
}
