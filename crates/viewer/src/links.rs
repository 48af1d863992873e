use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    /// A new tab or window; the scene stays mounted.
    NewContext,
}

/// Platform primitive that opens a URL. Fire-and-forget.
pub trait Navigator {
    fn open(&self, url: &str, target: OpenTarget);
}

/// URLs index-aligned with the orbiting bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    urls: Vec<String>,
}

impl LinkTable {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.urls.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

pub struct NavigationDispatcher {
    links: LinkTable,
    navigator: Rc<dyn Navigator>,
}

impl NavigationDispatcher {
    pub fn new(links: LinkTable, navigator: Rc<dyn Navigator>) -> Self {
        Self { links, navigator }
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// Opens `links[index]` in a new context and returns the URL. An
    /// out-of-range index opens nothing.
    pub fn dispatch(&self, index: usize) -> Option<&str> {
        let Some(url) = self.links.get(index) else {
            debug!(index, links = self.links.len(), "link index out of range");
            return None;
        };
        info!(index, url, "opening link");
        self.navigator.open(url, OpenTarget::NewContext);
        Some(url)
    }
}

impl std::fmt::Debug for NavigationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationDispatcher")
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

/// [`Navigator`] that only remembers what it was asked to open.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    opened: Rc<RefCell<Vec<(String, OpenTarget)>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<(String, OpenTarget)> {
        self.opened.borrow().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.opened.borrow().iter().map(|(url, _)| url.clone()).collect()
    }
}

impl Navigator for RecordingNavigator {
    fn open(&self, url: &str, target: OpenTarget) {
        self.opened.borrow_mut().push((url.to_string(), target));
    }
}
