//! Ownership of everything a mounted view allocates on the graphics side.
//!
//! Backends register each object they create with the view's [`ResourceSet`]. The set
//! releases them in reverse acquisition order when the view unmounts, so a pipeline goes
//! before the device it was created on. Releasing is idempotent, and a set dropped with
//! live entries releases them on the way out.

pub mod gpu;

use std::{collections::BTreeMap, fmt};

use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Rendering context: device and surface.
    Context,
    Geometry,
    Material,
    Buffer,
    Texture,
    Pipeline,
}

/// Something that holds graphics memory and must be given back explicitly.
pub trait Disposable {
    fn kind(&self) -> ResourceKind;

    /// Frees the underlying object. Called at most once per acquisition.
    fn release(self: Box<Self>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

struct Entry {
    label: String,
    resource: Box<dyn Disposable>,
}

/// Per-view registry of disposable resources.
#[derive(Default)]
pub struct ResourceSet {
    entries: BTreeMap<ResourceId, Entry>,
    next_id: u64,
    acquired: usize,
    released: usize,
}

impl fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSet")
            .field("live", &self.live())
            .field("acquired", &self.acquired)
            .field("released", &self.released)
            .finish()
    }
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, label: impl Into<String>, resource: Box<dyn Disposable>) -> ResourceId {
        let label = label.into();
        debug!("acquire {:?} '{}'", resource.kind(), label);
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, Entry { label, resource });
        self.acquired += 1;
        id
    }

    /// Releases one resource ahead of unmount, e.g. a render target replaced on resize.
    /// Returns `false` if it was already released.
    pub fn release(&mut self, id: ResourceId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                Self::dispose(entry);
                self.released += 1;
                true
            }
            None => false,
        }
    }

    /// Releases every live resource, newest first. Returns how many were released by
    /// this call; a second call returns 0.
    pub fn release_all(&mut self) -> usize {
        let mut count = 0;
        while let Some((_, entry)) = self.entries.pop_last() {
            Self::dispose(entry);
            count += 1;
        }
        self.released += count;
        count
    }

    fn dispose(entry: Entry) {
        debug!("release {:?} '{}'", entry.resource.kind(), entry.label);
        entry.resource.release();
    }

    pub fn live(&self) -> usize {
        self.entries.len()
    }

    pub fn live_of(&self, kind: ResourceKind) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.resource.kind() == kind)
            .count()
    }

    pub fn acquired(&self) -> usize {
        self.acquired
    }

    pub fn released(&self) -> usize {
        self.released
    }

    pub fn is_balanced(&self) -> bool {
        self.acquired == self.released
    }
}

impl Drop for ResourceSet {
    fn drop(&mut self) {
        let live = self.live();
        if live > 0 {
            warn!("resource set dropped with {} live resources, releasing them now", live);
            self.release_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    struct Tracked {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Disposable for Tracked {
        fn kind(&self) -> ResourceKind {
            ResourceKind::Buffer
        }

        fn release(self: Box<Self>) {
            self.log.borrow_mut().push(self.name);
        }
    }

    fn tracked(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Box<dyn Disposable> {
        Box::new(Tracked {
            name,
            log: log.clone(),
        })
    }

    #[test]
    fn releases_newest_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ResourceSet::new();
        set.acquire("context", tracked("context", &log));
        set.acquire("pipeline", tracked("pipeline", &log));
        set.acquire("buffer", tracked("buffer", &log));

        assert_eq!(set.release_all(), 3);
        assert_eq!(*log.borrow(), vec!["buffer", "pipeline", "context"]);
        assert!(set.is_balanced());
    }

    #[test]
    fn release_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ResourceSet::new();
        let target = set.acquire("target", tracked("target", &log));
        set.acquire("buffer", tracked("buffer", &log));

        assert!(set.release(target));
        assert!(!set.release(target));
        assert_eq!(set.release_all(), 1);
        assert_eq!(set.release_all(), 0);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!((set.acquired(), set.released()), (2, 2));
    }

    #[test]
    fn replacing_a_resource_does_not_grow_the_set() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ResourceSet::new();
        set.acquire("context", tracked("context", &log));
        let mut target = set.acquire("target", tracked("target", &log));
        for _ in 0..1000 {
            assert!(set.release(target));
            target = set.acquire("target", tracked("target", &log));
        }
        assert_eq!(set.live(), 2);
        assert_eq!(set.entries.len(), 2);
        assert_eq!(set.live_of(ResourceKind::Buffer), 2);

        assert_eq!(set.release_all(), 2);
        assert_eq!(log.borrow().last(), Some(&"context"));
        assert!(set.is_balanced());
    }

    #[test]
    fn drop_releases_leftovers() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut set = ResourceSet::new();
            set.acquire("buffer", tracked("buffer", &log));
        }
        assert_eq!(*log.borrow(), vec!["buffer"]);
    }
}
