//! The host a view mounts into: frame scheduling and event subscriptions.
//!
//! The host does not call back into views. It only records who asked for frames and
//! who listens to which events; the event loop in [`flow`](crate::flow) consults it to
//! decide whether to request redraws and which events to forward. Views share it as
//! [`SharedHost`] and everything runs on one thread.

use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use log::debug;

pub type SharedHost = Rc<RefCell<Host>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Resize,
    PointerMove,
}

/// The host's frame and listener tables.
///
/// Views keep a clone from [`Host::registrations`] so they can withdraw what they
/// registered while the host itself is borrowed elsewhere. Each method borrows the
/// tables only for its own duration.
#[derive(Debug, Default, Clone)]
pub struct Registrations {
    frames: Rc<RefCell<BTreeSet<FrameHandle>>>,
    listeners: Rc<RefCell<BTreeSet<(EventKind, ListenerId)>>>,
}

impl Registrations {
    /// Returns `false` if the handle was not scheduled.
    pub fn cancel_frames(&self, handle: FrameHandle) -> bool {
        let removed = self.frames.borrow_mut().remove(&handle);
        if removed {
            debug!("frames cancelled: {:?}", handle);
        }
        removed
    }

    pub fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(&(kind, id))
    }

    pub fn is_scheduled(&self, handle: FrameHandle) -> bool {
        self.frames.borrow().contains(&handle)
    }
}

#[derive(Debug, Default)]
pub struct Host {
    next_id: u64,
    registrations: Registrations,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedHost {
        Rc::new(RefCell::new(Self::new()))
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn registrations(&self) -> Registrations {
        self.registrations.clone()
    }

    /// Registers a recurring frame callback that stays armed until cancelled.
    pub fn request_frames(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.registrations.frames.borrow_mut().insert(handle);
        debug!("frames requested: {:?}", handle);
        handle
    }

    /// Returns `false` if the handle was not scheduled.
    pub fn cancel_frames(&mut self, handle: FrameHandle) -> bool {
        self.registrations.cancel_frames(handle)
    }

    pub fn is_scheduled(&self, handle: FrameHandle) -> bool {
        self.registrations.is_scheduled(handle)
    }

    pub fn scheduled_frames(&self) -> usize {
        self.registrations.frames.borrow().len()
    }

    pub fn subscribe(&mut self, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next());
        self.registrations.listeners.borrow_mut().insert((kind, id));
        debug!("subscribed {:?} to {:?}", id, kind);
        id
    }

    pub fn unsubscribe(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.registrations.unsubscribe(kind, id)
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.registrations.listeners.borrow().iter().any(|(k, _)| *k == kind)
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.listeners.borrow().len()
    }
}
