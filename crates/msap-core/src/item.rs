//! Items and item pools.
//!
//! An [`Item`] carries one frame through the engine. A request item is
//! reserved when a frame arrives, rewritten in place into its confirm by
//! exactly one handler, handed to the transport, and returned to its pool
//! after transmission. Indication items follow the same path from a
//! separate pool.
//!
//! Items also carry the two deferred steps the transport runs around
//! transmission: a [`PreSend`] step just before the frame leaves and a
//! [`PostSend`] step after it has been sent.

use msap_protocol::{Confirm, Frame, Indication};

/// Which pool an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Request, later rewritten into its confirm.
    Request,
    /// Unsolicited indication.
    Indication,
}

impl ItemKind {
    /// Short name for logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Request => "request",
            ItemKind::Indication => "indication",
        }
    }
}

/// Step run immediately before the frame is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreSend {
    /// Write the current coarse timestamp into an attribute read confirm.
    StampSystemTime,
    /// Write the pending-indication flag into the first payload byte.
    PendingIndications,
}

/// Step run after the frame has been transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSend {
    /// Stop the stack, rebooting the node.
    Reboot,
}

/// A frame in flight through the engine.
#[derive(Debug)]
pub struct Item {
    /// The frame.
    pub frame: Frame,
    kind: ItemKind,
    pre_send: Option<PreSend>,
    post_send: Option<PostSend>,
}

impl Item {
    fn new(kind: ItemKind) -> Self {
        Item {
            frame: Frame::default(),
            kind,
            pre_send: None,
            post_send: None,
        }
    }

    /// Pool this item belongs to.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Pending pre-send step.
    pub fn pre_send(&self) -> Option<PreSend> {
        self.pre_send
    }

    /// Pending post-send step.
    pub fn post_send(&self) -> Option<PostSend> {
        self.post_send
    }

    pub(crate) fn take_pre_send(&mut self) -> Option<PreSend> {
        self.pre_send.take()
    }

    pub(crate) fn take_post_send(&mut self) -> Option<PostSend> {
        self.post_send.take()
    }

    /// Load a received frame.
    pub(crate) fn load(&mut self, frame: Frame) {
        self.frame = frame;
        self.pre_send = None;
        self.post_send = None;
    }

    /// Rewrite the item into a confirm, keeping the request's sequence id
    /// and payload storage.
    pub(crate) fn respond(
        &mut self,
        confirm: &Confirm,
        pre_send: Option<PreSend>,
        post_send: Option<PostSend>,
    ) {
        self.frame.function = confirm.code();
        self.frame.payload.clear();
        self.frame.payload.extend_from_slice(&confirm.encode_payload());
        self.pre_send = pre_send;
        self.post_send = post_send;
    }

    /// Rewrite the item into an indication.
    pub(crate) fn indicate(&mut self, indication: &Indication) {
        self.frame.function = indication.kind().into();
        self.frame.sequence_id = 0;
        self.frame.payload.clear();
        self.frame.payload.extend_from_slice(&indication.encode_payload());
        self.pre_send = Some(PreSend::PendingIndications);
        self.post_send = None;
    }

    fn reset(&mut self) {
        self.frame.function = 0;
        self.frame.sequence_id = 0;
        self.frame.payload.clear();
        self.pre_send = None;
        self.post_send = None;
    }
}

/// A fixed-capacity pool of items of one kind.
///
/// Released items keep their payload allocation, so steady-state operation
/// does not allocate.
#[derive(Debug)]
pub struct ItemPool {
    kind: ItemKind,
    capacity: usize,
    free: Vec<Item>,
}

impl ItemPool {
    /// Create a pool holding `capacity` items.
    pub fn new(kind: ItemKind, capacity: usize) -> Self {
        ItemPool {
            kind,
            capacity,
            free: (0..capacity).map(|_| Item::new(kind)).collect(),
        }
    }

    /// Kind of item this pool hands out.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Total number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items not currently reserved.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Reserve an item, or `None` if every item is in use.
    pub fn reserve(&mut self) -> Option<Item> {
        self.free.pop()
    }

    /// Return an item to the pool.
    ///
    /// Items from another pool, or beyond capacity, are dropped.
    pub fn release(&mut self, mut item: Item) {
        if item.kind != self.kind || self.free.len() >= self.capacity {
            return;
        }
        item.reset();
        self.free.push(item);
    }
}
