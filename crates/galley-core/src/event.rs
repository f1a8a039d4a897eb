//! Typed event system with pre-allocated ring buffers.
//!
//! Events are emitted during the simulation phases and delivered in batch at
//! the end of each step. Each event type has its own [`EventBuffer`] ring
//! buffer with a configurable capacity; presentation registers passive
//! listeners (read-only) for the kinds it cares about.
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`], which prevents
//! any allocation or recording for that kind. Suppressed events have zero cost.

use crate::fixed::Ticks;
use crate::id::{EndpointId, ItemId, ItemTypeId, NpcId, RecipeId, StationId};
use crate::item::VisualState;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Items --
    ItemSpawned {
        item: ItemId,
        template: ItemTypeId,
        tick: Ticks,
    },
    ItemDestroyed {
        item: ItemId,
        tick: Ticks,
    },
    /// An item's visual representation changed (presentation swaps the mesh).
    ItemStateChanged {
        item: ItemId,
        state: VisualState,
        tick: Ticks,
    },

    // -- Stations --
    ProcessingStarted {
        station: StationId,
        item: ItemId,
        slot: usize,
        tick: Ticks,
    },
    ProcessingCompleted {
        station: StationId,
        item: ItemId,
        tick: Ticks,
    },
    RecipeMatched {
        station: StationId,
        recipe: RecipeId,
        product: ItemId,
        tick: Ticks,
    },
    /// A full stove matched nothing; the failure effect is burning.
    FireStarted {
        station: StationId,
        tick: Ticks,
    },
    StoveCleared {
        station: StationId,
        tick: Ticks,
    },
    FireCleared {
        station: StationId,
        tick: Ticks,
    },

    // -- NPCs --
    NpcSpawned {
        npc: NpcId,
        endpoint: EndpointId,
        tick: Ticks,
    },
    NpcSeated {
        npc: NpcId,
        endpoint: EndpointId,
        order: RecipeId,
        tick: Ticks,
    },
    OrderDelivered {
        npc: NpcId,
        recipe: RecipeId,
        tick: Ticks,
    },
    EndpointReleased {
        endpoint: EndpointId,
        tick: Ticks,
    },
    NpcDeparted {
        npc: NpcId,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemSpawned,
    ItemDestroyed,
    ItemStateChanged,
    ProcessingStarted,
    ProcessingCompleted,
    RecipeMatched,
    FireStarted,
    StoveCleared,
    FireCleared,
    NpcSpawned,
    NpcSeated,
    OrderDelivered,
    EndpointReleased,
    NpcDeparted,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 14;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ItemSpawned { .. } => EventKind::ItemSpawned,
            Event::ItemDestroyed { .. } => EventKind::ItemDestroyed,
            Event::ItemStateChanged { .. } => EventKind::ItemStateChanged,
            Event::ProcessingStarted { .. } => EventKind::ProcessingStarted,
            Event::ProcessingCompleted { .. } => EventKind::ProcessingCompleted,
            Event::RecipeMatched { .. } => EventKind::RecipeMatched,
            Event::FireStarted { .. } => EventKind::FireStarted,
            Event::StoveCleared { .. } => EventKind::StoveCleared,
            Event::FireCleared { .. } => EventKind::FireCleared,
            Event::NpcSpawned { .. } => EventKind::NpcSpawned,
            Event::NpcSeated { .. } => EventKind::NpcSeated,
            Event::OrderDelivered { .. } => EventKind::OrderDelivered,
            Event::EndpointReleased { .. } => EventKind::EndpointReleased,
            Event::NpcDeparted { .. } => EventKind::NpcDeparted,
        }
    }
}

impl EventKind {
    /// Convert to usize index for array lookups.
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer — pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    /// Pre-allocated storage.
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    /// Number of events currently stored (may be less than capacity).
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event into the ring buffer. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    /// The total capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    /// Number of events currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events written since creation (including dropped).
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Iterate over events in order from oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head points to the next write position, which is the oldest entry
            self.head
        };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    /// Clear all events from the buffer.
    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over events in an [`EventBuffer`], from oldest to newest.
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only (UI, audio, analytics).
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// The central event bus. Holds one ring buffer per event kind, listener
/// lists, and suppression flags. Listeners are passive only: the kitchen
/// graph is fixed at construction, so nothing reacts to events by mutating.
pub struct EventBus {
    /// One ring buffer per event kind, lazily allocated on first emit.
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],

    /// Suppressed event kinds. Suppressed events are never buffered.
    suppressed: [bool; EVENT_KIND_COUNT],

    /// Listeners indexed by event kind, called in registration order.
    listeners: [Vec<PassiveListener>; EVENT_KIND_COUNT],

    /// Default buffer capacity for new event buffers.
    default_capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a new event bus with the given default buffer capacity per kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: std::array::from_fn(|_| Vec::new()),
            default_capacity,
        }
    }

    /// Suppress an event kind. Suppressed events are never allocated or buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        // Drop the buffer if it exists -- zero allocation for suppressed events.
        self.buffers[kind.index()] = None;
    }

    /// Check if an event kind is suppressed.
    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Emit an event. Stores it in the appropriate ring buffer. No-ops if
    /// the event kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();

        if self.suppressed[idx] {
            return;
        }

        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(self.default_capacity))
            .push(event);
    }

    /// Register a passive listener for an event kind. Listeners are called
    /// in registration order during delivery.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Deliver all buffered events to listeners, oldest to newest per kind,
    /// then clear the buffers. Called at the end of each simulation step.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            if self.suppressed[idx] {
                continue;
            }
            let Some(buffer) = self.buffers[idx].as_ref() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }

            // Collect into a temporary Vec to avoid borrow conflicts between
            // the buffer and the listeners.
            let events: Vec<Event> = buffer.iter().cloned().collect();
            for listener in &mut self.listeners[idx] {
                for event in &events {
                    listener(event);
                }
            }

            if let Some(buffer) = self.buffers[idx].as_mut() {
                buffer.clear();
            }
        }
    }

    /// Get the event buffer for a specific event kind (read-only).
    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Get the count of events currently buffered for a kind.
    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.len())
            .unwrap_or(0)
    }

    /// Get the total events ever emitted for a kind (including dropped).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.total_written())
            .unwrap_or(0)
    }

    /// Clear all buffers. Does not remove listeners or suppression settings.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
