// SPDX-License-Identifier: GPL-3.0-only

//! In-process pub/sub. Single-threaded, synchronous, FIFO by subscription
//! insertion order — matches the single-threaded event loop the rest of the
//! compositor runs on.

use std::time::{SystemTime, UNIX_EPOCH};

/// Closed set of event kinds. Matches the C original's `SwlEventType` 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    ClientCreate,
    ClientDestroy,
    ClientFocus,
    ClientUnfocus,
    ClientFullscreen,
    ClientFloat,
    ClientMove,
    ClientResize,
    ClientUrgent,
    ClientTag,
    MonitorAdd,
    MonitorRemove,
    MonitorFocus,
    LayoutChange,
    KeyPress,
    KeyRelease,
    ConfigReload,
    RenderStart,
    RenderEnd,
    LayerMap,
    LayerUnmap,
    SessionLock,
    SessionUnlock,
    LidClose,
    LidOpen,
}

impl EventType {
    /// Name used in IPC `subscribe` arguments and NDJSON payloads.
    pub fn name(self) -> &'static str {
        match self {
            EventType::ClientCreate => "CLIENT_CREATE",
            EventType::ClientDestroy => "CLIENT_DESTROY",
            EventType::ClientFocus => "CLIENT_FOCUS",
            EventType::ClientUnfocus => "CLIENT_UNFOCUS",
            EventType::ClientFullscreen => "CLIENT_FULLSCREEN",
            EventType::ClientFloat => "CLIENT_FLOAT",
            EventType::ClientMove => "CLIENT_MOVE",
            EventType::ClientResize => "CLIENT_RESIZE",
            EventType::ClientUrgent => "CLIENT_URGENT",
            EventType::ClientTag => "CLIENT_TAG",
            EventType::MonitorAdd => "MONITOR_ADD",
            EventType::MonitorRemove => "MONITOR_REMOVE",
            EventType::MonitorFocus => "MONITOR_FOCUS",
            EventType::LayoutChange => "LAYOUT_CHANGE",
            EventType::KeyPress => "KEY_PRESS",
            EventType::KeyRelease => "KEY_RELEASE",
            EventType::ConfigReload => "CONFIG_RELOAD",
            EventType::RenderStart => "RENDER_START",
            EventType::RenderEnd => "RENDER_END",
            EventType::LayerMap => "LAYER_MAP",
            EventType::LayerUnmap => "LAYER_UNMAP",
            EventType::SessionLock => "SESSION_LOCK",
            EventType::SessionUnlock => "SESSION_UNLOCK",
            EventType::LidClose => "LID_CLOSE",
            EventType::LidOpen => "LID_OPEN",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "CLIENT_CREATE" => EventType::ClientCreate,
            "CLIENT_DESTROY" => EventType::ClientDestroy,
            "CLIENT_FOCUS" => EventType::ClientFocus,
            "CLIENT_UNFOCUS" => EventType::ClientUnfocus,
            "CLIENT_FULLSCREEN" => EventType::ClientFullscreen,
            "CLIENT_FLOAT" => EventType::ClientFloat,
            "CLIENT_MOVE" => EventType::ClientMove,
            "CLIENT_RESIZE" => EventType::ClientResize,
            "CLIENT_URGENT" => EventType::ClientUrgent,
            "CLIENT_TAG" => EventType::ClientTag,
            "MONITOR_ADD" => EventType::MonitorAdd,
            "MONITOR_REMOVE" => EventType::MonitorRemove,
            "MONITOR_FOCUS" => EventType::MonitorFocus,
            "LAYOUT_CHANGE" => EventType::LayoutChange,
            "KEY_PRESS" => EventType::KeyPress,
            "KEY_RELEASE" => EventType::KeyRelease,
            "CONFIG_RELOAD" => EventType::ConfigReload,
            "RENDER_START" => EventType::RenderStart,
            "RENDER_END" => EventType::RenderEnd,
            "LAYER_MAP" => EventType::LayerMap,
            "LAYER_UNMAP" => EventType::LayerUnmap,
            "SESSION_LOCK" => EventType::SessionLock,
            "SESSION_UNLOCK" => EventType::SessionUnlock,
            "LID_CLOSE" => EventType::LidClose,
            "LID_OPEN" => EventType::LidOpen,
            _ => return None,
        })
    }
}

/// Payload carried by a fired event. `data` is an opaque, non-owning value
/// supplied by the emitter — components that care about the payload know
/// how to interpret it for the event types they subscribe to.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventType,
    pub timestamp_ms: u64,
    pub data: EventData,
}

/// Concrete payload shapes. Kept as a sum type instead of the C original's
/// `void *` so subscribers pattern-match instead of reinterpret-casting.
#[derive(Debug, Clone, Default)]
pub enum EventData {
    #[default]
    None,
    Client(crate::shell::client::ClientId),
    Monitor(crate::shell::monitor::MonitorId),
    Key {
        mods: u32,
        keysym: u32,
    },
    Text(String),
}

/// Monotonic, never-reused handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: EventType,
    handler: Box<dyn FnMut(&Event)>,
}

/// Default capacity mirrored from the original's fixed-size subscriber
/// table; kept as a configured constant per the "fixed caps are adequate"
/// re-architecture note rather than reworked into something unbounded.
pub const MAX_SUBSCRIPTIONS: usize = 256;

pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            subscriptions: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers a handler for `kind`. Returns `None` once capacity is
    /// exhausted — this is the bus's only failure mode.
    pub fn subscribe(
        &mut self,
        kind: EventType,
        handler: impl FnMut(&Event) + 'static,
    ) -> Option<SubscriptionId> {
        if self.subscriptions.len() >= MAX_SUBSCRIPTIONS {
            return None;
        }
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            kind,
            handler: Box::new(handler),
        });
        Some(id)
    }

    /// Idempotent: unsubscribing a stale or unknown id is a no-op.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.retain(|s| s.id != id);
    }

    /// Dispatches synchronously, in insertion order, to every subscription
    /// matching `event.kind` at the moment dispatch started. Subscriptions
    /// added or removed by a handler during this call only affect future
    /// emits.
    pub fn emit(&mut self, event: Event) {
        let matching: Vec<usize> = self
            .subscriptions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == event.kind)
            .map(|(i, _)| i)
            .collect();
        for i in matching {
            if let Some(sub) = self.subscriptions.get_mut(i) {
                (sub.handler)(&event);
            }
        }
    }

    /// Convenience wrapper stamping the current time.
    pub fn emit_simple(&mut self, kind: EventType, data: EventData) {
        self.emit(Event {
            kind,
            timestamp_ms: now_ms(),
            data,
        });
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
