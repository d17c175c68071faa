//! Pub/Sub event bus plus the runtime's event types.
//!
//! Components subscribe to event types with callbacks (invoked immediately
//! on emit); emitted events are also queued so the host's main loop can
//! batch-process them via `poll()`. Callback order is FIFO within one event
//! type; cross-type ordering is undefined.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::warn;
use uuid::Uuid;

/// Maximum events in the deferred queue before oldest are evicted.
const MAX_QUEUE_SIZE: usize = 1000;

// === Runtime events ===

/// Broadcast when the project is stopped (red stop button). Handlers must
/// treat it as a one-shot cancel: the runtime has already cleared both play
/// queues and reset non-blocking sound slots when this fires.
#[derive(Clone, Debug)]
pub struct ProjectStopAllEvent;

/// Emitted when a video play reaches its bound and leaves the queue.
#[derive(Clone, Debug)]
pub struct VideoPlayFinishedEvent {
    pub target_id: Uuid,
    pub play_id: Uuid,
}

/// Emitted when an audio play reaches its end sample and leaves the queue.
#[derive(Clone, Debug)]
pub struct AudioPlayFinishedEvent {
    pub target_id: Uuid,
    pub play_id: Uuid,
}

// === Bus ===

/// Marker trait for events. Blanket-implemented for all qualifying types.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Boxed event for queue storage.
pub type BoxedEvent = Box<dyn Event>;

/// Pub/Sub bus with deferred processing support.
///
/// Two modes work together: `subscribe()` callbacks fire synchronously on
/// `emit()`, and every emitted event is also queued for `poll()`.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<TypeId, Vec<Callback>>>>,
    queue: Arc<Mutex<Vec<BoxedEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of type E. The callback is invoked immediately
    /// whenever `emit()` is called with an E.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Emit event: invoke callbacks immediately and queue for `poll()`.
    pub fn emit<E: Event + Clone>(&self, event: E) {
        if let Some(cbs) = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
        {
            for cb in cbs {
                cb(&event);
            }
        }

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict = queue.len() / 2;
            warn!("event queue full ({} events), evicting oldest {}", queue.len(), evict);
            queue.drain(0..evict);
        }
        queue.push(Box::new(event));
    }

    /// Drain all queued events for batch processing in the host loop.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Check whether anyone listens for event type E.
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    /// Drop all subscribers and queued events.
    pub fn clear(&self) {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Downcast a queued event to a concrete type.
///
/// Must deref to `dyn Event` before `as_any()`: the blanket impl also covers
/// `Box<dyn Event>`, and calling through the box would wrap the wrong type.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}
