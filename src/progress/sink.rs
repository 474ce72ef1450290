//! Event sinks.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use super::events::PatchEvent;

/// Receives every event a run produces, in order.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PatchEvent);
}

/// Logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PatchEvent) {
        match &event {
            PatchEvent::PassStarted { pass, patches } => info!(%pass, patches, "{}", event),
            PatchEvent::ApplyingEdit { .. }
            | PatchEvent::ApplyingCopy { .. }
            | PatchEvent::ApplyingDelete { .. }
            | PatchEvent::PatchLoop { .. } => debug!("{}", event),
            PatchEvent::NeedsUnsatisfiedRoot { origin }
            | PatchEvent::NeedsUnsatisfiedNode { origin, .. }
            | PatchEvent::NeedsUnsatisfiedValue { origin, .. }
            | PatchEvent::NeedsUnsatisfiedPass { origin, .. } => {
                info!(file = %origin.url, "{}", event)
            }
            PatchEvent::Warning { origin, .. } => warn!(file = %origin.url, "{}", event),
            PatchEvent::Error { origin, .. } => error!(file = %origin.url, "{}", event),
            PatchEvent::Exception { origin, patch, .. } => {
                error!(file = %origin.url, "{}\n{}", event, patch)
            }
        }
    }
}

/// Producer side of the worker's event channel.
///
/// A closed receiver drops events; the run itself is unaffected.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<PatchEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<PatchEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PatchEvent) {
        let _ = self.sender.send(event);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectSink {
    events: Arc<Mutex<Vec<PatchEvent>>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events collected so far.
    pub fn events(&self) -> Vec<PatchEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl EventSink for CollectSink {
    fn emit(&self, event: PatchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PatchEvent) {}
}
