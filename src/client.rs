//! Host integration: the tick clock and the input funnel.
//!
//! All capability mutation happens on the tick thread. Host-side input
//! (key binds, UI, commands) runs elsewhere, so toggle requests travel
//! through a channel and are drained at the top of each tick. Resolution
//! for each drained request settles fully before the behaviors run.

use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};

use log::debug;

use crate::capability::{CapabilityId, CapabilityRegistry};

/// Driven by the host once per game tick (~20 Hz nominal).
pub trait Clock {
    fn on_tick(&mut self);
}

/// A capability mutation requested from outside the tick thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleRequest {
    Enable(CapabilityId),
    Disable(CapabilityId),
    /// Enable if disabled, disable if enabled, decided at drain time.
    Toggle(CapabilityId),
}

/// Cloneable sender half handed to input threads.
#[derive(Debug, Clone)]
pub struct AutopilotHandle {
    sender: Sender<ToggleRequest>,
}

impl AutopilotHandle {
    /// Queue a request for the next tick. A dropped `Autopilot` makes this
    /// a no-op rather than an error the input thread has to handle.
    pub fn send(&self, request: ToggleRequest) {
        if self.sender.send(request).is_err() {
            debug!("toggle request {request:?} dropped, autopilot gone");
        }
    }
}

/// Owns the registry and pumps it from the host clock.
pub struct Autopilot {
    registry: Rc<CapabilityRegistry>,
    requests: Receiver<ToggleRequest>,
    sender: Sender<ToggleRequest>,
}

impl Autopilot {
    pub fn new(registry: Rc<CapabilityRegistry>) -> Self {
        let (sender, requests) = channel();
        Self { registry, requests, sender }
    }

    /// A new handle for an input thread.
    pub fn handle(&self) -> AutopilotHandle {
        AutopilotHandle { sender: self.sender.clone() }
    }

    pub fn registry(&self) -> &Rc<CapabilityRegistry> {
        &self.registry
    }

    fn apply(&self, request: ToggleRequest) {
        match request {
            ToggleRequest::Enable(id) => self.registry.enable(id),
            ToggleRequest::Disable(id) => self.registry.disable(id),
            ToggleRequest::Toggle(id) => {
                if self.registry.is_enabled(id) {
                    self.registry.disable(id);
                } else {
                    self.registry.enable(id);
                }
            }
        }
    }
}

impl Clock for Autopilot {
    /// Drain queued toggle requests (each resolving to a fixed point before
    /// the next is applied), then tick every enabled capability.
    fn on_tick(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            self.apply(request);
        }
        self.registry.tick_all();
    }
}
