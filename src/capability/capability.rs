//! Capability definition: the unit of independently toggleable behavior.
//!
//! A capability wraps two complementary observable flags (`enabled`,
//! `disabled`), declares static relationships to other capabilities, and
//! carries a boxed [`CapabilityBehavior`] holding the domain logic. State
//! transitions go exclusively through the resolver (via
//! [`CapabilityRegistry`](super::registry::CapabilityRegistry)); the flags
//! themselves are read-only to consumers but independently observable.

use std::cell::{Cell, RefCell};

use crate::observable::{ListenerId, ObservableFlag};

/// Stable namespaced identity of a capability, e.g. `automatic:wood_cutter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityId(pub &'static str);

impl CapabilityId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Static relationship lists declared by a capability.
#[derive(Debug, Clone, Default)]
pub struct Relations {
    /// All of these must be enabled; enabling self force-enables them, and
    /// any of them going down takes self down with it.
    pub requires_all: Vec<CapabilityId>,
    /// At least one of these should be enabled. Never auto-satisfied;
    /// self is force-disabled only once the last enabled peer goes down.
    pub requires_any_of: Vec<CapabilityId>,
    /// Mutually exclusive peers; enabling self force-disables them and
    /// vice versa.
    pub conflicts_with: Vec<CapabilityId>,
}

impl Relations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requires_all(mut self, ids: impl IntoIterator<Item = CapabilityId>) -> Self {
        self.requires_all.extend(ids);
        self
    }

    pub fn requires_any_of(mut self, ids: impl IntoIterator<Item = CapabilityId>) -> Self {
        self.requires_any_of.extend(ids);
        self
    }

    pub fn conflicts_with(mut self, ids: impl IntoIterator<Item = CapabilityId>) -> Self {
        self.conflicts_with.extend(ids);
        self
    }
}

/// What a behavior asks of the registry after its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    /// Keep going.
    Continue,
    /// Disable this capability once the tick pass completes. Behaviors use
    /// this instead of calling back into the registry mid-tick.
    DisableSelf,
}

/// Domain logic attached to a capability.
///
/// Hooks fire synchronously from the resolver; `tick` fires once per
/// external clock tick while the capability is enabled and must return
/// within the tick budget.
pub trait CapabilityBehavior {
    /// Called when the capability transitions to enabled.
    fn on_enabled(&mut self) {}

    /// Called when the capability transitions to disabled. Expected to
    /// drop in-flight work (clear schedulers, release controls).
    fn on_disabled(&mut self) {}

    /// One tick of work.
    fn tick(&mut self) -> TickControl {
        TickControl::Continue
    }
}

/// A behavior with no logic of its own, for capabilities that exist purely
/// as nodes in the relationship graph.
#[derive(Debug, Default)]
pub struct NoopBehavior;

impl CapabilityBehavior for NoopBehavior {}

/// A resolver listener registered on a peer capability, remembered so it
/// can be unregistered on disable.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolverSubscription {
    /// The peer the listener was registered on.
    pub target: CapabilityId,
    /// Which of the peer's flags it watches.
    pub flag: WatchedFlag,
    pub listener: ListenerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatchedFlag {
    Enabled,
    Disabled,
}

/// An independently toggleable unit of behavior.
///
/// Constructed disabled; transitions only through the registry's
/// `enable`/`disable`, which drive the resolver.
pub struct Capability {
    id: CapabilityId,
    relations: Relations,
    enabled: ObservableFlag<bool>,
    disabled: ObservableFlag<bool>,
    behavior: RefCell<Box<dyn CapabilityBehavior>>,
    /// Resolver listeners registered on peers; live only while enabled.
    pub(crate) resolver_subs: RefCell<Vec<ResolverSubscription>>,
    /// True while an `enable` resolution pass for this capability is on the
    /// stack. Breaks require-cycles and lets OR checks count a peer that is
    /// being driven to enabled.
    pub(crate) enabling: Cell<bool>,
}

impl Capability {
    /// Create a capability in the disabled state.
    pub fn new(id: CapabilityId, relations: Relations, behavior: Box<dyn CapabilityBehavior>) -> Self {
        Self {
            id,
            relations,
            enabled: ObservableFlag::new(false),
            disabled: ObservableFlag::new(true),
            behavior: RefCell::new(behavior),
            resolver_subs: RefCell::new(Vec::new()),
            enabling: Cell::new(false),
        }
    }

    pub fn id(&self) -> CapabilityId {
        self.id
    }

    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    /// The enabled flag, for observation.
    pub fn enabled_flag(&self) -> &ObservableFlag<bool> {
        &self.enabled
    }

    /// The disabled flag, for observation.
    pub fn disabled_flag(&self) -> &ObservableFlag<bool> {
        &self.disabled
    }

    pub(crate) fn behavior(&self) -> &RefCell<Box<dyn CapabilityBehavior>> {
        &self.behavior
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("id", &self.id)
            .field("enabled", &self.enabled.get())
            .field("relations", &self.relations)
            .finish()
    }
}
