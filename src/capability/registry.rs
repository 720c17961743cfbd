//! Capability registry, the lookup table the resolver works through.
//!
//! Built once at startup from the full capability list, validated, and
//! read-only thereafter. There is no ambient global: the registry is an
//! explicit `Rc` value handed to whoever needs lookup. It is also the
//! public entry point for `enable`/`disable` and the per-tick pump.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::capability::{Capability, CapabilityId, TickControl};
use super::resolver;
use crate::error::ConfigurationError;

/// Bound on the transition journal.
const TRANSITION_JOURNAL_CAPACITY: usize = 256;

/// A recorded enable/disable flip, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    pub capability: CapabilityId,
    /// `true` for an enabled-transition, `false` for disabled.
    pub enabled: bool,
    pub at: DateTime<Utc>,
    /// Monotonically increasing across the whole registry; total order of
    /// commits within and across resolution passes.
    pub sequence: u64,
}

/// Lookup table from capability identity to instance.
pub struct CapabilityRegistry {
    /// Capabilities in registration order; `tick_all` iterates this.
    capabilities: Vec<Rc<Capability>>,
    index: HashMap<CapabilityId, usize>,
    transitions: RefCell<VecDeque<TransitionEvent>>,
    sequence: Cell<u64>,
}

impl CapabilityRegistry {
    /// Build and validate a registry from the full capability set.
    ///
    /// Fails fast on configuration errors: duplicate ids, a capability
    /// referencing itself, or overlapping `requires_all`/`conflicts_with`
    /// sets. These are startup bugs, not runtime conditions.
    pub fn build(capabilities: Vec<Capability>) -> Result<Rc<Self>, ConfigurationError> {
        let mut index = HashMap::new();
        for (position, capability) in capabilities.iter().enumerate() {
            let id = capability.id();
            if index.insert(id, position).is_some() {
                return Err(ConfigurationError::DuplicateId { id });
            }
            Self::validate_relations(capability)?;
        }

        Ok(Rc::new(Self {
            capabilities: capabilities.into_iter().map(Rc::new).collect(),
            index,
            transitions: RefCell::new(VecDeque::new()),
            sequence: Cell::new(0),
        }))
    }

    fn validate_relations(capability: &Capability) -> Result<(), ConfigurationError> {
        let id = capability.id();
        let relations = capability.relations();

        for (relation, ids) in [
            ("requires_all", &relations.requires_all),
            ("requires_any_of", &relations.requires_any_of),
            ("conflicts_with", &relations.conflicts_with),
        ] {
            if ids.contains(&id) {
                return Err(ConfigurationError::SelfReference { id, relation });
            }
        }

        let conflicts: HashSet<_> = relations.conflicts_with.iter().collect();
        if let Some(other) = relations.requires_all.iter().find(|r| conflicts.contains(r)) {
            return Err(ConfigurationError::RequiresConflictOverlap { id, other: *other });
        }

        Ok(())
    }

    /// Look up a capability by id.
    pub fn find(&self, id: CapabilityId) -> Option<Rc<Capability>> {
        self.index.get(&id).map(|&position| self.capabilities[position].clone())
    }

    /// All capabilities, in registration order.
    pub fn capabilities(&self) -> &[Rc<Capability>] {
        &self.capabilities
    }

    /// Whether the capability exists and is enabled.
    pub fn is_enabled(&self, id: CapabilityId) -> bool {
        self.find(id).map_or(false, |capability| capability.is_enabled())
    }

    /// Enable a capability, resolving its relationships synchronously to a
    /// fixed point before returning.
    pub fn enable(self: &Rc<Self>, id: CapabilityId) {
        match self.find(id) {
            Some(capability) => resolver::enable(self, &capability),
            None => warn!("enable requested for unknown capability {id}"),
        }
    }

    /// Disable a capability, cascading to dependents synchronously.
    pub fn disable(self: &Rc<Self>, id: CapabilityId) {
        match self.find(id) {
            Some(capability) => resolver::disable(self, &capability),
            None => warn!("disable requested for unknown capability {id}"),
        }
    }

    /// Run one tick on every enabled capability, in registration order,
    /// then apply any self-disable requests. Relationship resolution from
    /// earlier in the tick has already settled by the time this runs.
    pub fn tick_all(self: &Rc<Self>) {
        let mut to_disable = Vec::new();
        for capability in &self.capabilities {
            if !capability.is_enabled() {
                continue;
            }
            let control = capability.behavior().borrow_mut().tick();
            if control == TickControl::DisableSelf {
                debug!("{} requested self-disable", capability.id());
                to_disable.push(capability.clone());
            }
        }
        for capability in to_disable {
            resolver::disable(self, &capability);
        }
    }

    /// Recent transition events, oldest first.
    pub fn recent_transitions(&self) -> Vec<TransitionEvent> {
        self.transitions.borrow().iter().cloned().collect()
    }

    pub(crate) fn record_transition(&self, capability: CapabilityId, enabled: bool) {
        let sequence = self.sequence.get();
        self.sequence.set(sequence + 1);
        debug!(
            "capability {capability} -> {}",
            if enabled { "enabled" } else { "disabled" }
        );
        let mut transitions = self.transitions.borrow_mut();
        if transitions.len() == TRANSITION_JOURNAL_CAPACITY {
            transitions.pop_front();
        }
        transitions.push_back(TransitionEvent { capability, enabled, at: Utc::now(), sequence });
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.capabilities.len())
            .finish()
    }
}
