//! Dependency resolution between capabilities.
//!
//! Invoked on every enable/disable. Enabling a capability force-enables its
//! `requires_all` targets, force-disables its `conflicts_with` targets, and
//! registers transient listeners so that later peer transitions propagate:
//! a required capability going down, or a conflicting one coming up, takes
//! the dependent down with it. Listeners live only while the dependent is
//! enabled and are unregistered on disable.
//!
//! Resolution is recursive and re-entrant. Termination is bounded by
//! idempotence, not cycle detection: a capability already in its target
//! state (or already mid-enable) is a no-op and cannot re-trigger the
//! chain. `requires_all` satisfaction runs before `conflicts_with`
//! eviction, so a chain may newly require something that itself evicts a
//! third capability, depth-first.

use std::rc::{Rc, Weak};

use log::warn;

use super::capability::{Capability, CapabilityId, ResolverSubscription, WatchedFlag};
use super::registry::CapabilityRegistry;

/// Enable `cap`, resolving its relationships.
///
/// No-op if already enabled or already mid-enable. May recursively enable
/// or disable arbitrary other capabilities; callers must not assume the
/// call stack stays one deep.
pub(crate) fn enable(registry: &Rc<CapabilityRegistry>, cap: &Rc<Capability>) {
    if cap.is_enabled() || cap.enabling.get() {
        return;
    }
    cap.enabling.set(true);

    register_resolver_listeners(registry, cap);

    // AND satisfaction before conflict eviction.
    for target in &cap.relations().requires_all {
        match registry.find(*target) {
            Some(peer) => enable(registry, &peer),
            None => warn!("{}: required capability {target} not registered, treating as satisfied", cap.id()),
        }
    }

    for target in &cap.relations().conflicts_with {
        match registry.find(*target) {
            Some(peer) => {
                if peer.is_enabled() {
                    disable(registry, &peer);
                }
            }
            None => warn!("{}: conflicting capability {target} not registered, ignoring", cap.id()),
        }
    }

    // Flip the flags. The enabled transition fires peer listeners, which
    // may cascade further.
    registry.record_transition(cap.id(), true);
    cap.disabled_flag().set(false);
    cap.enabled_flag().set(true);
    cap.enabling.set(false);

    // A transitive cascade (a conflict eviction tearing down a required
    // chain) can take a requirement down while our flags were still
    // mid-flip, before our requires_all listener was armed to react.
    // Recheck at commit time; mid-enable peers count as up.
    let requirement_down = cap.relations().requires_all.iter().any(|id| {
        registry
            .find(*id)
            .map_or(false, |peer| !peer.is_enabled() && !peer.enabling.get())
    });
    if requirement_down && cap.is_enabled() {
        disable(registry, cap);
    }

    // A listener cascade may already have taken us down again; only fire
    // the hook if the enable actually stuck.
    if cap.is_enabled() {
        cap.behavior().borrow_mut().on_enabled();
    }
}

/// Disable `cap`, unregistering its resolver listeners first.
///
/// No-op if already disabled. The disabled transition fires dependents'
/// listeners, which force-disable them in the same resolution pass.
pub(crate) fn disable(registry: &Rc<CapabilityRegistry>, cap: &Rc<Capability>) {
    if cap.is_disabled() {
        return;
    }

    unregister_resolver_listeners(registry, cap);

    registry.record_transition(cap.id(), false);
    cap.enabled_flag().set(false);
    cap.disabled_flag().set(true);

    cap.behavior().borrow_mut().on_disabled();
}

/// Whether any `requires_any_of` peer of `cap` is enabled or currently
/// being driven to enabled. Vacuously true for an empty OR set; missing
/// peers count as absent.
fn any_or_peer_up(registry: &Rc<CapabilityRegistry>, cap: &Capability) -> bool {
    if cap.relations().requires_any_of.is_empty() {
        return true;
    }
    cap.relations()
        .requires_any_of
        .iter()
        .filter_map(|id| registry.find(*id))
        .any(|peer| peer.is_enabled() || peer.enabling.get())
}

/// Force-disable the dependent identified by `id`, if it still exists and
/// is still enabled. Shared tail of every resolver listener.
fn force_disable(registry: &Weak<CapabilityRegistry>, id: CapabilityId) {
    let Some(registry) = registry.upgrade() else {
        return;
    };
    let Some(cap) = registry.find(id) else {
        return;
    };
    if cap.is_enabled() {
        disable(&registry, &cap);
    }
}

fn register_resolver_listeners(registry: &Rc<CapabilityRegistry>, cap: &Rc<Capability>) {
    let mut subs = Vec::new();
    let self_id = cap.id();

    // Required peer goes down -> self goes down.
    for target in &cap.relations().requires_all {
        let Some(peer) = registry.find(*target) else {
            continue;
        };
        let weak = Rc::downgrade(registry);
        let listener = peer.disabled_flag().subscribe(move |_, new_disabled| {
            if *new_disabled {
                force_disable(&weak, self_id);
            }
        });
        subs.push(ResolverSubscription { target: *target, flag: WatchedFlag::Disabled, listener });
    }

    // Last OR peer goes down -> self goes down.
    for target in &cap.relations().requires_any_of {
        let Some(peer) = registry.find(*target) else {
            continue;
        };
        let weak = Rc::downgrade(registry);
        let listener = peer.disabled_flag().subscribe(move |_, new_disabled| {
            if !*new_disabled {
                return;
            }
            let Some(registry) = weak.upgrade() else {
                return;
            };
            let Some(me) = registry.find(self_id) else {
                return;
            };
            if me.is_enabled() && !any_or_peer_up(&registry, &me) {
                disable(&registry, &me);
            }
        });
        subs.push(ResolverSubscription { target: *target, flag: WatchedFlag::Disabled, listener });
    }

    // Conflicting peer comes up -> self goes down.
    for target in &cap.relations().conflicts_with {
        let Some(peer) = registry.find(*target) else {
            continue;
        };
        let weak = Rc::downgrade(registry);
        let listener = peer.enabled_flag().subscribe(move |_, new_enabled| {
            if *new_enabled {
                force_disable(&weak, self_id);
            }
        });
        subs.push(ResolverSubscription { target: *target, flag: WatchedFlag::Enabled, listener });
    }

    cap.resolver_subs.borrow_mut().extend(subs);
}

fn unregister_resolver_listeners(registry: &Rc<CapabilityRegistry>, cap: &Rc<Capability>) {
    let subs = std::mem::take(&mut *cap.resolver_subs.borrow_mut());
    for sub in subs {
        let Some(peer) = registry.find(sub.target) else {
            continue;
        };
        let flag = match sub.flag {
            WatchedFlag::Enabled => peer.enabled_flag(),
            WatchedFlag::Disabled => peer.disabled_flag(),
        };
        flag.unsubscribe(sub.listener);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::capability::capability::{Capability, CapabilityId, NoopBehavior, Relations};
    use crate::capability::registry::CapabilityRegistry;

    const A: CapabilityId = CapabilityId("test:a");
    const B: CapabilityId = CapabilityId("test:b");
    const C: CapabilityId = CapabilityId("test:c");
    const D: CapabilityId = CapabilityId("test:d");

    fn cap(id: CapabilityId, relations: Relations) -> Capability {
        Capability::new(id, relations, Box::new(NoopBehavior))
    }

    fn build(caps: Vec<Capability>) -> Rc<CapabilityRegistry> {
        CapabilityRegistry::build(caps).expect("valid configuration")
    }

    #[test]
    fn enable_is_idempotent_with_zero_listener_firings() {
        let registry = build(vec![cap(A, Relations::new())]);
        registry.enable(A);

        let a = registry.find(A).unwrap();
        let fired = Rc::new(Cell::new(0u32));
        let fired_clone = fired.clone();
        a.enabled_flag().subscribe(move |_, _| fired_clone.set(fired_clone.get() + 1));

        registry.enable(A);
        assert!(a.is_enabled());
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn and_dependency_enables_target_and_propagates_disable() {
        let registry = build(vec![
            cap(A, Relations::new().requires_all([B])),
            cap(B, Relations::new()),
        ]);

        registry.enable(A);
        assert!(registry.is_enabled(A));
        assert!(registry.is_enabled(B), "requires_all target is force-enabled");

        registry.disable(B);
        assert!(!registry.is_enabled(B));
        assert!(!registry.is_enabled(A), "dependent forced down in the same pass");
    }

    #[test]
    fn and_dependency_listener_removed_after_disable() {
        let registry = build(vec![
            cap(A, Relations::new().requires_all([B])),
            cap(B, Relations::new()),
        ]);

        registry.enable(A);
        registry.disable(A);

        // B toggling no longer affects A.
        registry.enable(B);
        registry.disable(B);
        assert!(!registry.is_enabled(A));
        assert_eq!(registry.find(B).unwrap().disabled_flag().listener_count(), 0);
    }

    #[test]
    fn require_cycle_terminates_and_enables_both() {
        let registry = build(vec![
            cap(A, Relations::new().requires_all([B])),
            cap(B, Relations::new().requires_all([A])),
        ]);

        registry.enable(A);
        assert!(registry.is_enabled(A));
        assert!(registry.is_enabled(B));

        registry.disable(B);
        assert!(!registry.is_enabled(A));
        assert!(!registry.is_enabled(B));
    }

    #[test]
    fn or_dependency_is_passive_and_disables_when_all_peers_gone() {
        let registry = build(vec![
            cap(C, Relations::new().requires_any_of([B, D])),
            cap(B, Relations::new()),
            cap(D, Relations::new()),
        ]);

        registry.enable(B);
        registry.enable(D);
        registry.enable(C);
        assert!(registry.is_enabled(C));
        // Enabling C never force-enabled its OR peers beyond what we did.
        assert!(registry.is_enabled(B));
        assert!(registry.is_enabled(D));

        registry.disable(B);
        assert!(registry.is_enabled(C), "one OR peer still up");

        registry.disable(D);
        assert!(!registry.is_enabled(C), "all OR peers gone");
    }

    #[test]
    fn enabling_or_dependent_does_not_enable_peers() {
        let registry = build(vec![
            cap(C, Relations::new().requires_any_of([B, D])),
            cap(B, Relations::new()),
            cap(D, Relations::new()),
        ]);

        registry.enable(C);
        assert!(registry.is_enabled(C));
        assert!(!registry.is_enabled(B));
        assert!(!registry.is_enabled(D));
    }

    #[test]
    fn conflict_eviction_both_directions() {
        let registry = build(vec![
            cap(A, Relations::new().conflicts_with([B])),
            cap(B, Relations::new().conflicts_with([A])),
        ]);

        registry.enable(B);
        registry.enable(A);
        assert!(registry.is_enabled(A), "newly enabled capability wins");
        assert!(!registry.is_enabled(B), "conflicting peer evicted");

        registry.enable(B);
        assert!(registry.is_enabled(B));
        assert!(!registry.is_enabled(A));
    }

    #[test]
    fn conflict_listener_fires_even_without_reciprocal_declaration() {
        // Only A declares the conflict; B coming up must still take A down.
        let registry = build(vec![
            cap(A, Relations::new().conflicts_with([B])),
            cap(B, Relations::new()),
        ]);

        registry.enable(A);
        registry.enable(B);
        assert!(registry.is_enabled(B));
        assert!(!registry.is_enabled(A));
    }

    #[test]
    fn transitive_requirement_conflict_settles_fully_disabled() {
        // A needs B, B needs C, and A evicts C: enabling A tears its own
        // requirement chain down. A must not stay enabled with B down.
        let registry = build(vec![
            cap(A, Relations::new().requires_all([B]).conflicts_with([C])),
            cap(B, Relations::new().requires_all([C])),
            cap(C, Relations::new()),
        ]);

        registry.enable(A);
        assert!(!registry.is_enabled(A));
        assert!(!registry.is_enabled(B));
        assert!(!registry.is_enabled(C));
    }

    #[test]
    fn missing_capability_is_treated_as_absent() {
        let registry = build(vec![cap(A, Relations::new().requires_all([CapabilityId("test:ghost")]))]);
        registry.enable(A);
        assert!(registry.is_enabled(A));
    }

    #[test]
    fn ai_mode_scenario() {
        const AI: CapabilityId = CapabilityId("test:ai_mode");
        const VM: CapabilityId = CapabilityId("test:vein_miner");
        const WC: CapabilityId = CapabilityId("test:wood_cutter");

        let registry = build(vec![
            cap(AI, Relations::new().requires_any_of([VM, WC])),
            cap(VM, Relations::new().conflicts_with([WC])),
            cap(WC, Relations::new().conflicts_with([VM])),
        ]);

        registry.enable(WC);
        registry.enable(AI);
        assert!(registry.is_enabled(AI));

        // VeinMiner evicts WoodCutter, but still satisfies AiMode's OR.
        registry.enable(VM);
        assert!(!registry.is_enabled(WC));
        assert!(registry.is_enabled(VM));
        assert!(registry.is_enabled(AI), "remaining OR peer keeps AiMode up");

        // Last OR peer gone takes AiMode down with it.
        registry.disable(VM);
        assert!(!registry.is_enabled(AI));
    }

    #[test]
    fn transition_journal_records_resolution_order() {
        let registry = build(vec![
            cap(A, Relations::new().requires_all([B])),
            cap(B, Relations::new()),
        ]);

        registry.enable(A);
        let transitions: Vec<_> = registry
            .recent_transitions()
            .iter()
            .map(|event| (event.capability, event.enabled))
            .collect();
        // B commits before A: the dependency is satisfied first.
        assert_eq!(transitions, vec![(B, true), (A, true)]);
    }
}
