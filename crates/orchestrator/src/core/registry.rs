//! Per-controller storage of entries waiting for their phase.

use lifecycle_core::{EntryHandle, LifecyclePhase};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where `admit` put an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Queued for a phase that has not opened yet.
    Pending,
    /// Queued to run before the currently open phase closes.
    Deferred,
    /// The same handle was already queued in that set.
    Duplicate,
}

/// An entry turned away because its phase already passed.
///
/// The handle is given back so the caller decides where it is dropped.
pub struct Rejected {
    pub entry: EntryHandle,
    pub target: LifecyclePhase,
    pub last_passed: LifecyclePhase,
}

impl std::fmt::Debug for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejected")
            .field("target", &self.target)
            .field("last_passed", &self.last_passed)
            .finish()
    }
}

/// Pending entries keyed by phase, plus the deferred set of the open window.
///
/// Sets are keyed by handle identity: queuing one `Arc` twice is a no-op.
/// Within a set, entries run in admission order.
#[derive(Default)]
pub struct PhaseRegistry {
    pending: BTreeMap<LifecyclePhase, Vec<EntryHandle>>,
    deferred: Vec<EntryHandle>,
}

impl PhaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide where `entry` goes given its target, the open phase and the
    /// last passed one.
    ///
    /// No entry code runs here; the caller reads `target` beforehand. A
    /// rejected entry leaves both sets untouched.
    pub fn admit(
        &mut self,
        entry: EntryHandle,
        target: LifecyclePhase,
        current: Option<LifecyclePhase>,
        last_passed: LifecyclePhase,
    ) -> Result<Admission, Rejected> {
        if target <= last_passed {
            return Err(Rejected {
                entry,
                target,
                last_passed,
            });
        }

        if current == Some(target) {
            return Ok(insert(&mut self.deferred, entry, Admission::Deferred));
        }

        let set = self.pending.entry(target).or_default();
        Ok(insert(set, entry, Admission::Pending))
    }

    /// Remove and return everything pending for `phase`.
    ///
    /// Phases are never revisited, so the snapshot is taken by removal.
    pub fn take_pending(&mut self, phase: LifecyclePhase) -> Vec<EntryHandle> {
        self.pending.remove(&phase).unwrap_or_default()
    }

    /// Remove and return the current deferred set.
    pub fn take_deferred(&mut self) -> Vec<EntryHandle> {
        std::mem::take(&mut self.deferred)
    }

    pub fn pending_len(&self, phase: LifecyclePhase) -> usize {
        self.pending.get(&phase).map_or(0, Vec::len)
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn total_pending(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Phases that still have entries waiting, in order.
    pub fn pending_phases(&self) -> Vec<LifecyclePhase> {
        self.pending
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(phase, _)| *phase)
            .collect()
    }
}

fn insert(set: &mut Vec<EntryHandle>, entry: EntryHandle, admitted: Admission) -> Admission {
    if set.iter().any(|queued| Arc::ptr_eq(queued, &entry)) {
        return Admission::Duplicate;
    }
    set.push(entry);
    admitted
}

impl std::fmt::Debug for PhaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending: BTreeMap<_, _> = self
            .pending
            .iter()
            .map(|(phase, set)| (*phase, set.len()))
            .collect();
        f.debug_struct("PhaseRegistry")
            .field("pending", &pending)
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
