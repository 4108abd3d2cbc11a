//! Ordered descriptor registry with staging for mutations requested during
//! a dispatch pass.
//!
//! Removal methods hand the removed descriptors back to the caller instead
//! of dropping them in place. Dropping a descriptor drops its handler, and a
//! handler's captured state may run arbitrary code on drop (including
//! calling back into the bus), so the bus drops them only after it has
//! released its borrow of the registry.

use std::any::Any;
use std::rc::{Rc, Weak};

use crate::subscriber::Descriptor;

/// Descriptors removed from the registry, to be dropped by the caller.
pub(crate) type Removed = Vec<Rc<Descriptor>>;

/// Outcome of applying the staged mutations.
#[derive(Debug, Default)]
pub(crate) struct Commit {
    pub(crate) added: usize,
    pub(crate) removed: Removed,
}

impl Commit {
    pub(crate) fn is_empty(&self) -> bool {
        self.added == 0 && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    /// Active descriptors in registration (and dispatch) order.
    descriptors: Vec<Rc<Descriptor>>,
    /// Registered while a dispatch was running.
    staged_additions: Vec<Rc<Descriptor>>,
    /// Unregistered or found dead while a dispatch was running.
    staged_removals: Vec<Rc<Descriptor>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append descriptors to the active list.
    pub(crate) fn add(&mut self, descriptors: Vec<Descriptor>) {
        self.descriptors
            .extend(descriptors.into_iter().map(Rc::new));
    }

    /// Hold descriptors back until the running dispatch commits.
    pub(crate) fn stage_add(&mut self, descriptors: Vec<Descriptor>) {
        self.staged_additions
            .extend(descriptors.into_iter().map(Rc::new));
    }

    /// Remove every descriptor of `subscriber` and every garbage descriptor.
    pub(crate) fn remove_matching(&mut self, subscriber: &Weak<dyn Any>) -> Removed {
        let (removed, kept) = std::mem::take(&mut self.descriptors)
            .into_iter()
            .partition(|d| d.is_garbage() || d.belongs_to(subscriber));
        self.descriptors = kept;
        removed
    }

    /// Mark every descriptor of `subscriber` and every garbage descriptor
    /// for removal at the next commit.
    pub(crate) fn stage_remove_matching(&mut self, subscriber: &Weak<dyn Any>) {
        let doomed: Vec<_> = self
            .descriptors
            .iter()
            .filter(|d| d.is_garbage() || d.belongs_to(subscriber))
            .cloned()
            .collect();
        for descriptor in &doomed {
            self.stage_removal(descriptor);
        }
    }

    /// Mark a single descriptor for removal at the next commit.
    pub(crate) fn stage_removal(&mut self, descriptor: &Rc<Descriptor>) {
        if !self
            .staged_removals
            .iter()
            .any(|d| Rc::ptr_eq(d, descriptor))
        {
            self.staged_removals.push(Rc::clone(descriptor));
        }
    }

    /// Drop staged additions belonging to `subscriber`.
    pub(crate) fn purge_staged(&mut self, subscriber: &Weak<dyn Any>) -> Removed {
        let (removed, kept) = std::mem::take(&mut self.staged_additions)
            .into_iter()
            .partition(|d| d.belongs_to(subscriber));
        self.staged_additions = kept;
        removed
    }

    /// Remove garbage descriptors from the active list.
    pub(crate) fn sweep_garbage(&mut self) -> Removed {
        let (removed, kept) = std::mem::take(&mut self.descriptors)
            .into_iter()
            .partition(|d| d.is_garbage());
        self.descriptors = kept;
        removed
    }

    /// Mark every garbage descriptor for removal at the next commit.
    pub(crate) fn stage_garbage(&mut self) {
        let doomed: Vec<_> = self
            .descriptors
            .iter()
            .filter(|d| d.is_garbage())
            .cloned()
            .collect();
        for descriptor in &doomed {
            self.stage_removal(descriptor);
        }
    }

    /// Apply staged additions, then staged removals, and clear both.
    pub(crate) fn commit_staged(&mut self) -> Commit {
        let added = self.staged_additions.len();
        self.descriptors.append(&mut self.staged_additions);

        let doomed = std::mem::take(&mut self.staged_removals);
        let (removed, kept) = std::mem::take(&mut self.descriptors)
            .into_iter()
            .partition(|d| doomed.iter().any(|x| Rc::ptr_eq(x, d)));
        self.descriptors = kept;

        Commit { added, removed }
    }

    /// A copy of the active list for iteration.
    pub(crate) fn snapshot(&self) -> Vec<Rc<Descriptor>> {
        self.descriptors.clone()
    }

    /// Active descriptors whose subscriber is still alive.
    pub(crate) fn live_count(&self) -> usize {
        self.descriptors.iter().filter(|d| d.is_live()).count()
    }

    /// Active descriptors, live or not.
    pub(crate) fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Staged additions plus staged removals.
    pub(crate) fn staged_len(&self) -> usize {
        self.staged_additions
            .len()
            .saturating_add(self.staged_removals.len())
    }
}
