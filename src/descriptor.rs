//! Lazily resolved, explicitly two-state type-descriptor cache.

use std::cell::RefCell;

use crate::error::Result;

/// Resolution state of a cached descriptor.
#[derive(Debug, Clone)]
enum DescriptorState<D> {
    Unresolved,
    Resolved(D),
}

/// A descriptor cache cell shared between clones of a reusable binder.
///
/// Only the (immutable) type name determines a descriptor, so resolving is
/// a one-shot operation: the first `resolve_with` pays the metadata round
/// trip, every later call returns the cached value. Replacing a binder's
/// values never invalidates the cell.
#[derive(Debug)]
pub(crate) struct DescriptorCell<D> {
    state: RefCell<DescriptorState<D>>,
}

impl<D: Clone> DescriptorCell<D> {
    pub(crate) fn new() -> Self {
        Self {
            state: RefCell::new(DescriptorState::Unresolved),
        }
    }

    /// Return the resolved descriptor, running `lookup` at most once over
    /// the lifetime of the cell.
    pub(crate) fn resolve_with<F>(&self, lookup: F) -> Result<D>
    where
        F: FnOnce() -> Result<D>,
    {
        if let DescriptorState::Resolved(d) = &*self.state.borrow() {
            return Ok(d.clone());
        }
        let d = lookup()?;
        *self.state.borrow_mut() = DescriptorState::Resolved(d.clone());
        Ok(d)
    }

    #[cfg(test)]
    pub(crate) fn is_resolved(&self) -> bool {
        matches!(&*self.state.borrow(), DescriptorState::Resolved(_))
    }
}
