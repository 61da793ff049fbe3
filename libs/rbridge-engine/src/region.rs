//! Per-call and per-query allocation regions.
//!
//! The host owns region lifetimes; this module only tracks which region is
//! current and what has been charged to each. Switching is scoped: a
//! [`RegionGuard`] restores the previous region when dropped, on every exit
//! path.

use std::cell::Cell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionScope {
    /// Reclaimed when the current call returns.
    Call,
    /// Reclaimed when the surrounding query finishes.
    Query,
}

impl fmt::Display for RegionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionScope::Call => f.write_str("call"),
            RegionScope::Query => f.write_str("query"),
        }
    }
}

#[derive(Debug)]
pub struct MemoryRegion {
    scope: RegionScope,
    bytes: Cell<usize>,
    allocations: Cell<usize>,
}

impl MemoryRegion {
    fn new(scope: RegionScope) -> Self {
        Self {
            scope,
            bytes: Cell::new(0),
            allocations: Cell::new(0),
        }
    }

    pub fn scope(&self) -> RegionScope {
        self.scope
    }

    pub fn bytes(&self) -> usize {
        self.bytes.get()
    }

    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    fn charge(&self, bytes: usize) {
        self.bytes.set(self.bytes.get() + bytes);
        self.allocations.set(self.allocations.get() + 1);
    }

    fn reset(&self) {
        self.bytes.set(0);
        self.allocations.set(0);
    }
}

/// The two regions visible to one call, plus the current-region marker.
///
/// Single-threaded by construction (`Cell`), matching the one-call-one-owner model.
#[derive(Debug)]
pub struct CallRegions {
    call: MemoryRegion,
    query: MemoryRegion,
    current: Cell<RegionScope>,
}

impl Default for CallRegions {
    fn default() -> Self {
        Self::new()
    }
}

impl CallRegions {
    pub fn new() -> Self {
        Self {
            call: MemoryRegion::new(RegionScope::Call),
            query: MemoryRegion::new(RegionScope::Query),
            current: Cell::new(RegionScope::Call),
        }
    }

    pub fn current(&self) -> RegionScope {
        self.current.get()
    }

    pub fn region(&self, scope: RegionScope) -> &MemoryRegion {
        match scope {
            RegionScope::Call => &self.call,
            RegionScope::Query => &self.query,
        }
    }

    /// Make `scope` current until the returned guard is dropped.
    #[must_use = "the previous region is restored as soon as the guard is dropped"]
    pub fn switch_to(&self, scope: RegionScope) -> RegionGuard<'_> {
        let previous = self.current.replace(scope);
        tracing::trace!(from = %previous, to = %scope, "switched allocation region");
        RegionGuard { regions: self, previous }
    }

    /// Account `bytes` to the current region.
    pub fn charge(&self, bytes: usize) {
        self.region(self.current()).charge(bytes);
    }

    /// Reclaim the per-call region (the host does this when a call returns).
    pub fn end_call(&self) {
        self.call.reset();
    }
}

pub struct RegionGuard<'a> {
    regions: &'a CallRegions,
    previous: RegionScope,
}

impl Drop for RegionGuard<'_> {
    fn drop(&mut self) {
        let left = self.regions.current.replace(self.previous);
        tracing::trace!(from = %left, to = %self.previous, "restored allocation region");
    }
}
