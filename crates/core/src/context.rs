//! Execution context: group count, policy flags, parallelism hint
//!
//! Every kernel reads its configuration from a [`Context`] snapshot taken at
//! call entry. The library also keeps a process-global context behind
//! [`set_ctx`]/[`ctx`] so scripts can configure once and call operators
//! without threading a context everywhere.
//!
//! # Data races
//!
//! The global context is a plain read/write cell. A call snapshots it once
//! at entry; mutating the global while other threads are inside a kernel
//! call is **not** defended against and the result of such a race is the
//! caller's responsibility. Configure first, then compute.

use crate::error::Result;
use crate::series::GroupLayout;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

bitflags::bitflags! {
    /// Policy flags honored by every windowed kernel.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Emit NaN for the first `periods - 1` outputs of each window
        /// operation instead of partial-window results.
        const STRICTLY_CYCLE = 0b0000_0001;
        /// Exclude NaN values from window reductions; the window slides
        /// over valid values and counts carry forward.
        const SKIP_NAN       = 0b0000_0010;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::empty()
    }
}

/// Immutable per-call configuration snapshot.
///
/// `groups` declares how a flat input decomposes into concatenated
/// per-group series (see [`GroupLayout`]); `flags` select the warm-up and
/// NaN policies; `parallelism` is an advisory hint for the group fan-out
/// (0 = let the thread pool decide, 1 = force sequential).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    groups: usize,
    flags: Flags,
    parallelism: usize,
}

impl Context {
    /// Create a context for `groups` concatenated series with empty flags.
    pub fn new(groups: usize) -> Self {
        Context {
            groups,
            flags: Flags::empty(),
            parallelism: 0,
        }
    }

    /// Replace the policy flags.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Replace the parallelism hint (0 = automatic, 1 = sequential).
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Number of concatenated per-group series in every input.
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// Active policy flags.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Advisory parallelism hint.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Whether warm-up indices must be NaN instead of partial results.
    pub fn strictly_cycle(&self) -> bool {
        self.flags.contains(Flags::STRICTLY_CYCLE)
    }

    /// Whether NaN values are excluded from window reductions.
    pub fn skip_nan(&self) -> bool {
        self.flags.contains(Flags::SKIP_NAN)
    }

    /// Whether the group fan-out may run on the thread pool.
    pub fn parallel_enabled(&self) -> bool {
        self.parallelism != 1
    }

    /// Resolve the group layout for an input of `len` elements.
    ///
    /// # Errors
    ///
    /// Returns `BadShape` when `groups` is zero or does not divide `len`.
    pub fn layout(&self, len: usize) -> Result<GroupLayout> {
        GroupLayout::new(self.groups, len)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(1)
    }
}

static GLOBAL: Lazy<RwLock<Context>> = Lazy::new(|| RwLock::new(Context::default()));

/// Replace the process-global context.
///
/// See the module docs for the race caveat: do not call this while other
/// threads are inside operator calls.
pub fn set_ctx(context: Context) {
    *GLOBAL.write() = context;
}

/// Snapshot the process-global context.
pub fn ctx() -> Context {
    *GLOBAL.read()
}

/// Convenience: set the global group count and flags in one call.
pub fn configure(groups: usize, flags: Flags) {
    set_ctx(Context::new(groups).with_flags(flags));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Context::default();
        assert_eq!(c.groups(), 1);
        assert_eq!(c.flags(), Flags::empty());
        assert!(!c.strictly_cycle());
        assert!(!c.skip_nan());
        assert!(c.parallel_enabled());
    }

    #[test]
    fn builder() {
        let c = Context::new(4)
            .with_flags(Flags::STRICTLY_CYCLE | Flags::SKIP_NAN)
            .with_parallelism(1);
        assert_eq!(c.groups(), 4);
        assert!(c.strictly_cycle());
        assert!(c.skip_nan());
        assert!(!c.parallel_enabled());
    }

    #[test]
    fn layout_divides() {
        let c = Context::new(2);
        let layout = c.layout(10).unwrap();
        assert_eq!(layout.groups(), 2);
        assert_eq!(layout.group_len(), 5);
        assert!(c.layout(9).is_err());
        assert!(Context::new(0).layout(10).is_err());
    }

    #[test]
    fn global_roundtrip() {
        set_ctx(Context::new(3).with_flags(Flags::SKIP_NAN));
        let snap = ctx();
        assert_eq!(snap.groups(), 3);
        assert!(snap.skip_nan());
        // Snapshots are copies; later mutation does not affect them.
        configure(1, Flags::empty());
        assert_eq!(snap.groups(), 3);
        assert_eq!(ctx().groups(), 1);
    }
}
