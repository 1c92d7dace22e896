//! Iteration command protocol for [`crate::Value::List`]/[`crate::Value::Dict`] walks.
//!
//! Callbacks passed to `list_for_each`/`dict_for_each` return a [`ForEachCmd`]
//! after visiting each element, mirroring the four-way command set the
//! source data tree uses (`CONT`/`STOP`/`FAIL`/`DELETE`).

/// What a for-each visitor wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForEachCmd {
    /// Keep walking.
    Cont,
    /// Stop walking; the walk succeeded.
    Stop,
    /// Stop walking; the walk failed. The visit count is reported negated.
    Fail,
    /// Remove the current element and keep walking.
    ///
    /// Issuing this from a `_const` (read-only) iteration is a programming
    /// error and panics, matching the source's `xassert` on the same
    /// misuse.
    Delete,
}

/// Outcome of a for-each walk: the number of elements visited, negated if
/// the walk terminated via [`ForEachCmd::Fail`].
pub type VisitCount = i64;

/// Fold a sequence of [`ForEachCmd`] results (as produced incrementally by
/// a visitor) into a running visit count, reporting whether the walk
/// should continue.
///
/// Returns `(should_continue, failed)`. Callers increment their own visit
/// counter per element actually visited and negate it at the end if
/// `failed` is true.
#[must_use]
pub fn outcome(cmd: ForEachCmd) -> (bool, bool) {
    match cmd {
        ForEachCmd::Cont | ForEachCmd::Delete => (true, false),
        ForEachCmd::Stop => (false, false),
        ForEachCmd::Fail => (false, true),
    }
}
