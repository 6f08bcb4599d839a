//! # Page Break Decisions
//!
//! The sheet never splits a block across pages: a block either fits in the
//! space left on the current page or the whole block moves to a fresh one.

/// What to do with a block of a given height at the current cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakDecision {
    /// Place the block on the current page (it fits).
    Place,
    /// Start a new page and place the block at its top margin.
    MoveToNextPage,
}

/// Decide whether a block of `required_height` starting at `cursor_y` fits
/// above `bottom_limit` (page height minus bottom margin).
pub fn decide_break(cursor_y: f64, required_height: f64, bottom_limit: f64) -> BreakDecision {
    if cursor_y + required_height > bottom_limit {
        BreakDecision::MoveToNextPage
    } else {
        BreakDecision::Place
    }
}
