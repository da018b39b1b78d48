//! Window planning for incremental extraction
//!
//! The planner is a pure function from watermark and end boundary to the
//! next bounded request window. The extraction loop owns all state; nothing
//! here remembers previous calls, which keeps the sequencing trivially
//! testable.

use crate::{Granularity, Window};
use chrono::{NaiveDateTime, TimeDelta};

/// A window annotated with the granularity to request for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedWindow {
    /// The request window.
    pub window: Window,
    /// Aggregation resolution for this window.
    pub granularity: Granularity,
}

/// Compute the next request window.
///
/// Returns `None` when `watermark >= end_boundary`, which terminates the
/// loop. Otherwise the window is `[watermark, watermark + interval)`,
/// clipped at the boundary. `interval` must be positive; the caller
/// validates it at config load.
pub fn next_window(
    watermark: NaiveDateTime,
    end_boundary: NaiveDateTime,
    interval: TimeDelta,
) -> Option<Window> {
    debug_assert!(interval > TimeDelta::zero());

    if watermark >= end_boundary {
        return None;
    }

    let to = (watermark + interval).min(end_boundary);
    Window::new(watermark, to)
}

/// Compute the next window together with its granularity annotation.
///
/// Granularity is re-selected for every window from the window start and
/// the cutover date; it is never carried over from a previous window.
pub fn plan_next(
    watermark: NaiveDateTime,
    end_boundary: NaiveDateTime,
    interval: TimeDelta,
    cutover: Option<NaiveDateTime>,
) -> Option<PlannedWindow> {
    next_window(watermark, end_boundary, interval).map(|window| PlannedWindow {
        granularity: Granularity::select(window.from, cutover),
        window,
    })
}
