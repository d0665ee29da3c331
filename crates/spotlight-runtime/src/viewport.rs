#![forbid(unsafe_code)]

//! Keeps the selected row visible.
//!
//! Rows report their layout asynchronously (after the host lays them out),
//! so [`ViewportScroller::ensure_visible`] may run before the row it needs has
//! a layout. In that case it retries on the next frame, up to
//! [`SpotlightConfig::scroll_retry_budget`] times, then gives up.
//!
//! Every `ensure_visible`, [`invalidate`](ViewportScroller::invalidate), and
//! [`reset_rows`](ViewportScroller::reset_rows) bumps an epoch. A retry whose
//! epoch is stale does nothing, so closing the palette or moving the selection
//! again cancels pending retries.
//!
//! Host scroll failures, returned or panicked, are logged and dropped.

use std::cell::RefCell;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use spotlight_core::SpotlightConfig;

use crate::observer::panic_message;
use crate::scheduler::FrameScheduler;

/// Vertical placement of one row inside the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowLayout {
    pub offset_from_top: u32,
    pub height: u32,
}

impl RowLayout {
    pub const fn new(offset_from_top: u32, height: u32) -> Self {
        Self {
            offset_from_top,
            height,
        }
    }

    /// Offset of the row's bottom edge.
    pub const fn bottom(&self) -> u32 {
        self.offset_from_top.saturating_add(self.height)
    }
}

/// Scroll offset that brings `row` inside the padded viewport.
///
/// Returns `None` when no scroll is needed or the viewport has no height.
/// A row above the padded window is aligned to its top edge; a row below it
/// is aligned to its bottom edge. The result is never negative.
pub fn scroll_target(
    row: RowLayout,
    scroll_offset: u32,
    viewport_height: u32,
    padding: u32,
) -> Option<u32> {
    if viewport_height == 0 {
        return None;
    }
    let top = i64::from(scroll_offset);
    let bottom = top + i64::from(viewport_height);
    let padding = i64::from(padding);
    let row_top = i64::from(row.offset_from_top);
    let row_bottom = i64::from(row.bottom());

    let target = if row_top < top + padding {
        row_top - padding
    } else if row_bottom > bottom - padding {
        row_bottom - i64::from(viewport_height) + padding
    } else {
        return None;
    };

    let target = u32::try_from(target.max(0)).unwrap_or(u32::MAX);
    (target != scroll_offset).then_some(target)
}

/// Failure reported by a [`ScrollHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollError {
    /// No scroll container is attached.
    Unavailable,
    /// The host rejected the scroll.
    Failed(String),
}

impl fmt::Display for ScrollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollError::Unavailable => write!(f, "scroll container unavailable"),
            ScrollError::Failed(msg) => write!(f, "scroll failed: {msg}"),
        }
    }
}

impl std::error::Error for ScrollError {}

/// The host's scroll container.
pub trait ScrollHost {
    /// Move the container so `offset` is at the top of the viewport.
    fn scroll_to(&self, offset: u32) -> Result<(), ScrollError>;
}

/// Host with no scroll container; every scroll is `Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedScrollHost;

impl ScrollHost for DetachedScrollHost {
    fn scroll_to(&self, _offset: u32) -> Result<(), ScrollError> {
        Err(ScrollError::Unavailable)
    }
}

/// Cache growth limit for hosts that report layouts without calling
/// [`ViewportScroller::reset_rows`].
const MAX_UNSIZED_ROWS: usize = 4096;

#[derive(Debug)]
struct ScrollState {
    rows: Vec<Option<RowLayout>>,
    /// Whether `reset_rows` fixed the cache length.
    sized: bool,
    scroll_offset: u32,
    viewport_height: u32,
    padding: u32,
    retry_budget: u32,
    epoch: u64,
}

struct ScrollerInner {
    state: RefCell<ScrollState>,
    scheduler: Rc<dyn FrameScheduler>,
    host: Rc<dyn ScrollHost>,
}

/// Row layout cache plus the scroll policy.
#[derive(Clone)]
pub struct ViewportScroller {
    inner: Rc<ScrollerInner>,
}

impl ViewportScroller {
    pub fn new(
        scheduler: Rc<dyn FrameScheduler>,
        host: Rc<dyn ScrollHost>,
        config: &SpotlightConfig,
    ) -> Self {
        Self {
            inner: Rc::new(ScrollerInner {
                state: RefCell::new(ScrollState {
                    rows: Vec::new(),
                    sized: false,
                    scroll_offset: 0,
                    viewport_height: 0,
                    padding: config.scroll_padding,
                    retry_budget: config.scroll_retry_budget,
                    epoch: 0,
                }),
                scheduler,
                host,
            }),
        }
    }

    /// Forget all row layouts and size the cache for `len` rows.
    pub fn reset_rows(&self, len: usize) {
        let mut state = self.inner.state.borrow_mut();
        state.rows.clear();
        state.rows.resize(len, None);
        state.sized = true;
        state.epoch += 1;
    }

    /// Record the layout of row `index`.
    ///
    /// Once [`reset_rows`](Self::reset_rows) has sized the cache, reports for
    /// rows past its end are ignored.
    pub fn report_row_layout(&self, index: usize, layout: RowLayout) {
        let mut state = self.inner.state.borrow_mut();
        if index >= state.rows.len() {
            if state.sized || index >= MAX_UNSIZED_ROWS {
                tracing::trace!(index, rows = state.rows.len(), "row layout out of range; ignored");
                return;
            }
            state.rows.resize(index + 1, None);
        }
        state.rows[index] = Some(layout);
    }

    pub fn row_layout(&self, index: usize) -> Option<RowLayout> {
        self.inner.state.borrow().rows.get(index).copied().flatten()
    }

    pub fn set_viewport_height(&self, height: u32) {
        self.inner.state.borrow_mut().viewport_height = height;
    }

    pub fn viewport_height(&self) -> u32 {
        self.inner.state.borrow().viewport_height
    }

    /// Record a scroll position the host changed on its own (user scrolling).
    pub fn set_scroll_offset(&self, offset: u32) {
        self.inner.state.borrow_mut().scroll_offset = offset;
    }

    pub fn scroll_offset(&self) -> u32 {
        self.inner.state.borrow().scroll_offset
    }

    /// Cancel pending retries.
    pub fn invalidate(&self) {
        self.inner.state.borrow_mut().epoch += 1;
    }

    pub fn epoch(&self) -> u64 {
        self.inner.state.borrow().epoch
    }

    /// Scroll so row `index` is inside the padded viewport, now or once its
    /// layout is reported.
    pub fn ensure_visible(&self, index: usize) {
        let epoch = {
            let mut state = self.inner.state.borrow_mut();
            state.epoch += 1;
            state.epoch
        };
        attempt(&self.inner, index, epoch, 0);
    }
}

fn attempt(inner: &Rc<ScrollerInner>, index: usize, epoch: u64, tries: u32) {
    let (layout, offset, viewport, padding, budget) = {
        let state = inner.state.borrow();
        if state.epoch != epoch {
            tracing::trace!(index, epoch, current = state.epoch, "stale scroll request dropped");
            return;
        }
        (
            state.rows.get(index).copied().flatten(),
            state.scroll_offset,
            state.viewport_height,
            state.padding,
            state.retry_budget,
        )
    };

    let Some(row) = layout else {
        if tries >= budget {
            tracing::warn!(index, attempts = tries, "row layout never reported; scroll abandoned");
            return;
        }
        let weak: Weak<ScrollerInner> = Rc::downgrade(inner);
        inner.scheduler.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                attempt(&inner, index, epoch, tries + 1);
            }
        }));
        return;
    };

    let Some(target) = scroll_target(row, offset, viewport, padding) else {
        return;
    };

    let host = Rc::clone(&inner.host);
    match catch_unwind(AssertUnwindSafe(|| host.scroll_to(target))) {
        Ok(Ok(())) => {
            inner.state.borrow_mut().scroll_offset = target;
            tracing::trace!(index, from = offset, to = target, "scrolled row into view");
        }
        Ok(Err(err)) => {
            tracing::warn!(index, target, error = %err, "scroll failed; ignoring");
        }
        Err(payload) => {
            tracing::warn!(
                index,
                target,
                panic = %panic_message(payload.as_ref()),
                "scroll host panicked; ignoring"
            );
        }
    }
}

impl fmt::Debug for ViewportScroller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportScroller")
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}
