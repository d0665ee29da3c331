#![forbid(unsafe_code)]

//! Spotlight Runtime
//!
//! State ownership and side effects for the spotlight command palette. The
//! pure pieces (filtering, navigation math, configuration) live in
//! `spotlight-core`; this crate owns everything that holds state over time.
//!
//! # Key Components
//!
//! - [`StateStore`] - `{opened, query, selected_index}` with synchronous pub/sub
//! - [`Spotlight`] - Imperative API that queues calls until a provider mounts
//! - [`MountGuard`] - Keeps a provider store live; dropping it unmounts
//! - [`ViewportScroller`] - Keeps the selected row inside the padded viewport
//! - [`FrameScheduler`] - Abstract next-frame primitive used for scroll retries
//! - [`PaletteSession`] - Results, selection, and keys wired to one bridge
//!
//! # Threading
//! Everything is `Rc`-based and single-threaded. Observers and replays run
//! synchronously on the caller's thread; the only deferred work is scroll
//! retries on the host's [`FrameScheduler`].

pub mod bridge;
pub mod observer;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod viewport;

pub use bridge::{MountGuard, MountId, PendingOperation, PendingQueue, Spotlight};
pub use observer::{PaletteObserver, StateChange, SubId, SubscribeError, Subscription};
pub use scheduler::{FrameCallback, FrameQueue, FrameScheduler};
pub use session::{PaletteKey, PaletteOutcome, PaletteSession};
pub use store::StateStore;
pub use viewport::{
    DetachedScrollHost, RowLayout, ScrollError, ScrollHost, ViewportScroller, scroll_target,
};
