#![forbid(unsafe_code)]

//! Core: action model, substring filtering, selection math, and configuration
//! for the spotlight command palette.
//!
//! Everything here is pure data and arithmetic. State ownership, pub/sub, the
//! pending-operation queue, and viewport scrolling live in
//! `spotlight-runtime`.
//!
//! # Pipeline
//!
//! 1. [`filter_items`] narrows a catalog of [`PaletteItem`]s for a query.
//! 2. [`FlatIndexMap::from_items`] drops group headers so every row has a
//!    single index.
//! 3. [`NavigationController`] moves the selection over that index space.

pub mod action;
pub mod config;
pub mod filter;
pub mod logging;
pub mod navigation;
pub mod state;

pub use action::{
    ActionGroup, ActionItem, ActivateFn, CatalogError, FlatIndexMap, PaletteItem, find_action,
    iter_actions, load_catalog, total_actions,
};
pub use config::{ConfigError, SpotlightConfig, SpotlightConfigParse};
pub use filter::filter_items;
pub use navigation::NavigationController;
pub use state::{PaletteCommand, PaletteState};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
