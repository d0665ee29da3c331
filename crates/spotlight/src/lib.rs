#![forbid(unsafe_code)]

//! Spotlight public facade crate.
//!
//! Re-exports the day-to-day types from `spotlight-core` and
//! `spotlight-runtime`, a combined [`Error`], a prelude, and the
//! [`global`] default instance for code that has no handle to pass around.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use spotlight_core::{
    ActionGroup, ActionItem, CatalogError, ConfigError, FlatIndexMap, NavigationController,
    PaletteCommand, PaletteItem, PaletteState, SpotlightConfig, filter_items, find_action,
    load_catalog,
};

// --- Runtime re-exports ----------------------------------------------------

pub use spotlight_runtime::{
    DetachedScrollHost, FrameQueue, FrameScheduler, MountGuard, PaletteKey, PaletteObserver,
    PaletteOutcome, PaletteSession, RowLayout, ScrollError, ScrollHost, Spotlight, StateChange,
    StateStore, SubscribeError, Subscription, ViewportScroller,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for spotlight hosts.
#[derive(Debug)]
pub enum Error {
    /// One or more configuration values were rejected.
    Config(Vec<ConfigError>),
    /// An action catalog could not be loaded.
    Catalog(CatalogError),
    /// An observer could not be registered.
    Subscribe(SubscribeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(errors) => {
                write!(f, "invalid configuration: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Subscribe(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(errors) => errors
                .first()
                .map(|e| e as &(dyn std::error::Error + 'static)),
            Self::Catalog(err) => Some(err),
            Self::Subscribe(err) => Some(err),
        }
    }
}

impl From<Vec<ConfigError>> for Error {
    fn from(errors: Vec<ConfigError>) -> Self {
        Self::Config(errors)
    }
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err)
    }
}

impl From<SubscribeError> for Error {
    fn from(err: SubscribeError) -> Self {
        Self::Subscribe(err)
    }
}

/// Standard result type for spotlight APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Helpers ----------------------------------------------------------------

/// Read configuration from the environment, failing on any invalid value.
pub fn config_from_env() -> Result<SpotlightConfig> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Read configuration through `lookup`, failing on any invalid value.
pub fn config_from_lookup(lookup: impl FnMut(&str) -> Option<String>) -> Result<SpotlightConfig> {
    let parsed = SpotlightConfig::from_env_with(lookup);
    if !parsed.errors.is_empty() {
        return Err(Error::Config(parsed.errors));
    }
    parsed.config.validate()?;
    Ok(parsed.config)
}

/// Parse a JSON action catalog.
pub fn catalog_from_json(json: &str) -> Result<Vec<PaletteItem>> {
    Ok(load_catalog(json)?)
}

// --- Default instance -------------------------------------------------------

/// The composition-root default [`Spotlight`].
///
/// One instance per thread, created on first use from the environment
/// configuration (invalid values fall back to defaults and are logged). The
/// free functions here forward to it, so a global hotkey handler can call
/// [`global::toggle`] without holding a handle.
pub mod global {
    use super::{MountGuard, Spotlight, SpotlightConfig, StateChange, StateStore, Subscription};

    thread_local! {
        static DEFAULT: Spotlight = {
            let config = SpotlightConfig::from_env();
            tracing::debug!(?config, "default spotlight created");
            Spotlight::with_config(config)
        };
    }

    /// Handle to the default instance.
    pub fn instance() -> Spotlight {
        DEFAULT.with(Spotlight::clone)
    }

    pub fn open() {
        DEFAULT.with(Spotlight::open);
    }

    pub fn open_with_query(query: impl Into<String>) {
        let query = query.into();
        DEFAULT.with(|s| s.open_with_query(query));
    }

    pub fn close() {
        DEFAULT.with(Spotlight::close);
    }

    pub fn toggle() {
        DEFAULT.with(Spotlight::toggle);
    }

    pub fn set_query(query: impl Into<String>) {
        let query = query.into();
        DEFAULT.with(|s| s.set_query(query));
    }

    pub fn set_selected_index(index: Option<usize>) {
        DEFAULT.with(|s| s.set_selected_index(index));
    }

    /// Mount `store` as the default instance's provider.
    pub fn mount(store: StateStore) -> MountGuard {
        DEFAULT.with(|s| s.mount(store))
    }

    pub fn subscribe_fn(f: impl Fn(&StateChange) + 'static) -> Subscription {
        DEFAULT.with(|s| s.subscribe_fn(f))
    }
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ActionGroup, ActionItem, Error, MountGuard, PaletteItem, PaletteKey, PaletteOutcome,
        PaletteSession, PaletteState, Result, Spotlight, SpotlightConfig, StateStore,
    };

    pub use crate::{core, runtime};
}

pub use spotlight_core as core;
pub use spotlight_runtime as runtime;
