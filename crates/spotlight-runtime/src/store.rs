#![forbid(unsafe_code)]

//! Palette state store with synchronous pub/sub.
//!
//! A [`StateStore`] is a cheap, clonable handle to one [`PaletteState`] and
//! its observers. Clones share the same state. Stores are single-threaded
//! (`Rc`-based); there is no locking because ordering, not parallelism, is
//! what matters here.
//!
//! All mutations go through [`PaletteState::apply`], then observers are
//! notified with the resulting [`StateChange`]. Every call notifies, even when
//! nothing changed (opening an open palette still notifies).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use spotlight_core::{PaletteCommand, PaletteState};

use crate::observer::{ObserverSet, PaletteObserver, StateChange, SubscribeError, Subscription};

struct StoreInner {
    name: &'static str,
    state: RefCell<PaletteState>,
    observers: Rc<ObserverSet>,
}

/// Shared handle to a palette state.
#[derive(Clone)]
pub struct StateStore {
    inner: Rc<StoreInner>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Create a closed, empty store.
    pub fn new() -> Self {
        Self::named("store")
    }

    /// Create a store with a name used in log fields.
    pub fn named(name: &'static str) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                name,
                state: RefCell::new(PaletteState::default()),
                observers: ObserverSet::new(name),
            }),
        }
    }

    /// Name used in log fields.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PaletteState {
        self.inner.state.borrow().clone()
    }

    /// Read the state without cloning.
    pub fn with_state<R>(&self, f: impl FnOnce(&PaletteState) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Whether both handles point at the same store.
    pub fn ptr_eq(&self, other: &StateStore) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Operations ---

    /// Show the palette.
    pub fn open(&self) {
        self.apply(PaletteCommand::Open { query: None });
    }

    /// Show the palette with a seeded query.
    pub fn open_with_query(&self, query: impl Into<String>) {
        self.apply(PaletteCommand::Open {
            query: Some(query.into()),
        });
    }

    /// Hide the palette and reset query and selection.
    pub fn close(&self) {
        self.apply(PaletteCommand::Close);
    }

    /// Close when open, open otherwise.
    pub fn toggle(&self) {
        self.apply(PaletteCommand::Toggle);
    }

    /// Replace the query and clear the selection.
    pub fn set_query(&self, query: impl Into<String>) {
        self.apply(PaletteCommand::SetQuery(query.into()));
    }

    /// Select a flattened row, or clear the selection.
    pub fn set_selected_index(&self, index: Option<usize>) {
        self.apply(PaletteCommand::SetSelectedIndex(index));
    }

    /// Apply a command and notify observers.
    pub fn apply(&self, command: PaletteCommand) {
        let state = {
            let mut state = self.inner.state.borrow_mut();
            state.apply(&command);
            state.clone()
        };
        tracing::trace!(
            store = self.inner.name,
            command = command.name(),
            opened = state.opened,
            query = %state.query,
            selected = ?state.selected_index,
            "state updated"
        );
        self.inner.observers.dispatch(StateChange { command, state });
    }

    // --- Observers ---

    /// Register an observer.
    ///
    /// Registering the same `Rc` twice fails with
    /// [`SubscribeError::AlreadySubscribed`].
    pub fn subscribe(
        &self,
        observer: Rc<dyn PaletteObserver>,
    ) -> Result<Subscription, SubscribeError> {
        self.inner.observers.subscribe(observer)
    }

    /// Register a closure observer.
    pub fn subscribe_fn(&self, f: impl Fn(&StateChange) + 'static) -> Subscription {
        self.inner.observers.subscribe_unchecked(Rc::new(f))
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("name", &self.inner.name)
            .field("state", &*self.inner.state.borrow())
            .field("observers", &self.observer_count())
            .finish()
    }
}
