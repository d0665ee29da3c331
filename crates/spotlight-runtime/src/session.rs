#![forbid(unsafe_code)]

//! A palette session: catalog, results, selection, and scrolling wired to one
//! [`Spotlight`] bridge.
//!
//! The session observes the bridge. Whenever the query changes it re-runs
//! [`filter_items`] and rebuilds the [`FlatIndexMap`]; whenever a row is
//! selected it asks the [`ViewportScroller`] to bring it into view; closing
//! cancels pending scroll retries.
//!
//! Navigation and activation write back through the bridge, so they work the
//! same whether or not a provider store is mounted.

use std::cell::RefCell;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use spotlight_core::{
    ActionItem, FlatIndexMap, NavigationController, PaletteItem, PaletteState, SpotlightConfig,
    filter_items,
};

use crate::bridge::Spotlight;
use crate::observer::{Subscription, panic_message};
use crate::viewport::{RowLayout, ViewportScroller};

/// Keys the palette reacts to while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteKey {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Escape,
}

/// Result of a key that finished the interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteOutcome {
    /// An action was activated (contains the action id). The palette closed.
    Activated(String),
    /// The palette was dismissed.
    Dismissed,
}

struct SessionInner {
    spotlight: Spotlight,
    config: SpotlightConfig,
    catalog: RefCell<Vec<PaletteItem>>,
    results: RefCell<Vec<PaletteItem>>,
    flat: RefCell<FlatIndexMap>,
    filtered_query: RefCell<Option<String>>,
    scroller: ViewportScroller,
    _subscription: Subscription,
}

/// Search results and selection for one palette view.
#[derive(Clone)]
pub struct PaletteSession {
    inner: Rc<SessionInner>,
}

impl PaletteSession {
    /// Attach a session to `spotlight` over `items`.
    pub fn new(spotlight: Spotlight, items: Vec<PaletteItem>, scroller: ViewportScroller) -> Self {
        let config = spotlight.config().clone();
        let inner = Rc::new_cyclic(|weak: &Weak<SessionInner>| {
            let weak = weak.clone();
            let subscription = spotlight.subscribe_fn(move |change| {
                if let Some(inner) = weak.upgrade() {
                    inner.sync(&change.state);
                }
            });
            SessionInner {
                spotlight,
                config,
                catalog: RefCell::new(items),
                results: RefCell::new(Vec::new()),
                flat: RefCell::new(FlatIndexMap::default()),
                filtered_query: RefCell::new(None),
                scroller,
                _subscription: subscription,
            }
        });
        let session = Self { inner };
        session.inner.sync(&session.inner.spotlight.state());
        session
    }

    pub fn spotlight(&self) -> &Spotlight {
        &self.inner.spotlight
    }

    pub fn scroller(&self) -> &ViewportScroller {
        &self.inner.scroller
    }

    pub fn state(&self) -> PaletteState {
        self.inner.spotlight.state()
    }

    pub fn is_open(&self) -> bool {
        self.state().opened
    }

    pub fn query(&self) -> String {
        self.state().query
    }

    // --- Catalog and results ---

    /// Replace the catalog and re-run the current query against it.
    ///
    /// The selection is cleared when the visible rows change.
    pub fn set_items(&self, items: Vec<PaletteItem>) {
        let previous = self.flat();
        *self.inner.catalog.borrow_mut() = items;
        self.inner.filtered_query.borrow_mut().take();
        let state = self.state();
        self.inner.sync(&state);
        let changed = *self.inner.flat.borrow() != previous;
        if changed && state.selected_index.is_some() {
            self.inner.spotlight.set_selected_index(None);
        }
    }

    pub fn items(&self) -> Vec<PaletteItem> {
        self.inner.catalog.borrow().clone()
    }

    /// Filtered items, groups preserved.
    pub fn results(&self) -> Vec<PaletteItem> {
        self.inner.results.borrow().clone()
    }

    /// Filtered actions in row order.
    pub fn flat(&self) -> FlatIndexMap {
        self.inner.flat.borrow().clone()
    }

    /// Number of selectable rows.
    pub fn result_count(&self) -> usize {
        self.inner.flat.borrow().len()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state().selected_index
    }

    /// The selected action, if the selection points at a row.
    pub fn selected_action(&self) -> Option<ActionItem> {
        let index = self.selected_index()?;
        self.inner.flat.borrow().get(index).cloned()
    }

    // --- Navigation ---

    pub fn navigate_down(&self) {
        self.navigate(|nav, sel, _| nav.down(sel));
    }

    pub fn navigate_up(&self) {
        self.navigate(|nav, sel, _| nav.up(sel));
    }

    pub fn navigate_first(&self) {
        self.navigate(|nav, _, _| nav.first());
    }

    pub fn navigate_last(&self) {
        self.navigate(|nav, _, _| nav.last());
    }

    pub fn page_down(&self) {
        self.navigate(|nav, sel, page| nav.page_down(sel, page));
    }

    pub fn page_up(&self) {
        self.navigate(|nav, sel, page| nav.page_up(sel, page));
    }

    fn navigate(&self, step: impl FnOnce(&NavigationController, Option<usize>, usize) -> Option<usize>) {
        let nav = NavigationController::for_list(&self.inner.flat.borrow());
        let next = step(&nav, self.selected_index(), self.inner.config.page_size);
        if let Some(index) = next {
            self.inner.spotlight.set_selected_index(Some(index));
        }
    }

    /// Activate the selected row, or the first row when nothing is selected,
    /// then close.
    ///
    /// Returns `None` and leaves the palette open when there is no row to
    /// activate. Disabled actions are activated like any other; callers decide
    /// what `disabled` means.
    pub fn select_current(&self) -> Option<PaletteOutcome> {
        let action = {
            let flat = self.inner.flat.borrow();
            let index = NavigationController::for_list(&flat).current(self.selected_index())?;
            flat.get(index).cloned()?
        };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| action.activate())) {
            tracing::warn!(
                action = %action.id,
                panic = %panic_message(payload.as_ref()),
                "action handler panicked"
            );
        }
        tracing::debug!(action = %action.id, "action activated");
        self.close();
        Some(PaletteOutcome::Activated(action.id))
    }

    /// Close and reset query and selection.
    pub fn close(&self) {
        self.inner.spotlight.close();
    }

    /// Handle a key while the palette is open. Keys are ignored while closed.
    pub fn handle_key(&self, key: PaletteKey) -> Option<PaletteOutcome> {
        if !self.is_open() {
            return None;
        }
        match key {
            PaletteKey::Up => self.navigate_up(),
            PaletteKey::Down => self.navigate_down(),
            PaletteKey::PageUp => self.page_up(),
            PaletteKey::PageDown => self.page_down(),
            PaletteKey::Home => self.navigate_first(),
            PaletteKey::End => self.navigate_last(),
            PaletteKey::Enter => return self.select_current(),
            PaletteKey::Escape => {
                self.close();
                return Some(PaletteOutcome::Dismissed);
            }
        }
        None
    }

    // --- Layout ---

    pub fn report_row_layout(&self, index: usize, layout: RowLayout) {
        self.inner.scroller.report_row_layout(index, layout);
    }

    pub fn set_viewport_height(&self, height: u32) {
        self.inner.scroller.set_viewport_height(height);
    }
}

impl SessionInner {
    fn sync(&self, state: &PaletteState) {
        let stale = self.filtered_query.borrow().as_deref() != Some(state.query.as_str());
        if stale {
            self.refilter(&state.query);
        }

        if !state.opened {
            self.scroller.invalidate();
            return;
        }
        let rows = self.flat.borrow().len();
        if let Some(index) = state.selected_index
            && index < rows
        {
            self.scroller.ensure_visible(index);
        }
    }

    fn refilter(&self, query: &str) {
        let results = filter_items(&self.catalog.borrow(), query, self.config.result_limit);
        let flat = FlatIndexMap::from_items(&results);
        self.scroller.reset_rows(flat.len());
        tracing::trace!(query_len = query.len(), rows = flat.len(), "results refreshed");
        *self.results.borrow_mut() = results;
        *self.flat.borrow_mut() = flat;
        *self.filtered_query.borrow_mut() = Some(query.to_owned());
    }
}

impl fmt::Debug for PaletteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteSession")
            .field("state", &self.state())
            .field("rows", &self.result_count())
            .finish()
    }
}
