#![forbid(unsafe_code)]

//! Palette state and the commands that mutate it.
//!
//! [`PaletteState::apply`] is the single reducer every store goes through, so
//! the invariants below hold no matter which store instance is live.
//!
//! # Invariants
//!
//! 1. Any command that writes `query` also clears `selected_index`.
//! 2. `Close` always yields [`PaletteState::default`], whatever came before.
//! 3. `Open` without a query on an already open palette leaves the state
//!    unchanged.

/// Canonical palette state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteState {
    /// Whether the palette is showing.
    pub opened: bool,
    /// Current query text.
    pub query: String,
    /// Index into the current flattened filtered list, `None` when nothing is
    /// selected.
    pub selected_index: Option<usize>,
}

impl PaletteState {
    /// Apply a command in place.
    pub fn apply(&mut self, command: &PaletteCommand) {
        match command {
            PaletteCommand::Open { query } => {
                self.opened = true;
                if let Some(q) = query {
                    self.set_query(q);
                }
            }
            PaletteCommand::Close => *self = Self::default(),
            PaletteCommand::Toggle => {
                if self.opened {
                    *self = Self::default();
                } else {
                    self.opened = true;
                }
            }
            PaletteCommand::SetQuery(q) => self.set_query(q),
            PaletteCommand::SetSelectedIndex(index) => self.selected_index = *index,
            PaletteCommand::Restore(state) => *self = state.clone(),
        }
    }

    fn set_query(&mut self, query: &str) {
        self.query.clear();
        self.query.push_str(query);
        self.selected_index = None;
    }
}

/// A mutation of [`PaletteState`].
///
/// These are the operations of the imperative API and also the unit of work
/// held in the pending queue while no provider is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteCommand {
    /// Show the palette, optionally replacing the query.
    Open {
        /// Query to seed, if any.
        query: Option<String>,
    },
    /// Hide and fully reset.
    Close,
    /// Close when open, open otherwise.
    Toggle,
    /// Replace the query; clears the selection.
    SetQuery(String),
    /// Select a row (or clear the selection).
    SetSelectedIndex(Option<usize>),
    /// Overwrite the whole state.
    Restore(PaletteState),
}

impl PaletteCommand {
    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Close => "close",
            Self::Toggle => "toggle",
            Self::SetQuery(_) => "set_query",
            Self::SetSelectedIndex(_) => "set_selected_index",
            Self::Restore(_) => "restore",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_with(query: &str, selected: Option<usize>) -> PaletteState {
        PaletteState {
            opened: true,
            query: query.into(),
            selected_index: selected,
        }
    }

    #[test]
    fn close_resets_everything() {
        let mut state = open_with("abc", Some(3));
        state.apply(&PaletteCommand::Close);
        assert_eq!(state, PaletteState::default());
    }

    #[test]
    fn open_twice_is_unchanged() {
        let mut state = open_with("abc", Some(1));
        let before = state.clone();
        state.apply(&PaletteCommand::Open { query: None });
        assert_eq!(state, before);
    }

    #[test]
    fn open_with_query_clears_selection() {
        let mut state = open_with("abc", Some(1));
        state.apply(&PaletteCommand::Open {
            query: Some("re".into()),
        });
        assert_eq!(state, open_with("re", None));
    }

    #[test]
    fn set_query_clears_selection() {
        let mut state = open_with("", Some(2));
        state.apply(&PaletteCommand::SetQuery("abc".into()));
        assert_eq!(state.selected_index, None);
        assert_eq!(state.query, "abc");

        // Same text still counts as a write.
        state.apply(&PaletteCommand::SetSelectedIndex(Some(0)));
        state.apply(&PaletteCommand::SetQuery("abc".into()));
        assert_eq!(state.selected_index, None);
    }

    #[test]
    fn toggle_flips_and_resets_on_close() {
        let mut state = PaletteState::default();
        state.apply(&PaletteCommand::Toggle);
        assert!(state.opened);
        state.apply(&PaletteCommand::SetQuery("x".into()));
        state.apply(&PaletteCommand::Toggle);
        assert_eq!(state, PaletteState::default());
    }

    #[test]
    fn restore_overwrites() {
        let mut state = PaletteState::default();
        let target = open_with("q", Some(4));
        state.apply(&PaletteCommand::Restore(target.clone()));
        assert_eq!(state, target);
    }

    #[test]
    fn command_names() {
        assert_eq!(PaletteCommand::Toggle.name(), "toggle");
        assert_eq!(PaletteCommand::SetSelectedIndex(None).name(), "set_selected_index");
    }
}
