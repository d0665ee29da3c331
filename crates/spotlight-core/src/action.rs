#![forbid(unsafe_code)]

//! Action model: items, groups, and the flattened index view.
//!
//! A palette catalog is an ordered list of [`PaletteItem`]s. Each item is
//! either a standalone [`ActionItem`] or an [`ActionGroup`] that carries a
//! header label and its own ordered actions.
//!
//! Selection never indexes into the grouped structure directly. Callers
//! derive a [`FlatIndexMap`] from the (filtered) items and navigate over that.
//!
//! # Catalog format
//!
//! Catalogs can be loaded from JSON with [`load_catalog`]. An object with an
//! `actions` array is a group, anything else is an action:
//!
//! ```json
//! [
//!   { "groupLabel": "Nav", "actions": [ { "id": "home", "label": "Go Home" } ] },
//!   { "id": "users", "label": "Manage Users", "keywords": ["admin"] }
//! ]
//! ```

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

/// Callback invoked when an action is activated from the palette.
pub type ActivateFn = Rc<dyn Fn(&ActionItem)>;

// ---------------------------------------------------------------------------
// Action Item
// ---------------------------------------------------------------------------

/// A single action that can be invoked from the palette.
///
/// `id` must be unique and stable across re-renders and `label` must be
/// non-empty. Neither is enforced here; [`load_catalog`] checks labels.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    /// Unique, stable identifier.
    pub id: String,
    /// Display label (searched).
    pub label: String,
    /// Optional secondary text (searched).
    #[serde(default)]
    pub description: Option<String>,
    /// Extra search terms that are not displayed.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Icon name, resolved by the host.
    #[serde(default)]
    pub icon: Option<String>,
    /// Whether the host UI should refuse activation.
    ///
    /// Navigation does not skip disabled actions.
    #[serde(default)]
    pub disabled: bool,
    /// Opaque payload for the host.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(skip)]
    on_activate: Option<ActivateFn>,
}

impl ActionItem {
    /// Create a new action item.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            icon: None,
            disabled: false,
            data: None,
            on_activate: None,
        }
    }

    /// Set description (builder).
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set keywords (builder).
    #[must_use]
    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Set icon name (builder).
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Mark as disabled (builder).
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Attach an opaque payload (builder).
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the activation callback (builder).
    #[must_use]
    pub fn on_activate(mut self, f: impl Fn(&ActionItem) + 'static) -> Self {
        self.on_activate = Some(Rc::new(f));
        self
    }

    /// Whether an activation callback is attached.
    pub fn has_handler(&self) -> bool {
        self.on_activate.is_some()
    }

    /// Run the activation callback, if any.
    ///
    /// Returns `true` when a callback ran.
    pub fn activate(&self) -> bool {
        match &self.on_activate {
            Some(f) => {
                f(self);
                true
            }
            None => false,
        }
    }

    /// Lowercased haystack used for substring matching.
    ///
    /// Label, description, and keywords joined by single spaces.
    pub fn search_text(&self) -> String {
        let mut text = self.label.to_lowercase();
        if let Some(desc) = &self.description {
            text.push(' ');
            text.push_str(&desc.to_lowercase());
        }
        for kw in &self.keywords {
            text.push(' ');
            text.push_str(&kw.to_lowercase());
        }
        text
    }

    /// Whether `needle` (already lowercased) occurs in [`search_text`](Self::search_text).
    pub fn matches(&self, needle: &str) -> bool {
        self.search_text().contains(needle)
    }
}

impl fmt::Debug for ActionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionItem")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("description", &self.description)
            .field("keywords", &self.keywords)
            .field("icon", &self.icon)
            .field("disabled", &self.disabled)
            .field("data", &self.data)
            .field("on_activate", &self.on_activate.is_some())
            .finish()
    }
}

impl PartialEq for ActionItem {
    fn eq(&self, other: &Self) -> bool {
        let same_handler = match (&self.on_activate, &other.on_activate) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        same_handler
            && self.id == other.id
            && self.label == other.label
            && self.description == other.description
            && self.keywords == other.keywords
            && self.icon == other.icon
            && self.disabled == other.disabled
            && self.data == other.data
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// A labelled group of actions rendered under a header.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionGroup {
    /// Header label.
    pub group_label: String,
    /// Actions in display order.
    pub actions: Vec<ActionItem>,
}

impl ActionGroup {
    /// Create a group.
    pub fn new(group_label: impl Into<String>, actions: Vec<ActionItem>) -> Self {
        Self {
            group_label: group_label.into(),
            actions,
        }
    }
}

/// An entry in the palette catalog.
///
/// Groups are distinguished from actions by the presence of `actions`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PaletteItem {
    /// A header with nested actions.
    Group(ActionGroup),
    /// A standalone action.
    Action(ActionItem),
}

impl PaletteItem {
    /// Number of actions this entry contributes to the flattened list.
    pub fn action_count(&self) -> usize {
        match self {
            Self::Group(group) => group.actions.len(),
            Self::Action(_) => 1,
        }
    }
}

impl From<ActionItem> for PaletteItem {
    fn from(item: ActionItem) -> Self {
        Self::Action(item)
    }
}

impl From<ActionGroup> for PaletteItem {
    fn from(group: ActionGroup) -> Self {
        Self::Group(group)
    }
}

/// Iterate every action in source order, descending into groups.
pub fn iter_actions(items: &[PaletteItem]) -> impl Iterator<Item = &ActionItem> {
    items.iter().flat_map(|item| match item {
        PaletteItem::Group(group) => group.actions.iter(),
        PaletteItem::Action(action) => std::slice::from_ref(action).iter(),
    })
}

/// Total number of actions across items and groups.
pub fn total_actions(items: &[PaletteItem]) -> usize {
    items.iter().map(PaletteItem::action_count).sum()
}

/// Look up an action by id.
///
/// Ids are not validated for uniqueness; when duplicates exist the one that
/// appears last in source order wins.
pub fn find_action<'a>(items: &'a [PaletteItem], id: &str) -> Option<&'a ActionItem> {
    iter_actions(items).filter(|a| a.id == id).last()
}

// ---------------------------------------------------------------------------
// Flat Index Map
// ---------------------------------------------------------------------------

/// Actions of a (filtered) catalog with group headers removed.
///
/// This is the only view a selection index refers into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatIndexMap {
    actions: Vec<ActionItem>,
}

impl FlatIndexMap {
    /// Flatten items in source order.
    pub fn from_items(items: &[PaletteItem]) -> Self {
        Self {
            actions: iter_actions(items).cloned().collect(),
        }
    }

    /// Number of selectable rows.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether there is nothing to select.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Action at a flattened index.
    pub fn get(&self, index: usize) -> Option<&ActionItem> {
        self.actions.get(index)
    }

    /// Flattened index of the last action with `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.actions.iter().rposition(|a| a.id == id)
    }

    /// Iterate rows in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ActionItem> {
        self.actions.iter()
    }

    /// Consume into the underlying rows.
    pub fn into_vec(self) -> Vec<ActionItem> {
        self.actions
    }
}

// ---------------------------------------------------------------------------
// Catalog loading
// ---------------------------------------------------------------------------

/// Errors raised while loading a JSON catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// The document is not a valid catalog.
    Parse(serde_json::Error),
    /// An action has an empty (or whitespace-only) label.
    EmptyLabel {
        /// Id of the offending action.
        id: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Parse(e) => write!(f, "catalog parse error: {e}"),
            CatalogError::EmptyLabel { id } => write!(f, "action {id:?} has an empty label"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Parse(e) => Some(e),
            CatalogError::EmptyLabel { .. } => None,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e)
    }
}

/// Parse a JSON catalog and check that every label is non-empty.
pub fn load_catalog(json: &str) -> Result<Vec<PaletteItem>, CatalogError> {
    let items: Vec<PaletteItem> = serde_json::from_str(json)?;
    if let Some(bad) = iter_actions(&items).find(|a| a.label.trim().is_empty()) {
        return Err(CatalogError::EmptyLabel { id: bad.id.clone() });
    }
    crate::debug!(
        items = items.len(),
        actions = total_actions(&items),
        "catalog loaded"
    );
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sample() -> Vec<PaletteItem> {
        vec![
            ActionGroup::new(
                "Nav",
                vec![
                    ActionItem::new("home", "Go Home"),
                    ActionItem::new("rep", "View Reports"),
                ],
            )
            .into(),
            ActionItem::new("users", "Manage Users").into(),
        ]
    }

    #[test]
    fn search_text_joins_fields_lowercase() {
        let item = ActionItem::new("x", "Open File")
            .with_description("From Disk")
            .with_keywords(&["IO", "load"]);
        assert_eq!(item.search_text(), "open file from disk io load");
    }

    #[test]
    fn search_text_without_description() {
        let item = ActionItem::new("x", "Quit").with_keywords(&["exit"]);
        assert_eq!(item.search_text(), "quit exit");
    }

    #[test]
    fn flatten_preserves_source_order() {
        let flat = FlatIndexMap::from_items(&sample());
        let ids: Vec<_> = flat.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["home", "rep", "users"]);
        assert_eq!(total_actions(&sample()), 3);
    }

    #[test]
    fn find_action_last_duplicate_wins() {
        let items: Vec<PaletteItem> = vec![
            ActionItem::new("dup", "First").into(),
            ActionGroup::new("G", vec![ActionItem::new("dup", "Second")]).into(),
        ];
        assert_eq!(find_action(&items, "dup").map(|a| a.label.as_str()), Some("Second"));
        assert!(find_action(&items, "missing").is_none());
        assert_eq!(FlatIndexMap::from_items(&items).position("dup"), Some(1));
    }

    #[test]
    fn activate_runs_handler() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let item = ActionItem::new("a", "A").on_activate(move |_| counter.set(counter.get() + 1));
        assert!(item.has_handler());
        assert!(item.activate());
        assert_eq!(hits.get(), 1);
        assert!(!ActionItem::new("b", "B").activate());
    }

    #[test]
    fn equality_compares_handler_identity() {
        let a = ActionItem::new("a", "A").on_activate(|_| {});
        let b = a.clone();
        assert_eq!(a, b);
        let c = ActionItem::new("a", "A").on_activate(|_| {});
        assert_ne!(a, c);
        assert_eq!(ActionItem::new("a", "A"), ActionItem::new("a", "A"));
    }

    #[test]
    fn load_catalog_distinguishes_groups() {
        let json = r#"[
            {"groupLabel": "Nav", "actions": [{"id": "home", "label": "Go Home"}]},
            {"id": "users", "label": "Manage Users", "keywords": ["admin"], "disabled": true,
             "data": {"route": "/users"}}
        ]"#;
        let items = load_catalog(json).unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], PaletteItem::Group(g) if g.group_label == "Nav"));
        match &items[1] {
            PaletteItem::Action(a) => {
                assert!(a.disabled);
                assert_eq!(a.keywords, ["admin"]);
                assert_eq!(a.data, Some(serde_json::json!({"route": "/users"})));
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn load_catalog_rejects_empty_label() {
        let err = load_catalog(r#"[{"id": "x", "label": "  "}]"#).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyLabel { ref id } if id == "x"));
        assert!(err.to_string().contains("empty label"));
    }

    #[test]
    fn load_catalog_reports_parse_errors() {
        let err = load_catalog("{not json").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
