#![forbid(unsafe_code)]

//! Substring filter over grouped actions.
//!
//! [`filter_items`] is a pure function of `(items, query, limit)`:
//!
//! | query | limit | result |
//! |-------|-------|--------|
//! | blank | none | items unchanged |
//! | blank | `n` | first `n` actions, flattened (group headers dropped) |
//! | text | any | matching actions, groups kept only when non-empty |
//!
//! A query is blank when it is empty after trimming. Matching is a
//! case-insensitive substring test against [`ActionItem::search_text`]. The
//! untrimmed query is used for matching, so `"go "` does not match `"Go"`.
//!
//! `limit` caps the number of actions across the whole result, not per group.

use crate::action::{ActionGroup, ActionItem, PaletteItem, iter_actions};

/// Filter a catalog against a query.
pub fn filter_items(items: &[PaletteItem], query: &str, limit: Option<usize>) -> Vec<PaletteItem> {
    if query.trim().is_empty() {
        return match limit {
            None => items.to_vec(),
            Some(n) => iter_actions(items)
                .take(n)
                .cloned()
                .map(PaletteItem::Action)
                .collect(),
        };
    }

    let needle = query.to_lowercase();
    let mut budget = limit.unwrap_or(usize::MAX);
    let mut out = Vec::new();

    for item in items {
        if budget == 0 {
            break;
        }
        match item {
            PaletteItem::Action(action) => {
                if action.matches(&needle) {
                    out.push(PaletteItem::Action(action.clone()));
                    budget -= 1;
                }
            }
            PaletteItem::Group(group) => {
                let actions = take_matches(&group.actions, &needle, &mut budget);
                if !actions.is_empty() {
                    out.push(PaletteItem::Group(ActionGroup {
                        group_label: group.group_label.clone(),
                        actions,
                    }));
                }
            }
        }
    }

    crate::trace!(
        query_len = query.len(),
        limit = ?limit,
        entries = out.len(),
        "filter applied"
    );
    out
}

fn take_matches(actions: &[ActionItem], needle: &str, budget: &mut usize) -> Vec<ActionItem> {
    let mut kept = Vec::new();
    for action in actions {
        if *budget == 0 {
            break;
        }
        if action.matches(needle) {
            kept.push(action.clone());
            *budget -= 1;
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{FlatIndexMap, total_actions};

    fn catalog() -> Vec<PaletteItem> {
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

    fn ids(items: &[PaletteItem]) -> Vec<String> {
        FlatIndexMap::from_items(items)
            .iter()
            .map(|a| a.id.clone())
            .collect()
    }

    #[test]
    fn grouped_scenario_keeps_only_matching_action() {
        let out = filter_items(&catalog(), "re", None);
        assert_eq!(
            out,
            vec![PaletteItem::Group(ActionGroup::new(
                "Nav",
                vec![ActionItem::new("rep", "View Reports")]
            ))]
        );
    }

    #[test]
    fn blank_query_without_limit_is_identity() {
        assert_eq!(filter_items(&catalog(), "", None), catalog());
        assert_eq!(filter_items(&catalog(), "   ", None), catalog());
    }

    #[test]
    fn blank_query_with_limit_flattens() {
        let out = filter_items(&catalog(), " ", Some(2));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|i| matches!(i, PaletteItem::Action(_))));
        assert_eq!(ids(&out), ["home", "rep"]);

        let all = filter_items(&catalog(), "", Some(10));
        assert_eq!(all.len(), total_actions(&catalog()));
    }

    #[test]
    fn empty_groups_are_dropped() {
        let out = filter_items(&catalog(), "users", None);
        assert_eq!(out, vec![PaletteItem::Action(ActionItem::new("users", "Manage Users"))]);
    }

    #[test]
    fn matching_is_case_insensitive_over_all_fields() {
        let items: Vec<PaletteItem> = vec![
            ActionItem::new("a", "Alpha").with_description("First LETTER").into(),
            ActionItem::new("b", "Beta").with_keywords(&["Second"]).into(),
            ActionItem::new("c", "Gamma").into(),
        ];
        assert_eq!(ids(&filter_items(&items, "letter", None)), ["a"]);
        assert_eq!(ids(&filter_items(&items, "SECOND", None)), ["b"]);
        assert!(filter_items(&items, "zeta", None).is_empty());
    }

    #[test]
    fn query_spans_joined_fields() {
        let items: Vec<PaletteItem> =
            vec![ActionItem::new("a", "Open").with_description("file").into()];
        assert_eq!(ids(&filter_items(&items, "open file", None)), ["a"]);
    }

    #[test]
    fn limit_caps_total_across_groups() {
        let items: Vec<PaletteItem> = vec![
            ActionGroup::new(
                "One",
                vec![ActionItem::new("a1", "item"), ActionItem::new("a2", "item")],
            )
            .into(),
            ActionGroup::new(
                "Two",
                vec![ActionItem::new("b1", "item"), ActionItem::new("b2", "item")],
            )
            .into(),
            ActionItem::new("c", "item").into(),
        ];
        let out = filter_items(&items, "item", Some(3));
        assert_eq!(ids(&out), ["a1", "a2", "b1"]);
        assert_eq!(out.len(), 2, "second group truncated, standalone dropped");

        assert!(filter_items(&items, "item", Some(0)).is_empty());
    }

    #[test]
    fn empty_input_is_fine() {
        assert!(filter_items(&[], "x", Some(5)).is_empty());
        assert!(filter_items(&[], "", Some(5)).is_empty());
        assert!(filter_items(&[], "", None).is_empty());
    }
}
