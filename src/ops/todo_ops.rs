//! Collection transforms behind the store's mutations.
//!
//! Each function takes the current list by reference and returns the next
//! list, or `None` when the input would leave the collection unchanged
//! (blank text, unknown id, nothing to clear).

use chrono::{DateTime, Utc};

use crate::model::todo::{TodoItem, TodoList};

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Id for an item created at `now`: epoch millis as a decimal string,
/// advanced past any id already taken in `list`.
pub fn next_id(list: &TodoList, now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = millis.to_string();
        if !list.contains(&candidate) {
            return candidate;
        }
        millis += 1;
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Prepend a new incomplete item. Returns the new list and the assigned id.
pub fn add_todo(
    list: &TodoList,
    text: &str,
    category: &str,
    now: DateTime<Utc>,
) -> Option<(TodoList, String)> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let id = next_id(list, now);
    let item = TodoItem::new(
        id.clone(),
        text.to_string(),
        now.timestamp_millis(),
        category.to_string(),
    );
    let next = std::iter::once(item)
        .chain(list.iter().cloned())
        .collect();
    Some((next, id))
}

/// Flip `completed` on the item with `id`.
pub fn toggle_todo(list: &TodoList, id: &str) -> Option<TodoList> {
    update(list, id, |item| item.completed = !item.completed)
}

/// Replace the text (and category when given) of the item with `id`.
/// Id, completion and creation time are kept.
pub fn edit_todo(list: &TodoList, id: &str, text: &str, category: Option<&str>) -> Option<TodoList> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    update(list, id, |item| {
        item.text = text.to_string();
        if let Some(category) = category {
            item.category = category.to_string();
        }
    })
}

/// Drop the item with `id`.
pub fn delete_todo(list: &TodoList, id: &str) -> Option<TodoList> {
    if !list.contains(id) {
        return None;
    }
    Some(list.iter().filter(|t| t.id != id).cloned().collect())
}

/// Drop every completed item, keeping the rest in order.
pub fn clear_completed(list: &TodoList) -> Option<TodoList> {
    if list.completed_count() == 0 {
        return None;
    }
    Some(list.iter().filter(|t| !t.completed).cloned().collect())
}

fn update(list: &TodoList, id: &str, f: impl FnOnce(&mut TodoItem)) -> Option<TodoList> {
    let idx = list.iter().position(|t| t.id == id)?;
    let mut items = list.items().to_vec();
    f(&mut items[idx]);
    Some(items.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn sample() -> TodoList {
        let list = TodoList::new();
        let (list, _) = add_todo(&list, "Pay rent", "Personal", at(1_000)).unwrap();
        let (list, _) = add_todo(&list, "Buy milk", "Shopping", at(2_000)).unwrap();
        let (list, _) = add_todo(&list, "Run", "Health", at(3_000)).unwrap();
        list
    }

    #[test]
    fn add_prepends_trimmed_item() {
        let (list, id) = add_todo(&TodoList::new(), "  Buy milk  ", "Shopping", at(42)).unwrap();
        assert_eq!(id, "42");
        let item = &list.items()[0];
        assert_eq!(item.text, "Buy milk");
        assert_eq!(item.created_at, 42);
        assert!(!item.completed);

        let (list, _) = add_todo(&list, "Pay rent", "Personal", at(50)).unwrap();
        assert_eq!(list.items()[0].text, "Pay rent");
        assert_eq!(list.items()[1].text, "Buy milk");
    }

    #[test]
    fn add_blank_is_noop() {
        for text in ["", "   ", "\t\n"] {
            assert!(add_todo(&sample(), text, "Work", at(9_000)).is_none());
        }
    }

    #[test]
    fn ids_stay_unique_within_same_millisecond() {
        let (list, a) = add_todo(&TodoList::new(), "a", "Work", at(7)).unwrap();
        let (list, b) = add_todo(&list, "b", "Work", at(7)).unwrap();
        let (list, c) = add_todo(&list, "c", "Work", at(7)).unwrap();
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("7", "8", "9"));
        assert!(list.iter().all(|t| t.created_at == 7));
    }

    #[test]
    fn toggle_twice_restores() {
        let list = sample();
        let once = toggle_todo(&list, "2000").unwrap();
        assert!(once.get("2000").unwrap().completed);
        let twice = toggle_todo(&once, "2000").unwrap();
        assert_eq!(twice, list);
    }

    #[test]
    fn unknown_id_is_noop() {
        let list = sample();
        assert!(toggle_todo(&list, "nope").is_none());
        assert!(edit_todo(&list, "nope", "x", None).is_none());
        assert!(delete_todo(&list, "nope").is_none());
    }

    #[test]
    fn edit_keeps_identity_fields() {
        let list = toggle_todo(&sample(), "1000").unwrap();
        let edited = edit_todo(&list, "1000", " Pay April rent ", Some("Work")).unwrap();
        let item = edited.get("1000").unwrap();
        assert_eq!(item.text, "Pay April rent");
        assert_eq!(item.category, "Work");
        assert!(item.completed);
        assert_eq!(item.created_at, 1_000);

        let kept = edit_todo(&edited, "1000", "Rent", None).unwrap();
        assert_eq!(kept.get("1000").unwrap().category, "Work");
    }

    #[test]
    fn edit_blank_is_noop() {
        assert!(edit_todo(&sample(), "1000", "  ", Some("Work")).is_none());
    }

    #[test]
    fn delete_removes_exactly_one() {
        let list = sample();
        let next = delete_todo(&list, "2000").unwrap();
        assert_eq!(next.len(), list.len() - 1);
        assert!(!next.contains("2000"));
    }

    #[test]
    fn clear_completed_keeps_active_order() {
        let list = toggle_todo(&sample(), "2000").unwrap();
        let cleared = clear_completed(&list).unwrap();
        let texts: Vec<&str> = cleared.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Run", "Pay rent"]);
        assert_eq!(cleared.completed_count(), 0);
    }

    #[test]
    fn clear_completed_without_completed_is_noop() {
        assert!(clear_completed(&sample()).is_none());
    }

    #[test]
    fn source_list_is_untouched() {
        let list = sample();
        let before = list.clone();
        let _ = toggle_todo(&list, "1000");
        let _ = delete_todo(&list, "3000");
        assert_eq!(list, before);
    }
}
