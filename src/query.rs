use std::collections::BTreeSet;

use clap::ValueEnum;
use jiff::Timestamp;

use crate::models::{store::Store, task::Task};

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SortKey {
    /// Designed lifespan of the task (how long it was given to live)
    Age,
    /// The instant the task dies
    #[default]
    Deadline,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SortOrder {
    #[default]
    #[value(name = "asc")]
    Ascending,
    #[value(name = "desc")]
    Descending,
}

/// Derives the visible, ordered task list for one view.
///
/// Pure: no side effects, safe to call on every render. `now` must be
/// sampled once by the caller and reused for the whole invocation so every
/// task is classified against the same instant.
///
/// - Partition: the living view keeps tasks alive at `now`, the dead view
///   keeps the rest.
/// - Category filter: with a non-empty selection, only tasks whose category
///   name is selected survive; uncategorized tasks are dropped. Names are
///   matched against canonical category names.
/// - Sort: `Age` compares designed lifespans, `Deadline` compares expiry
///   instants; `Descending` reverses the key comparison only. Ties always
///   break by task id, so the ordering is deterministic.
pub fn filter_and_sort<'a>(
    store: &'a Store,
    show_dead: bool,
    selected_category_names: &BTreeSet<String>,
    sort_key: SortKey,
    sort_order: SortOrder,
    now: Timestamp,
) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = store
        .tasks
        .iter()
        .filter(|task| task.is_alive(now) == !show_dead)
        .filter(|task| {
            if selected_category_names.is_empty() {
                return true;
            }
            task.category_id
                .and_then(|id| store.get_category(id))
                .map(|category| selected_category_names.contains(&category.name))
                .unwrap_or(false)
        })
        .collect();

    visible.sort_by(|lhs, rhs| {
        let by_key = match sort_key {
            SortKey::Age => lhs.lifespan.cmp(&rhs.lifespan),
            SortKey::Deadline => lhs.deadline().cmp(&rhs.deadline()),
        };
        let by_key = match sort_order {
            SortOrder::Ascending => by_key,
            SortOrder::Descending => by_key.reverse(),
        };
        by_key.then_with(|| lhs.id.cmp(&rhs.id))
    });

    visible
}
