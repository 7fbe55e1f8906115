use jiff::{SignedDuration, Timestamp, civil, tz::TimeZone};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        store::Store,
        task::{DEFAULT_LIFESPAN, LifecycleMode, Task},
    },
    storage::{Storage, StorageError},
};

/// Which lifecycle partition a fuzzy title reference is matched against.
/// Numeric references always address any task.
#[derive(Clone, Copy)]
pub enum TaskPool {
    Living,
    Dead,
    All,
}

#[derive(Debug, Error)]
pub enum ResolveTaskError {
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Task name is ambiguous. Multiple tasks found: {}", .0.join(", "))]
    AmbiguousTaskName(Vec<String>),
}

/// Resolves a user-supplied task reference: a task number first, falling
/// back to a case-insensitive substring match on titles within `pool`.
pub fn resolve_task<'a>(
    store: &'a Store,
    reference: &str,
    pool: TaskPool,
    now: Timestamp,
) -> Result<&'a Task, ResolveTaskError> {
    if let Ok(task_number) = reference.parse::<u64>() {
        return store
            .get_task_by_number(task_number)
            .ok_or_else(|| ResolveTaskError::TaskNotFound(reference.to_string()));
    }

    let matching_tasks: Vec<_> = store
        .tasks
        .iter()
        .filter(|t| match pool {
            TaskPool::Living => t.is_alive(now),
            TaskPool::Dead => !t.is_alive(now),
            TaskPool::All => true,
        })
        .filter(|t| t.title.to_lowercase().contains(&reference.to_lowercase()))
        .collect();

    match matching_tasks.len() {
        0 => Err(ResolveTaskError::TaskNotFound(reference.to_string())),
        1 => Ok(matching_tasks[0]),
        _ => {
            let titles: Vec<String> = matching_tasks.iter().map(|t| t.title.clone()).collect();
            Err(ResolveTaskError::AmbiguousTaskName(titles))
        }
    }
}

/// Parses a deadline as an RFC 3339 timestamp, a civil date-time, or a
/// civil date (start of day), the latter two in the system time zone.
fn parse_deadline(input: &str) -> Result<Timestamp, String> {
    if let Ok(timestamp) = input.parse::<Timestamp>() {
        return Ok(timestamp);
    }
    if let Ok(datetime) = input.parse::<civil::DateTime>() {
        return datetime
            .to_zoned(TimeZone::system())
            .map(|zoned| zoned.timestamp())
            .map_err(|e| e.to_string());
    }
    if let Ok(date) = input.parse::<civil::Date>() {
        return date
            .to_zoned(TimeZone::system())
            .map(|zoned| zoned.timestamp())
            .map_err(|e| e.to_string());
    }
    Err(String::from(
        "expected an RFC 3339 timestamp, a date-time, or a date",
    ))
}

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Invalid deadline '{0}': {1}")]
    InvalidDeadline(String, String),

    #[error("Deadline '{0}' is before the creation time")]
    DeadlineBeforeCreation(String),

    #[error("Invalid lifespan '{0}': {1}")]
    InvalidLifespan(String, String),

    #[error("Lifespan '{0}' is negative")]
    NegativeLifespan(String),

    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct AddTaskParameters {
    pub title: String,
    pub notes: Option<String>,
    pub deadline: Option<String>,
    pub lifespan: Option<String>,
    pub category: Option<String>,
    pub persistent: bool,
}

pub fn add_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: AddTaskParameters,
    now: Timestamp,
) -> Result<Task, AddTaskError> {
    let title = parameters.title.trim().to_string();
    if title.is_empty() {
        return Err(AddTaskError::EmptyTitle);
    }

    let category_id = if let Some(category_name) = parameters.category {
        let category = store
            .get_category_by_name(&category_name)
            .ok_or(AddTaskError::CategoryNotFound(category_name))?;
        Some(category.id)
    } else {
        None
    };

    let lifespan = if let Some(lifespan_str) = parameters.lifespan {
        let lifespan = lifespan_str
            .parse::<SignedDuration>()
            .map_err(|e| AddTaskError::InvalidLifespan(lifespan_str.clone(), e.to_string()))?;
        if lifespan.is_negative() {
            return Err(AddTaskError::NegativeLifespan(lifespan_str));
        }
        lifespan
    } else if let Some(deadline_str) = parameters.deadline {
        let deadline = parse_deadline(&deadline_str)
            .map_err(|e| AddTaskError::InvalidDeadline(deadline_str.clone(), e))?;
        let lifespan = deadline.duration_since(now);
        if lifespan.is_negative() {
            return Err(AddTaskError::DeadlineBeforeCreation(deadline_str));
        }
        lifespan
    } else {
        DEFAULT_LIFESPAN
    };

    let task = Task {
        id: Uuid::new_v4(),
        task_number: 0,
        title,
        notes: parameters.notes,
        category_id,
        mode: if parameters.persistent {
            LifecycleMode::Persistent
        } else {
            LifecycleMode::Normal
        },
        created_at: now,
        revived_at: now,
        lifespan,
        killed_at: None,
    };

    let task_id = task.id;

    // Add to store (assigns task_number), then persist
    store.add_task(task);
    storage.save(store)?;

    Ok(store.get_task(task_id).unwrap().clone())
}

#[derive(Debug, Error)]
pub enum KillTaskError {
    #[error(transparent)]
    Resolve(#[from] ResolveTaskError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct KillTaskParameters {
    pub reference: String,
}

/// Marks a task as manually dead at `now`. Deadline, anchor, and creation
/// date are left untouched. Killing a task that is already dead is an
/// idempotent no-op, and persistent tasks are never killed; neither case
/// re-persists the store.
pub fn kill_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: KillTaskParameters,
    now: Timestamp,
) -> Result<Task, KillTaskError> {
    let task = resolve_task(store, &parameters.reference, TaskPool::Living, now)?;

    if task.mode == LifecycleMode::Persistent || !task.is_alive(now) {
        return Ok(task.clone());
    }

    let task_id = task.id;
    let mut updated_task = task.clone();
    updated_task.killed_at = Some(now);

    *store.get_task_mut(task_id).unwrap() = updated_task.clone();
    storage.save(store)?;

    Ok(updated_task)
}

#[derive(Debug, Error)]
pub enum ReviveTaskError {
    #[error(transparent)]
    Resolve(#[from] ResolveTaskError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct ReviveTaskParameters {
    pub reference: String,
}

/// Brings a task back to life at `now`: the lifespan doubles, the anchor
/// moves to `now`, and the kill marker is cleared, so the new deadline
/// strictly exceeds the old one and the task is alive immediately.
///
/// Reviving a zero-lifespan task is a degenerate no-op, and persistent
/// tasks have nothing to revive; both leave the store untouched.
pub fn revive_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: ReviveTaskParameters,
    now: Timestamp,
) -> Result<Task, ReviveTaskError> {
    let task = resolve_task(store, &parameters.reference, TaskPool::Dead, now)?;

    if task.mode == LifecycleMode::Persistent || task.lifespan.is_zero() {
        return Ok(task.clone());
    }

    let task_id = task.id;
    let mut revived_task = task.clone();
    revived_task.lifespan = revived_task
        .lifespan
        .checked_mul(2)
        .unwrap_or(SignedDuration::MAX);
    revived_task.revived_at = now;
    revived_task.killed_at = None;

    *store.get_task_mut(task_id).unwrap() = revived_task.clone();
    storage.save(store)?;

    Ok(revived_task)
}

#[derive(Debug, Error)]
pub enum EditTaskError {
    #[error(transparent)]
    Resolve(#[from] ResolveTaskError),

    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Invalid deadline '{0}': {1}")]
    InvalidDeadline(String, String),

    #[error("Deadline '{0}' is before the task's anchor time")]
    DeadlineBeforeAnchor(String),

    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub enum CategoryEdit {
    Keep,
    Clear,
    Assign(String),
}

pub struct EditTaskParameters {
    pub reference: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub deadline: Option<String>,
    pub category: CategoryEdit,
}

/// Edits title, notes, deadline, or category assignment. Every change is
/// validated before any field is written, so a rejection leaves the task
/// exactly as it was.
pub fn edit_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: EditTaskParameters,
    now: Timestamp,
) -> Result<Task, EditTaskError> {
    let task = resolve_task(store, &parameters.reference, TaskPool::All, now)?;
    let task_id = task.id;

    let new_title = if let Some(title) = parameters.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(EditTaskError::EmptyTitle);
        }
        Some(title)
    } else {
        None
    };

    // A new deadline reshapes the lifespan from the current anchor.
    let new_lifespan = if let Some(deadline_str) = parameters.deadline {
        let deadline = parse_deadline(&deadline_str)
            .map_err(|e| EditTaskError::InvalidDeadline(deadline_str.clone(), e))?;
        let lifespan = deadline.duration_since(task.revived_at);
        if lifespan.is_negative() {
            return Err(EditTaskError::DeadlineBeforeAnchor(deadline_str));
        }
        Some(lifespan)
    } else {
        None
    };

    let new_category_id = match parameters.category {
        CategoryEdit::Keep => task.category_id,
        CategoryEdit::Clear => None,
        CategoryEdit::Assign(category_name) => {
            let category = store
                .get_category_by_name(&category_name)
                .ok_or(EditTaskError::CategoryNotFound(category_name))?;
            Some(category.id)
        }
    };

    let mut updated_task = store.get_task(task_id).unwrap().clone();
    if let Some(title) = new_title {
        updated_task.title = title;
    }
    if let Some(notes) = parameters.notes {
        updated_task.notes = if notes.is_empty() { None } else { Some(notes) };
    }
    if let Some(lifespan) = new_lifespan {
        updated_task.lifespan = lifespan;
    }
    updated_task.category_id = new_category_id;

    *store.get_task_mut(task_id).unwrap() = updated_task.clone();
    storage.save(store)?;

    Ok(updated_task)
}

#[derive(Debug, Error)]
pub enum DeleteTaskError {
    #[error(transparent)]
    Resolve(#[from] ResolveTaskError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteTaskParameters {
    pub reference: String,
}

/// Destroys a task outright. Dead tasks are never garbage-collected, so
/// this is the only way a task leaves the store.
pub fn delete_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: DeleteTaskParameters,
    now: Timestamp,
) -> Result<Task, DeleteTaskError> {
    let task = resolve_task(store, &parameters.reference, TaskPool::All, now)?;
    let task_id = task.id;

    let removed_task = store.remove_task(task_id).unwrap();
    storage.save(store)?;

    Ok(removed_task)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Storage double that persists nothing; services only need `save` to
    /// succeed.
    struct NullStorage;

    impl Storage for NullStorage {
        fn load(&self) -> Result<Store, StorageError> {
            Ok(Store::default())
        }

        fn save(&self, _store: &Store) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn at_hours(hours: i64) -> Timestamp {
        Timestamp::UNIX_EPOCH + SignedDuration::from_hours(hours)
    }

    fn add_parameters(title: &str) -> AddTaskParameters {
        AddTaskParameters {
            title: String::from(title),
            notes: None,
            deadline: None,
            lifespan: None,
            category: None,
            persistent: false,
        }
    }

    #[test]
    fn test_add_task_uses_the_default_lifespan() {
        let mut store = Store::default();

        let task = add_task(&mut store, &NullStorage, add_parameters("water plants"), at_hours(0))
            .unwrap();

        assert_eq!(task.lifespan, DEFAULT_LIFESPAN);
        assert_eq!(task.task_number, 1);
        assert!(task.is_alive(at_hours(23)));
        assert!(!task.is_alive(at_hours(25)));
    }

    #[test]
    fn test_add_task_rejects_whitespace_title() {
        let mut store = Store::default();

        match add_task(&mut store, &NullStorage, add_parameters("   "), at_hours(0)) {
            Err(AddTaskError::EmptyTitle) => {}
            _ => panic!("Expected EmptyTitle error"),
        }
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn test_add_task_with_explicit_lifespan() {
        let mut store = Store::default();
        let parameters = AddTaskParameters {
            lifespan: Some(String::from("36h")),
            ..add_parameters("long haul")
        };

        let task = add_task(&mut store, &NullStorage, parameters, at_hours(0)).unwrap();

        assert_eq!(task.lifespan, SignedDuration::from_hours(36));
    }

    #[test]
    fn test_add_task_rejects_deadline_before_creation() {
        let mut store = Store::default();
        let parameters = AddTaskParameters {
            deadline: Some(String::from("1969-12-30T00:00:00Z")),
            ..add_parameters("time traveler")
        };

        match add_task(&mut store, &NullStorage, parameters, at_hours(0)) {
            Err(AddTaskError::DeadlineBeforeCreation(_)) => {}
            _ => panic!("Expected DeadlineBeforeCreation error"),
        }
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn test_add_task_with_rfc3339_deadline() {
        let mut store = Store::default();
        let parameters = AddTaskParameters {
            deadline: Some(String::from("1970-01-02T00:00:00Z")),
            ..add_parameters("due tomorrow")
        };

        let task = add_task(&mut store, &NullStorage, parameters, at_hours(0)).unwrap();

        assert_eq!(task.lifespan, SignedDuration::from_hours(24));
    }

    #[test]
    fn test_add_task_with_unknown_category() {
        let mut store = Store::default();
        let parameters = AddTaskParameters {
            category: Some(String::from("Work")),
            ..add_parameters("report")
        };

        match add_task(&mut store, &NullStorage, parameters, at_hours(0)) {
            Err(AddTaskError::CategoryNotFound(name)) => assert_eq!(name, "Work"),
            _ => panic!("Expected CategoryNotFound error"),
        }
    }

    #[test]
    fn test_kill_marks_the_task_dead_without_touching_the_deadline() {
        let mut store = Store::default();
        add_task(&mut store, &NullStorage, add_parameters("victim"), at_hours(0)).unwrap();
        let deadline_before = store.tasks[0].deadline();

        let killed = kill_task(
            &mut store,
            &NullStorage,
            KillTaskParameters {
                reference: String::from("victim"),
            },
            at_hours(1),
        )
        .unwrap();

        assert_eq!(killed.killed_at, Some(at_hours(1)));
        assert_eq!(killed.deadline(), deadline_before);
        assert_eq!(killed.created_at, at_hours(0));
        assert!(!killed.is_alive(at_hours(1)));
    }

    #[test]
    fn test_kill_is_idempotent_on_dead_tasks() {
        let mut store = Store::default();
        add_task(&mut store, &NullStorage, add_parameters("victim"), at_hours(0)).unwrap();
        let number = store.tasks[0].task_number.to_string();

        kill_task(
            &mut store,
            &NullStorage,
            KillTaskParameters {
                reference: number.clone(),
            },
            at_hours(1),
        )
        .unwrap();
        let again = kill_task(
            &mut store,
            &NullStorage,
            KillTaskParameters { reference: number },
            at_hours(2),
        )
        .unwrap();

        assert_eq!(again.killed_at, Some(at_hours(1)));
    }

    #[test]
    fn test_kill_leaves_persistent_tasks_alone() {
        let mut store = Store::default();
        let parameters = AddTaskParameters {
            persistent: true,
            ..add_parameters("evergreen")
        };
        add_task(&mut store, &NullStorage, parameters, at_hours(0)).unwrap();

        let task = kill_task(
            &mut store,
            &NullStorage,
            KillTaskParameters {
                reference: String::from("evergreen"),
            },
            at_hours(1),
        )
        .unwrap();

        assert_eq!(task.killed_at, None);
        assert!(task.is_alive(at_hours(100)));
    }

    #[test]
    fn test_revive_doubles_the_lifespan_and_restores_life() {
        let mut store = Store::default();
        let parameters = AddTaskParameters {
            lifespan: Some(String::from("10h")),
            ..add_parameters("phoenix")
        };
        add_task(&mut store, &NullStorage, parameters, at_hours(0)).unwrap();
        let old_deadline = store.tasks[0].deadline();

        // Dead at +12h, revived at +15h
        let revived = revive_task(
            &mut store,
            &NullStorage,
            ReviveTaskParameters {
                reference: String::from("phoenix"),
            },
            at_hours(15),
        )
        .unwrap();

        assert_eq!(revived.lifespan, SignedDuration::from_hours(20));
        assert!(revived.deadline() > old_deadline);
        assert!(revived.is_alive(at_hours(15)));
        assert!(!revived.is_alive(at_hours(35)));
    }

    #[test]
    fn test_revive_clears_the_kill_marker() {
        let mut store = Store::default();
        add_task(&mut store, &NullStorage, add_parameters("phoenix"), at_hours(0)).unwrap();
        kill_task(
            &mut store,
            &NullStorage,
            KillTaskParameters {
                reference: String::from("phoenix"),
            },
            at_hours(1),
        )
        .unwrap();

        let revived = revive_task(
            &mut store,
            &NullStorage,
            ReviveTaskParameters {
                reference: String::from("phoenix"),
            },
            at_hours(2),
        )
        .unwrap();

        assert_eq!(revived.killed_at, None);
        assert!(revived.is_alive(at_hours(2)));
    }

    #[test]
    fn test_revive_of_zero_lifespan_task_changes_nothing() {
        let mut store = Store::default();
        let parameters = AddTaskParameters {
            lifespan: Some(String::from("0h")),
            ..add_parameters("stillborn")
        };
        add_task(&mut store, &NullStorage, parameters, at_hours(0)).unwrap();

        let task = revive_task(
            &mut store,
            &NullStorage,
            ReviveTaskParameters {
                reference: String::from("stillborn"),
            },
            at_hours(5),
        )
        .unwrap();

        assert_eq!(task.lifespan, SignedDuration::ZERO);
        assert_eq!(task.revived_at, at_hours(0));
        assert_eq!(task.created_at, at_hours(0));
        assert_eq!(task.killed_at, None);
    }

    #[test]
    fn test_edit_rejects_deadline_before_the_anchor() {
        let mut store = Store::default();
        add_task(&mut store, &NullStorage, add_parameters("victim"), at_hours(5)).unwrap();
        let lifespan_before = store.tasks[0].lifespan;

        let parameters = EditTaskParameters {
            reference: String::from("victim"),
            title: None,
            notes: None,
            deadline: Some(String::from("1970-01-01T00:00:00Z")),
            category: CategoryEdit::Keep,
        };
        match edit_task(&mut store, &NullStorage, parameters, at_hours(6)) {
            Err(EditTaskError::DeadlineBeforeAnchor(_)) => {}
            _ => panic!("Expected DeadlineBeforeAnchor error"),
        }

        assert_eq!(store.tasks[0].lifespan, lifespan_before);
    }

    #[test]
    fn test_edit_rejects_whitespace_title_and_keeps_the_old_one() {
        let mut store = Store::default();
        add_task(&mut store, &NullStorage, add_parameters("keep me"), at_hours(0)).unwrap();

        let parameters = EditTaskParameters {
            reference: String::from("keep me"),
            title: Some(String::from("   ")),
            notes: None,
            deadline: None,
            category: CategoryEdit::Keep,
        };
        match edit_task(&mut store, &NullStorage, parameters, at_hours(1)) {
            Err(EditTaskError::EmptyTitle) => {}
            _ => panic!("Expected EmptyTitle error"),
        }

        assert_eq!(store.tasks[0].title, "keep me");
    }

    #[test]
    fn test_edit_reassigns_and_clears_the_category() {
        use crate::models::category::Category;

        let mut store = Store::default();
        let category = Category {
            id: Uuid::new_v4(),
            name: String::from("Work"),
            ..Category::default()
        };
        let category_id = category.id;
        store.add_category(category);
        add_task(&mut store, &NullStorage, add_parameters("report"), at_hours(0)).unwrap();

        let parameters = EditTaskParameters {
            reference: String::from("report"),
            title: None,
            notes: None,
            deadline: None,
            category: CategoryEdit::Assign(String::from("work")),
        };
        let assigned = edit_task(&mut store, &NullStorage, parameters, at_hours(1)).unwrap();
        assert_eq!(assigned.category_id, Some(category_id));

        let parameters = EditTaskParameters {
            reference: String::from("report"),
            title: None,
            notes: None,
            deadline: None,
            category: CategoryEdit::Clear,
        };
        let cleared = edit_task(&mut store, &NullStorage, parameters, at_hours(1)).unwrap();
        assert_eq!(cleared.category_id, None);
    }

    #[test]
    fn test_delete_removes_the_task_from_the_store() {
        let mut store = Store::default();
        add_task(&mut store, &NullStorage, add_parameters("doomed"), at_hours(0)).unwrap();

        delete_task(
            &mut store,
            &NullStorage,
            DeleteTaskParameters {
                reference: String::from("doomed"),
            },
            at_hours(1),
        )
        .unwrap();

        assert!(store.tasks.is_empty());
    }

    #[test]
    fn test_resolution_reports_ambiguous_titles() {
        let mut store = Store::default();
        add_task(&mut store, &NullStorage, add_parameters("write report"), at_hours(0)).unwrap();
        add_task(&mut store, &NullStorage, add_parameters("read report"), at_hours(0)).unwrap();

        match resolve_task(&store, "report", TaskPool::All, at_hours(1)) {
            Err(ResolveTaskError::AmbiguousTaskName(titles)) => assert_eq!(titles.len(), 2),
            _ => panic!("Expected AmbiguousTaskName error"),
        }
    }
}
