use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        category::{Category, Color, PALETTE},
        store::Store,
    },
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum CreateCategoryError {
    #[error("Category name must not be empty")]
    EmptyName,

    #[error("Category with name '{0}' already exists")]
    CategoryAlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CreateCategoryParameters {
    pub name: String,
    pub color: Option<Color>,
}

/// Creates a category. Names are unique ignoring case, and the check runs
/// before anything is inserted, so a rejection leaves the store untouched.
///
/// Without a color hint, a random color the existing categories are not
/// using is picked; once every palette color is taken, any palette color is
/// picked uniformly at random.
pub fn create_category(
    store: &mut Store,
    storage: &impl Storage,
    parameters: CreateCategoryParameters,
) -> Result<Category, CreateCategoryError> {
    let name = parameters.name.trim().to_string();
    if name.is_empty() {
        return Err(CreateCategoryError::EmptyName);
    }

    if store.get_category_by_name(&name).is_some() {
        return Err(CreateCategoryError::CategoryAlreadyExists(name));
    }

    let color = parameters.color.unwrap_or_else(|| pick_color(store));

    let category = Category {
        id: Uuid::new_v4(),
        name,
        color,
    };

    store.add_category(category.clone());
    storage.save(store)?;

    Ok(category)
}

fn pick_color(store: &Store) -> Color {
    let used: Vec<Color> = store.categories.iter().map(|c| c.color).collect();
    let unused: Vec<Color> = PALETTE
        .iter()
        .copied()
        .filter(|color| !used.contains(color))
        .collect();

    let mut rng = rand::thread_rng();
    if unused.is_empty() {
        PALETTE[rng.gen_range(0..PALETTE.len())]
    } else {
        unused[rng.gen_range(0..unused.len())]
    }
}

#[derive(Debug, Error)]
pub enum DeleteCategoryError {
    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteCategoryParameters {
    pub name: String,
}

/// Deletes a category and clears the reference on every task that pointed
/// to it. The tasks themselves are untouched.
pub fn delete_category(
    store: &mut Store,
    storage: &impl Storage,
    parameters: DeleteCategoryParameters,
) -> Result<Category, DeleteCategoryError> {
    let category_id = store
        .get_category_by_name(&parameters.name)
        .map(|category| category.id)
        .ok_or(DeleteCategoryError::CategoryNotFound(parameters.name))?;

    for task in store.tasks.iter_mut() {
        if task.category_id == Some(category_id) {
            task.category_id = None;
        }
    }

    let removed = store.remove_category(category_id).unwrap();
    storage.save(store)?;

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::task::Task;

    struct NullStorage;

    impl Storage for NullStorage {
        fn load(&self) -> Result<Store, StorageError> {
            Ok(Store::default())
        }

        fn save(&self, _store: &Store) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn create(store: &mut Store, name: &str, color: Option<Color>) -> Result<Category, CreateCategoryError> {
        create_category(
            store,
            &NullStorage,
            CreateCategoryParameters {
                name: String::from(name),
                color,
            },
        )
    }

    #[test]
    fn test_duplicate_names_are_rejected_ignoring_case() {
        let mut store = Store::default();
        create(&mut store, "Work", None).unwrap();

        match create(&mut store, "work", None) {
            Err(CreateCategoryError::CategoryAlreadyExists(name)) => assert_eq!(name, "work"),
            _ => panic!("Expected CategoryAlreadyExists error"),
        }
        assert_eq!(store.categories.len(), 1);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut store = Store::default();

        match create(&mut store, "  ", None) {
            Err(CreateCategoryError::EmptyName) => {}
            _ => panic!("Expected EmptyName error"),
        }
        assert!(store.categories.is_empty());
    }

    #[test]
    fn test_color_hint_wins() {
        let mut store = Store::default();

        let category = create(&mut store, "Work", Some(Color::Teal)).unwrap();

        assert_eq!(category.color, Color::Teal);
    }

    #[test]
    fn test_picked_colors_avoid_used_ones_until_the_palette_runs_out() {
        let mut store = Store::default();
        for i in 0..PALETTE.len() {
            let category = create(&mut store, &format!("category-{i}"), None).unwrap();
            let earlier_colors: Vec<Color> = store.categories[..store.categories.len() - 1]
                .iter()
                .map(|c| c.color)
                .collect();
            assert!(
                !earlier_colors.contains(&category.color),
                "Color {:?} was already in use",
                category.color
            );
        }

        // Palette exhausted; the next pick still lands somewhere in it.
        let overflow = create(&mut store, "overflow", None).unwrap();
        assert!(PALETTE.contains(&overflow.color));
    }

    #[test]
    fn test_delete_nullifies_task_references_but_keeps_tasks() {
        let mut store = Store::default();
        let work = create(&mut store, "Work", None).unwrap();
        let home = create(&mut store, "Home", None).unwrap();

        store.add_task(Task {
            id: Uuid::new_v4(),
            title: String::from("report"),
            category_id: Some(work.id),
            ..Task::default()
        });
        store.add_task(Task {
            id: Uuid::new_v4(),
            title: String::from("dishes"),
            category_id: Some(home.id),
            ..Task::default()
        });

        delete_category(
            &mut store,
            &NullStorage,
            DeleteCategoryParameters {
                name: String::from("work"),
            },
        )
        .unwrap();

        assert_eq!(store.tasks.len(), 2);
        assert_eq!(store.tasks[0].category_id, None);
        assert_eq!(store.tasks[1].category_id, Some(home.id));
        assert!(store.get_category_by_name("Work").is_none());
    }

    #[test]
    fn test_delete_unknown_category() {
        let mut store = Store::default();

        match delete_category(
            &mut store,
            &NullStorage,
            DeleteCategoryParameters {
                name: String::from("ghost"),
            },
        ) {
            Err(DeleteCategoryError::CategoryNotFound(name)) => assert_eq!(name, "ghost"),
            _ => panic!("Expected CategoryNotFound error"),
        }
    }
}
