use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{category::Category, task::Task};

/// Current schema version
pub const CURRENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
pub struct Store {
    pub version: u32,
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            tasks: vec![],
            categories: vec![],
        }
    }
}

impl Store {
    /// Adds a task, assigning it the next user-facing task number.
    pub fn add_task(&mut self, mut task: Task) {
        let next_number = self
            .tasks
            .iter()
            .map(|t| t.task_number)
            .max()
            .unwrap_or(0)
            + 1;
        task.task_number = next_number;
        self.tasks.push(task);
    }

    pub fn get_task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn get_task_by_number(&self, task_number: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.task_number == task_number)
    }

    pub fn remove_task(&mut self, id: Uuid) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn add_category(&mut self, category: Category) {
        self.categories.push(category);
    }

    pub fn get_category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Looks a category up by name, ignoring case. Uniqueness is enforced
    /// case-insensitively at creation, so at most one can match.
    pub fn get_category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.to_lowercase() == name.to_lowercase())
    }

    pub fn remove_category(&mut self, id: Uuid) -> Option<Category> {
        let index = self.categories.iter().position(|c| c.id == id)?;
        Some(self.categories.remove(index))
    }

    /// Derived category → tasks back-reference; never stored on the category.
    pub fn tasks_in_category(&self, category_id: Uuid) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |t| t.category_id == Some(category_id))
    }
}
