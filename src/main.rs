use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use jiff::Timestamp;

use crate::{
    models::{category::Color, store::Store},
    query::{SortKey, SortOrder, filter_and_sort},
    services::{
        categories::{
            CreateCategoryParameters, DeleteCategoryParameters, create_category, delete_category,
        },
        tasks::{
            AddTaskParameters, CategoryEdit, DeleteTaskParameters, EditTaskParameters,
            KillTaskParameters, ReviveTaskParameters, TaskPool, add_task, delete_task, edit_task,
            kill_task, resolve_task, revive_task,
        },
    },
    storage::{Storage, json::JsonFileStorage},
};

mod models;
mod query;
mod services;
mod storage;
mod ui;

#[derive(Parser)]
#[command(
    name = "wilt",
    about = "A task manager where tasks decay, die, and come back to life"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks (the living view by default)
    List {
        /// Show the dead view instead
        #[arg(long)]
        dead: bool,

        /// Only show tasks in a category (can be used multiple times)
        #[arg(short, long, action = clap::ArgAction::Append)]
        category: Vec<String>,

        /// Sort key
        #[arg(long, value_enum, default_value = "deadline")]
        sort: SortKey,

        /// Sort direction
        #[arg(long, value_enum, default_value = "asc")]
        order: SortOrder,
    },

    /// Add a new task
    Add {
        /// Task title
        title: String,

        /// Set an explicit deadline (timestamp, date-time, or date)
        #[arg(short, long, conflicts_with = "lifespan")]
        deadline: Option<String>,

        /// Set an explicit lifespan (e.g., "36h", "2d 12h")
        #[arg(short, long)]
        lifespan: Option<String>,

        /// Assign to a category
        #[arg(short, long)]
        category: Option<String>,

        /// Add notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Exempt the task from decay; it never dies
        #[arg(long)]
        persistent: bool,
    },

    /// Kill a task before its deadline
    Kill {
        /// Task number or (part of) its title
        task: String,
    },

    /// Revive a dead task, doubling its lifespan
    Revive {
        /// Task number or (part of) its title
        task: String,
    },

    /// Delete a task for good
    Delete {
        /// Task number or (part of) its title
        task: String,
    },

    /// Show a task's details
    Show {
        /// Task number or (part of) its title
        task: String,
    },

    /// Edit a task
    Edit {
        /// Task number or (part of) its title
        task: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New notes (empty string clears them)
        #[arg(short, long)]
        notes: Option<String>,

        /// New deadline (timestamp, date-time, or date)
        #[arg(short, long)]
        deadline: Option<String>,

        /// Move to a category
        #[arg(short, long, conflicts_with = "no_category")]
        category: Option<String>,

        /// Remove the category assignment
        #[arg(long)]
        no_category: bool,
    },

    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommands),
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Create a new category
    New {
        name: String,

        /// Palette color (picked automatically when omitted)
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category; its tasks stay, uncategorized
    Delete { name: String },
    /// List all categories
    List,
}

fn main() {
    let cli = Cli::parse();

    // One clock sample per invocation; every classification below uses it.
    let now = Timestamp::now();

    let storage_path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wilt")
        .join("store.json");

    if let Some(parent) = storage_path.parent() {
        std::fs::create_dir_all(parent).unwrap_or_else(|e| {
            eprintln!("Error: Failed to create data directory: {}", e);
            std::process::exit(1);
        });
    }

    let storage = JsonFileStorage::new(storage_path);

    let mut store = match storage.load() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: Failed to load store: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        None => render_list(&store, false, &[], SortKey::Deadline, SortOrder::Ascending, now),
        Some(Commands::List {
            dead,
            category,
            sort,
            order,
        }) => render_list(&store, dead, &category, sort, order, now),
        Some(Commands::Add {
            title,
            deadline,
            lifespan,
            category,
            notes,
            persistent,
        }) => {
            let parameters = AddTaskParameters {
                title,
                notes,
                deadline,
                lifespan,
                category,
                persistent,
            };
            match add_task(&mut store, &storage, parameters, now) {
                Ok(task) => {
                    let fate = if persistent {
                        String::from("persistent")
                    } else {
                        ui::relative_deadline(task.deadline(), now)
                    };
                    println!(
                        "Added task {} {} — {}",
                        format!("#{}", task.task_number).dimmed(),
                        task.title.bold(),
                        fate.dimmed()
                    );
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Kill { task }) => {
            let parameters = KillTaskParameters { reference: task };
            match kill_task(&mut store, &storage, parameters, now) {
                Ok(task) => {
                    if task.is_alive(now) {
                        println!("{} is persistent and cannot be killed", task.title.bold());
                    } else if task.killed_at == Some(now) {
                        println!("Killed {}", task.title.bold());
                    } else {
                        println!("{} was already dead", task.title.bold());
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Revive { task }) => {
            let parameters = ReviveTaskParameters { reference: task };
            match revive_task(&mut store, &storage, parameters, now) {
                Ok(task) => {
                    if task.revived_at == now {
                        println!(
                            "Revived {} — {}",
                            task.title.bold(),
                            ui::relative_deadline(task.deadline(), now).dimmed()
                        );
                    } else if task.mode == models::task::LifecycleMode::Persistent {
                        println!("{} is persistent and never dies", task.title.bold());
                    } else {
                        println!("{} has no lifespan to extend", task.title.bold());
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Delete { task }) => {
            let parameters = DeleteTaskParameters { reference: task };
            match delete_task(&mut store, &storage, parameters, now) {
                Ok(task) => println!("Deleted {}", task.title.bold()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Show { task }) => match resolve_task(&store, &task, TaskPool::All, now) {
            Ok(task) => ui::render_task_detail(task, &store, now),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Edit {
            task,
            title,
            notes,
            deadline,
            category,
            no_category,
        }) => {
            let category = if no_category {
                CategoryEdit::Clear
            } else {
                match category {
                    Some(name) => CategoryEdit::Assign(name),
                    None => CategoryEdit::Keep,
                }
            };
            let parameters = EditTaskParameters {
                reference: task,
                title,
                notes,
                deadline,
                category,
            };
            match edit_task(&mut store, &storage, parameters, now) {
                Ok(task) => println!("Updated {}", task.title.bold()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Category(CategoryCommands::New { name, color })) => {
            let color = match color {
                Some(name) => match Color::from_name(&name) {
                    Some(color) => Some(color),
                    None => {
                        eprintln!(
                            "Error: Unknown color '{}'. Available: {}",
                            name,
                            models::category::PALETTE
                                .iter()
                                .map(|c| c.name())
                                .collect::<Vec<_>>()
                                .join(", ")
                        );
                        std::process::exit(1);
                    }
                },
                None => None,
            };
            let parameters = CreateCategoryParameters { name, color };
            match create_category(&mut store, &storage, parameters) {
                Ok(category) => println!(
                    "Created category {} {}",
                    ui::category_dot(Some(&category)),
                    category.name.bold()
                ),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Category(CategoryCommands::Delete { name })) => {
            let parameters = DeleteCategoryParameters { name };
            match delete_category(&mut store, &storage, parameters) {
                Ok(category) => println!(
                    "Deleted category {}; its tasks are now uncategorized",
                    category.name.bold()
                ),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Category(CategoryCommands::List)) => {
            if store.categories.is_empty() {
                println!("No categories");
            } else {
                ui::render_view_header("Categories", store.categories.len());
                let mut categories: Vec<_> = store.categories.iter().collect();
                categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
                for category in categories {
                    let task_count = store.tasks_in_category(category.id).count();
                    ui::render_category_line(category, task_count);
                }
                println!();
            }
        }
    }
}

/// Resolves the user's category selection to canonical names and renders
/// one view of the task list.
fn render_list(
    store: &Store,
    show_dead: bool,
    categories: &[String],
    sort: SortKey,
    order: SortOrder,
    now: Timestamp,
) {
    let mut selected_names = BTreeSet::new();
    for name in categories {
        match store.get_category_by_name(name) {
            Some(category) => {
                selected_names.insert(category.name.clone());
            }
            None => {
                eprintln!("Error: Category '{}' not found", name);
                std::process::exit(1);
            }
        }
    }

    let visible = filter_and_sort(store, show_dead, &selected_names, sort, order, now);
    let title = if show_dead { "Dead" } else { "Living" };

    ui::render_view_header(title, visible.len());
    if visible.is_empty() {
        ui::render_empty_state(show_dead, !selected_names.is_empty());
    } else {
        for task in &visible {
            ui::render_task_line(task, store, show_dead, now);
        }
    }
    println!();
}
