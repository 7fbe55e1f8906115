use colored::*;
use jiff::{SignedDuration, Timestamp, Zoned, tz::TimeZone};

use crate::models::{category::Category, category::Color as CategoryColor, store::Store, task::Task};

const MINUTE: i64 = 60;
const HOUR: i64 = 3600;
const DAY: i64 = 86400;
const WEEK: i64 = 604800;
const MONTH: i64 = 2592000; // approx 30 days

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

fn terminal_color(color: CategoryColor) -> Color {
    match color {
        CategoryColor::Blue => Color::Blue,
        CategoryColor::Green => Color::Green,
        CategoryColor::Orange => Color::TrueColor { r: 255, g: 165, b: 0 },
        CategoryColor::Pink => Color::TrueColor { r: 255, g: 105, b: 180 },
        CategoryColor::Purple => Color::Magenta,
        CategoryColor::Red => Color::Red,
        CategoryColor::Teal => Color::TrueColor { r: 0, g: 128, b: 128 },
        CategoryColor::Yellow => Color::Yellow,
        CategoryColor::Indigo => Color::TrueColor { r: 75, g: 0, b: 130 },
        CategoryColor::Mint => Color::BrightGreen,
        CategoryColor::Cyan => Color::Cyan,
        CategoryColor::Brown => Color::TrueColor { r: 139, g: 69, b: 19 },
        CategoryColor::Gray => Color::BrightBlack,
    }
}

/// Colored dot for a task's category; a dimmed hollow dot when it has none.
pub fn category_dot(category: Option<&Category>) -> ColoredString {
    match category {
        Some(category) => "●".color(terminal_color(category.color)),
        None => "○".dimmed(),
    }
}

/// Glyph tracking how far through its lifespan a living task is.
pub fn decay_glyph(progress: f64) -> ColoredString {
    if progress < 0.25 {
        "○".normal()
    } else if progress < 0.5 {
        "◔".normal()
    } else if progress < 0.75 {
        "◑".yellow()
    } else {
        "◕".red()
    }
}

/// Formats a duration with the largest unit and at most one remainder unit
/// (e.g., "2 days, 3 hrs"); sub-hour durations shrink to minutes.
pub fn format_span(duration: SignedDuration) -> String {
    fn unit(value: i64, singular: &str, plural: &str) -> String {
        let word = if value == 1 { singular } else { plural };
        format!("{value} {word}")
    }

    let secs = duration.as_secs().abs();

    let months = secs / MONTH;
    let weeks = secs / WEEK;
    let days = secs / DAY;
    let hours = secs / HOUR;
    let minutes = secs / MINUTE;

    if months > 0 {
        let remainder_weeks = (secs - months * MONTH) / WEEK;
        if remainder_weeks > 0 {
            format!(
                "{}, {}",
                unit(months, "month", "months"),
                unit(remainder_weeks, "week", "weeks")
            )
        } else {
            unit(months, "month", "months")
        }
    } else if weeks > 0 {
        let remainder_days = (secs - weeks * WEEK) / DAY;
        if remainder_days > 0 {
            format!(
                "{}, {}",
                unit(weeks, "week", "weeks"),
                unit(remainder_days, "day", "days")
            )
        } else {
            unit(weeks, "week", "weeks")
        }
    } else if days > 0 {
        let remainder_hours = (secs - days * DAY) / HOUR;
        if remainder_hours > 0 {
            format!(
                "{}, {}",
                unit(days, "day", "days"),
                unit(remainder_hours, "hr", "hrs")
            )
        } else {
            unit(days, "day", "days")
        }
    } else if hours > 0 {
        let remainder_minutes = (secs - hours * HOUR) / MINUTE;
        if remainder_minutes > 0 {
            format!(
                "{}, {}",
                unit(hours, "hr", "hrs"),
                unit(remainder_minutes, "min", "mins")
            )
        } else {
            unit(hours, "hr", "hrs")
        }
    } else if minutes > 0 {
        unit(minutes, "min", "mins")
    } else {
        String::from("less than a min")
    }
}

/// Formats a deadline relative to `now` (e.g., "Dead in 2 hrs, 30 mins").
pub fn relative_deadline(deadline: Timestamp, now: Timestamp) -> String {
    let remaining = deadline.duration_since(now);
    if remaining.is_positive() {
        if remaining < SignedDuration::from_hours(1) {
            String::from("Dead soon")
        } else {
            format!("Dead in {}", format_span(remaining))
        }
    } else {
        format!("Dead for {}", format_span(remaining))
    }
}

/// Formats a lifespan (e.g., "Lived for 2 days, 3 hrs")
pub fn formatted_lifespan(lifespan: SignedDuration) -> String {
    format!("Lived for {}", format_span(lifespan))
}

/// Formats a timestamp in the system time zone (e.g., "Dec 12, 2025 at 15:45")
pub fn formatted_date(timestamp: Timestamp) -> String {
    let zoned = Zoned::new(timestamp, TimeZone::system());
    zoned.strftime("%b %d, %Y at %H:%M").to_string()
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let task_word = if count == 1 { "task" } else { "tasks" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, task_word);
}

/// Render a single task line: number, decay glyph, category dot, title, and
/// a right-aligned deadline (living view) or lifespan (dead view).
pub fn render_task_line(task: &Task, store: &Store, show_dead: bool, now: Timestamp) {
    let terminal_width = get_terminal_width();

    let id_str = format!("{:>3}", task.task_number);
    let glyph = if show_dead {
        "✝".dimmed()
    } else {
        decay_glyph(task.decay_progress(now))
    };
    let dot = category_dot(task.category_id.and_then(|id| store.get_category(id)));
    let title = &task.title;

    let left_section = format!("  {}  {}  {} {}", id_str, glyph, dot, title);
    let styled_left = if show_dead {
        left_section.dimmed()
    } else {
        left_section.bold()
    };

    let right_section = if show_dead {
        formatted_lifespan(task.lifespan)
    } else {
        relative_deadline(task.deadline(), now)
    };

    // Visible lengths, without ANSI codes
    let left_visible_len = format!("  {}  {}  {} {}", id_str, " ", " ", title)
        .chars()
        .count();
    let right_visible_len = right_section.chars().count();

    let total_content = left_visible_len + right_visible_len;
    if total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!("{}{}{}", styled_left, " ".repeat(padding), right_section.dimmed());
    } else {
        // Not enough space for right alignment, just print normally
        println!("{}", styled_left);
    }
}

/// Hint shown when a view comes up empty.
pub fn render_empty_state(show_dead: bool, has_category_filter: bool) {
    if has_category_filter {
        println!("  {}", "No tasks match the selected categories.".dimmed());
        println!("  {}", "Drop the --category flags to see everything.".dimmed());
    } else if show_dead {
        println!("  {}", "Nothing has died. Yet.".dimmed());
    } else {
        println!("  {}", "No living tasks. Add one with `wilt add <title>`.".dimmed());
    }
}

/// Full detail view for a single task.
pub fn render_task_detail(task: &Task, store: &Store, now: Timestamp) {
    let category = task.category_id.and_then(|id| store.get_category(id));

    println!("\n  {}", task.title.bold());
    println!();

    let status = if !task.is_alive(now) {
        "Dead".red().to_string()
    } else if task.killed_at.is_none() && task.decay_progress(now) >= 0.75 {
        "Dying".yellow().to_string()
    } else {
        "Living".green().to_string()
    };
    render_info_row("Status", &status);

    let category_value = match category {
        Some(category) => format!("{} {}", category_dot(Some(category)), category.name),
        None => String::from("None"),
    };
    render_info_row("Category", &category_value);
    render_info_row("Created", &formatted_date(task.created_at));
    render_info_row("Deadline", &formatted_date(task.deadline()));
    render_info_row("Lifespan", &format_span(task.lifespan));
    render_info_row(
        "Decay",
        &format!("{:.0}%", task.decay_progress(now) * 100.0),
    );

    if let Some(notes) = &task.notes {
        println!();
        println!("  {}", notes.dimmed());
    }
    println!();
}

fn render_info_row(label: &str, value: &str) {
    println!("  {:<10} {}", label.dimmed(), value);
}

/// One line per category with its dot, name, and how many tasks use it.
pub fn render_category_line(category: &Category, task_count: usize) {
    let task_word = if task_count == 1 { "task" } else { "tasks" };
    println!(
        "  {} {}  {}",
        category_dot(Some(category)),
        category.name.bold(),
        format!("{} {}", task_count, task_word).dimmed()
    );
}
