use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifespan granted to a task created without an explicit deadline.
pub const DEFAULT_LIFESPAN: SignedDuration = SignedDuration::from_hours(24);

#[derive(Serialize, Deserialize, Default, Clone)]
pub struct Task {
    /// UUID to identify the task
    pub id: Uuid,
    /// User-facing auto-incremental task number
    pub task_number: u64,
    /// Title of the task
    pub title: String,
    /// Notes of the task
    pub notes: Option<String>,
    /// The category of this task if it belongs to any (weak reference)
    pub category_id: Option<Uuid>,
    /// Whether the task participates in the normal decay lifecycle
    pub mode: LifecycleMode,
    /// When the task was created
    pub created_at: Timestamp,
    /// Anchor the lifespan is measured from; equals `created_at` until the
    /// first revival, then the timestamp of the most recent revival
    pub revived_at: Timestamp,
    /// How long the task lives, measured from `revived_at`
    pub lifespan: SignedDuration,
    /// When the task was manually killed
    pub killed_at: Option<Timestamp>,
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum LifecycleMode {
    /// Dies at its deadline or when killed
    #[default]
    Normal,
    /// Exempt from decay: always alive, immune to kill and revive
    Persistent,
}

impl Task {
    /// The instant this task dies, derived from its anchor and lifespan.
    pub fn deadline(&self) -> Timestamp {
        // A SignedDuration operand saturates instead of erroring.
        self.revived_at
            .saturating_add(self.lifespan)
            .unwrap_or(Timestamp::MAX)
    }

    /// Whether the task is alive at `now`.
    ///
    /// Computed fresh on every call and never cached on the entity: the
    /// result can flip with nothing but wall-clock time passing. Callers
    /// must sample `now` once and reuse it across a whole pass so a single
    /// render never classifies the same instant two different ways.
    pub fn is_alive(&self, now: Timestamp) -> bool {
        if self.mode == LifecycleMode::Persistent {
            return true;
        }
        if self.killed_at.is_some() {
            return false;
        }
        now < self.deadline()
    }

    /// Fraction of the lifespan already elapsed at `now`, clamped to [0, 1].
    ///
    /// Presentation only; `is_alive` never consults it. A non-positive
    /// lifespan reads as fully decayed.
    pub fn decay_progress(&self, now: Timestamp) -> f64 {
        if self.lifespan <= SignedDuration::ZERO {
            return 1.0;
        }
        let elapsed = now.duration_since(self.revived_at);
        (elapsed.as_secs_f64() / self.lifespan.as_secs_f64()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_hours(hours: i64) -> Timestamp {
        Timestamp::UNIX_EPOCH + SignedDuration::from_hours(hours)
    }

    fn task_with_lifespan(hours: i64) -> Task {
        Task {
            title: String::from("Some Task"),
            created_at: at_hours(0),
            revived_at: at_hours(0),
            lifespan: SignedDuration::from_hours(hours),
            ..Task::default()
        }
    }

    #[test]
    fn test_alive_until_deadline_then_dead() {
        let task = Task {
            lifespan: DEFAULT_LIFESPAN,
            ..task_with_lifespan(0)
        };

        assert!(task.is_alive(at_hours(23)));
        assert!(!task.is_alive(at_hours(25)));
    }

    #[test]
    fn test_death_is_monotonic_without_revival() {
        let task = task_with_lifespan(10);

        assert!(!task.is_alive(at_hours(10)));
        for hours in 11..48 {
            assert!(!task.is_alive(at_hours(hours)));
        }
    }

    #[test]
    fn test_killed_task_is_dead_before_deadline() {
        let mut task = task_with_lifespan(10);
        task.killed_at = Some(at_hours(1));

        assert!(!task.is_alive(at_hours(2)));
    }

    #[test]
    fn test_persistent_task_ignores_deadline_and_kill_marker() {
        let mut task = task_with_lifespan(1);
        task.mode = LifecycleMode::Persistent;
        task.killed_at = Some(at_hours(1));

        assert!(task.is_alive(at_hours(1000)));
    }

    #[test]
    fn test_decay_progress_is_clamped() {
        let task = task_with_lifespan(10);

        assert_eq!(task.decay_progress(at_hours(0)), 0.0);
        assert_eq!(task.decay_progress(at_hours(5)), 0.5);
        assert_eq!(task.decay_progress(at_hours(20)), 1.0);
    }

    #[test]
    fn test_decay_progress_of_zero_lifespan_is_full() {
        let task = task_with_lifespan(0);

        assert_eq!(task.decay_progress(at_hours(0)), 1.0);
    }

    #[test]
    fn test_deadline_saturates_on_absurd_lifespans() {
        let mut task = task_with_lifespan(1);
        task.lifespan = SignedDuration::MAX;

        assert_eq!(task.deadline(), Timestamp::MAX);
        assert!(task.is_alive(at_hours(1_000_000)));
    }

    #[test]
    fn test_deadline_follows_the_anchor_not_creation() {
        let mut task = task_with_lifespan(10);
        task.revived_at = at_hours(4);

        assert_eq!(task.deadline(), at_hours(14));
        assert!(task.is_alive(at_hours(12)));
    }
}
