//! Scheduling
//!
//! The engine only needs something that turns (config, previous snapshot,
//! rating) into the next difficulty/stability/due/state; that seam is the
//! [`Scheduler`] trait. [`IntervalScheduler`] is the bundled implementation,
//! an SM-2 style heuristic:
//!
//! - difficulty carries the ease factor (starts at 2.5, never below 1.3)
//! - stability carries the scheduled interval in days
//! - a lapse resets the interval and moves the reviewable to relearning

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::models::{
    Rating, ReviewConfig, ReviewState, ReviewableSnapshot, ScheduledState, MAX_INTERVAL_DAYS,
};

/// Computes the next scheduling state from a single rating
pub trait Scheduler {
    fn schedule(
        &self,
        config: &ReviewConfig,
        previous: Option<&ReviewableSnapshot>,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> ScheduledState;
}

/// Minimum ease factor allowed
const MIN_EASE_FACTOR: f64 = 1.3;

const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Delay before a failed reviewable is shown again when learning steps are on
const LEARNING_STEP_MINUTES: i64 = 10;

/// Intervals at least this long get fuzzed
const FUZZ_MIN_DAYS: f64 = 3.0;

const MINUTES_PER_DAY: f64 = 1440.0;

/// Map a rating to SM-2 quality (0-5)
pub fn rating_to_quality(rating: Rating) -> i32 {
    match rating {
        Rating::Again => 1, // incorrect but recognized
        Rating::Hard => 3,  // correct with difficulty
        Rating::Good => 4,  // correct with hesitation
        Rating::Easy => 5,  // perfect
        Rating::Manual => 3,
    }
}

/// Interval multiplier for a retention target; 90% is neutral
fn retention_modifier(retention: u8) -> f64 {
    let target = (retention.clamp(1, 99) as f64) / 100.0;
    target.ln() / 0.9f64.ln()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalScheduler;

impl Scheduler for IntervalScheduler {
    fn schedule(
        &self,
        config: &ReviewConfig,
        previous: Option<&ReviewableSnapshot>,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> ScheduledState {
        let quality = rating_to_quality(rating);
        let (mut ease_factor, interval, state) = match previous {
            Some(snapshot) => (snapshot.difficulty, snapshot.stability, snapshot.state),
            None => (INITIAL_EASE_FACTOR, 0.0, ReviewState::New),
        };

        let (days, next_state) = if quality >= 3 {
            let (days, next_state) = match state {
                ReviewState::New => (1.0, ReviewState::Learning),
                ReviewState::Learning => (6.0, ReviewState::Review),
                ReviewState::Relearning => (interval.max(1.0), ReviewState::Review),
                ReviewState::Review => (
                    (interval * ease_factor * retention_modifier(config.retention)).round(),
                    ReviewState::Review,
                ),
            };

            // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
            let q = (5 - quality) as f64;
            ease_factor = (ease_factor + (0.1 - q * (0.08 + q * 0.02))).max(MIN_EASE_FACTOR);

            (days, next_state)
        } else {
            ease_factor = (ease_factor - 0.2).max(MIN_EASE_FACTOR);
            let next_state = if state == ReviewState::Review {
                ReviewState::Relearning
            } else {
                ReviewState::Learning
            };

            if config.learning_enabled {
                let step = LEARNING_STEP_MINUTES as f64 / MINUTES_PER_DAY;
                return ScheduledState {
                    difficulty: ease_factor,
                    stability: step,
                    due: now + Duration::minutes(LEARNING_STEP_MINUTES),
                    state: next_state,
                };
            }

            (1.0, next_state)
        };

        // Unvalidated configs still must not push `due` past chrono's range
        let cap = config.max_interval.clamp(1, MAX_INTERVAL_DAYS) as f64;
        let mut days = days.clamp(1.0, cap);
        if config.due_fuzzed && days >= FUZZ_MIN_DAYS {
            days = (days * rand::thread_rng().gen_range(0.95..=1.05))
                .round()
                .clamp(1.0, cap);
        }

        let due = now
            .checked_add_signed(Duration::minutes((days * MINUTES_PER_DAY) as i64))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        ScheduledState {
            difficulty: ease_factor,
            stability: days,
            due,
            state: next_state,
        }
    }
}

/// The due date each answer would produce, for showing next to the buttons
pub fn preview_intervals(
    scheduler: &dyn Scheduler,
    config: &ReviewConfig,
    previous: Option<&ReviewableSnapshot>,
    now: DateTime<Utc>,
) -> [(Rating, DateTime<Utc>); 4] {
    Rating::ANSWERS.map(|rating| (rating, scheduler.schedule(config, previous, rating, now).due))
}

/// Format a span until a due date as a short human-readable string
pub fn format_interval(span: Duration) -> String {
    let minutes = span.num_minutes();
    if minutes <= 0 {
        return "now".to_string();
    }
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = span.num_hours();
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = span.num_days();
    if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
