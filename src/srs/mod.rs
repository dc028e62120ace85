pub mod queue;
pub mod requeue;
pub mod scheduler;

pub use queue::build_initial_queue;
pub use requeue::{requeue_card, REQUEUE_OFFSET};
pub use scheduler::{compute_next_review, is_due, quality_for, ReviewOutcome, MAX_INTERVAL_DAYS};
