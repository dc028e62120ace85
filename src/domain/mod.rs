pub mod deck;
pub mod progress;

pub use deck::{Card, Deck, NewCard};
pub use progress::{
  format_timestamp, normalize_progress_state, parse_timestamp, ProgressRecord, ReviewState,
  DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR,
};
