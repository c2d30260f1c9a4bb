//! ID generation utilities.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use ulid::{Generator, Ulid};

static GENERATOR: Mutex<Generator> = Mutex::new(Generator::new());

/// Longest user or post id accepted from outside; the id columns are this wide.
pub const MAX_EXTERNAL_ID_LEN: usize = 64;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// IDs are monotonic within the process, even inside one millisecond, which
    /// lets the repositories use them as `until_id` pagination cursors.
    #[must_use]
    pub fn generate(&self) -> String {
        next_ulid().to_string().to_lowercase()
    }

    /// Generate an ID together with the timestamp encoded in it.
    ///
    /// Rows stamped this way sort the same by id as by creation time.
    #[must_use]
    pub fn generate_stamped(&self) -> (String, DateTime<Utc>) {
        let ulid = next_ulid();
        (ulid.to_string().to_lowercase(), ulid.datetime().into())
    }
}

fn next_ulid() -> Ulid {
    GENERATOR
        .lock()
        .ok()
        .and_then(|mut generator| generator.generate().ok())
        .unwrap_or_else(Ulid::new)
}

/// Canonical key for an unordered user pair.
///
/// `pair_key(a, b) == pair_key(b, a)`; the store puts a unique index on it so only one
/// live follow request can exist between two users regardless of direction.
#[must_use]
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}
