//! Severity levels.
//!
//! Seven fixed levels, numerically ordered. Unlike `tracing`'s `Level`, which
//! is a closed, purely-numeric enum with no name lookup beyond `Display`,
//! `Level` here keeps the bidirectional int<->name mapping spec.md §4.1
//! requires (`name_of`/`level_of`), since callers may come from
//! configuration or serialized records where only the name is known.

use std::cmp::Ordering;
use std::fmt;

use crate::error::UnknownLevel;

/// A fixed, totally ordered severity. Comparison is numeric order.
///
/// `level_of(int)` is the identity: arbitrary integers are accepted as
/// thresholds even if they don't name one of the seven constants below, so
/// `Level` stores a plain `i32` rather than a closed enum.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(i32);

pub const NOTSET: Level = Level(0);
pub const DEBUG: Level = Level(1);
pub const INFO: Level = Level(2);
pub const NOTICE: Level = Level(3);
pub const WARNING: Level = Level(4);
pub const ERROR: Level = Level(5);
pub const CRITICAL: Level = Level(6);

const NAMED_LEVELS: &[(Level, &str)] = &[
    (NOTSET, "NOTSET"),
    (DEBUG, "DEBUG"),
    (INFO, "INFO"),
    (NOTICE, "NOTICE"),
    (WARNING, "WARNING"),
    (ERROR, "ERROR"),
    (CRITICAL, "CRITICAL"),
];

impl Level {
    /// Constructs a level from a raw integer. Unlike [`Level::from_name`],
    /// this never fails: arbitrary thresholds are legal (spec.md §4.1).
    pub const fn from_int(value: i32) -> Self {
        Level(value)
    }

    /// Looks a level up by its canonical name (case-sensitive, matching the
    /// original's `_reverse_level_names` table).
    pub fn from_name(name: &str) -> Result<Self, UnknownLevel> {
        NAMED_LEVELS
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(level, _)| *level)
            .ok_or_else(|| UnknownLevel::name(name))
    }

    /// The raw integer value.
    pub const fn as_int(self) -> i32 {
        self.0
    }

    /// The canonical name of this level, or an error if it isn't one of the
    /// seven fixed levels (spec.md §4.1: `name_of` is a total function over
    /// the fixed table, not over arbitrary integers).
    pub fn name(self) -> Result<&'static str, UnknownLevel> {
        NAMED_LEVELS
            .iter()
            .find(|(level, _)| *level == self)
            .map(|(_, name)| *name)
            .ok_or_else(|| UnknownLevel::value(self.0))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Ok(name) => f.pad(name),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({})", self)
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Level::from_int(value)
    }
}

impl PartialEq<i32> for Level {
    fn eq(&self, other: &i32) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<i32> for Level {
    fn partial_cmp(&self, other: &i32) -> Option<Ordering> {
        self.0.partial_cmp(other)
    }
}
