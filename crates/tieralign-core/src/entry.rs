//! Flat entry value shapes exchanged with external TextGrid collaborators.
//!
//! This module defines the raw `(start, end, label)` and `(time, label)`
//! shapes that an external TextGrid reader supplies per tier and that a
//! writer accepts back, plus the [`Temporal`] tagged union carried by live
//! nodes and the single numeric tolerance used throughout validation and
//! lookup.
//!
//! The core is agnostic to how these entries were parsed from disk; they are
//! the entire input/output contract.

use serde::{Deserialize, Serialize};

/// Absolute tolerance used by [`times_close`].
pub const ABS_TOLERANCE: f64 = 1e-8;

/// Relative tolerance used by [`times_close`].
pub const REL_TOLERANCE: f64 = 1e-5;

/// Compares two times under the tolerance used for boundary alignment.
///
/// Real annotation data carries float noise from round-tripping through
/// text formats, so every boundary comparison (validation snugness, cleanup
/// gap detection, exact-start lookup ties) goes through this single
/// predicate rather than `==`.
///
/// # Examples
///
/// ```
/// use tieralign_core::entry::times_close;
///
/// assert!(times_close(0.5, 0.5));
/// assert!(times_close(0.5, 0.5 + 1e-9));
/// assert!(!times_close(0.5, 0.6));
/// ```
pub fn times_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ABS_TOLERANCE + REL_TOLERANCE * b.abs()
}

/// A raw labelled interval, as produced by an external TextGrid reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Annotation label.
    pub label: String,
}

impl Interval {
    /// Creates a new interval entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use tieralign_core::entry::Interval;
    ///
    /// let entry = Interval::new(0.0, 0.5, "the");
    /// assert_eq!(entry.duration(), 0.5);
    /// ```
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Returns the duration of the interval.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A raw labelled point, as produced by an external TextGrid reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Time in seconds.
    pub time: f64,
    /// Annotation label.
    pub label: String,
}

impl Point {
    /// Creates a new point entry.
    pub fn new(time: f64, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }
}

/// The temporal extent of a live node.
///
/// Interval-like and point-like nodes are distinguished by this explicit
/// discriminant rather than by probing for a `start` versus `time` field;
/// sorting and lookup code works uniformly through [`Temporal::key`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temporal {
    /// An interval extent with a start and end time.
    Interval {
        /// Start time in seconds.
        start: f64,
        /// End time in seconds.
        end: f64,
    },
    /// An instantaneous extent.
    Point {
        /// Time in seconds.
        time: f64,
    },
}

impl Temporal {
    /// The key used for temporal ordering: the start time for intervals,
    /// the time for points.
    pub fn key(&self) -> f64 {
        match *self {
            Temporal::Interval { start, .. } => start,
            Temporal::Point { time } => time,
        }
    }

    /// The start of the extent (a point starts at its time).
    pub fn start(&self) -> f64 {
        self.key()
    }

    /// The end of the extent (a point ends at its time).
    pub fn end(&self) -> f64 {
        match *self {
            Temporal::Interval { end, .. } => end,
            Temporal::Point { time } => time,
        }
    }

    /// The duration of the extent. Points have zero duration.
    pub fn duration(&self) -> f64 {
        self.end() - self.start()
    }

    /// Whether this is an interval extent.
    pub fn is_interval(&self) -> bool {
        matches!(self, Temporal::Interval { .. })
    }

    /// Whether this is a point extent.
    pub fn is_point(&self) -> bool {
        matches!(self, Temporal::Point { .. })
    }

    /// Translates the extent in time by `increment`.
    pub fn shift(&mut self, increment: f64) {
        match self {
            Temporal::Interval { start, end } => {
                *start += increment;
                *end += increment;
            }
            Temporal::Point { time } => *time += increment,
        }
    }
}

impl From<&Interval> for Temporal {
    fn from(entry: &Interval) -> Self {
        Temporal::Interval {
            start: entry.start,
            end: entry.end,
        }
    }
}

impl From<&Point> for Temporal {
    fn from(entry: &Point) -> Self {
        Temporal::Point { time: entry.time }
    }
}
