//! Name management using string interning for efficient storage and comparison
//!
//! This module provides the [`Id`] type used for tag and tier names with an
//! efficient string-interner based approach.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient name storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

/// Efficient name type using string interning
///
/// Tag names (`"Word"`, `"Phone"`) and tier names are compared constantly
/// while relating tiers; interning makes those comparisons symbol equality
/// rather than string equality.
///
/// # Examples
///
/// ```
/// use tieralign_core::identifier::Id;
///
/// let word = Id::new("Word");
/// let phone = Id::new("Phone");
///
/// assert_ne!(word, phone);
/// assert_eq!(word, "Word");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Examples
    ///
    /// ```
    /// use tieralign_core::identifier::Id;
    ///
    /// let tier_name = Id::new("Word");
    /// ```
    pub fn new(name: &str) -> Self {
        let mut interner = INTERNER
            .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
            .lock()
            .expect("Failed to acquire interner lock");
        let symbol = interner.get_or_intern(name);
        Self(symbol)
    }

    /// Resolves the interned name back to an owned string.
    pub fn resolve(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = INTERNER
            .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
            .lock()
            .expect("Failed to acquire interner lock");
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        write!(f, "{}", str_value)
    }
}

impl From<&str> for Id {
    /// Creates an `Id` from a string slice
    ///
    /// This is a convenience implementation that calls `Id::new`.
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        let interner = INTERNER
            .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
            .lock()
            .expect("Failed to acquire interner lock");
        let self_str = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        self_str == other
    }
}

impl PartialEq<&str> for Id {
    /// Allows direct comparison with string references: `id == &string`
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
