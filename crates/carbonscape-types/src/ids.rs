//! Type-safe identifier wrappers for users and projection years.
//!
//! Both identifiers are opaque strings on the wire. The backend hands out
//! user ids at login/signup and keys every projection snapshot by a year
//! label such as `"2025"`. Wrapping them keeps a user id from ever being
//! passed where a year is expected.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw string value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw string value.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_string_id! {
    /// Identifier of an authenticated backend user.
    ///
    /// Opaque to the scene: it is only used to build request paths and to
    /// key the local projection cache.
    UserId
}

define_string_id! {
    /// Label of one projection year (e.g. `"2025"`).
    ///
    /// Labels order temporally: numeric labels compare numerically and sort
    /// before every non-numeric label; non-numeric labels compare
    /// lexicographically among themselves.
    YearLabel
}

impl YearLabel {
    /// Parse the label as a calendar year, if it is numeric.
    pub fn as_year(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }
}

impl PartialOrd for YearLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for YearLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_year(), other.as_year()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}
