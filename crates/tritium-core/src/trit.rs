//! The three-valued logic domain.
//!
//! A [`Trit`] is FALSE, UNKNOWN or TRUE, encoded as `-1`, `0` and `1`.
//! With that encoding Kleene's strong three-valued logic reduces to
//! integer arithmetic: AND is `min`, OR is `max`, NOT is negation.

use std::fmt;

/// A ternary truth value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i8)]
pub enum Trit {
    /// Definitely false (`-1`).
    False = -1,
    /// Unknown / maybe (`0`).
    #[default]
    Unknown = 0,
    /// Definitely true (`1`).
    True = 1,
}

impl Trit {
    /// All three values in encoding order.
    pub const ALL: [Trit; 3] = [Trit::False, Trit::Unknown, Trit::True];

    /// The `i8` encoding of this value.
    #[inline]
    pub const fn as_i8(self) -> i8 {
        self as i8
    }

    /// The encoding as an `f64` (`-1.0`, `0.0` or `1.0`).
    #[inline]
    pub const fn as_f64(self) -> f64 {
        self as i8 as f64
    }

    /// Decode an `i8`, returning `None` for anything outside `{-1, 0, 1}`.
    #[inline]
    pub const fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Self::False),
            0 => Some(Self::Unknown),
            1 => Some(Self::True),
            _ => None,
        }
    }

    /// Map any `i8` onto its sign.
    #[inline]
    pub const fn from_signum(value: i8) -> Self {
        if value > 0 {
            Self::True
        } else if value < 0 {
            Self::False
        } else {
            Self::Unknown
        }
    }

    /// Kleene conjunction: `min(a, b)`.
    #[inline]
    pub fn and(self, other: Self) -> Self {
        self.min(other)
    }

    /// Kleene disjunction: `max(a, b)`.
    #[inline]
    pub fn or(self, other: Self) -> Self {
        self.max(other)
    }

    /// Kleene negation. UNKNOWN stays UNKNOWN.
    #[inline]
    pub const fn not(self) -> Self {
        match self {
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
            Self::True => Self::False,
        }
    }

    /// Whether this value is TRUE or FALSE.
    #[inline]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<Trit> for i8 {
    fn from(t: Trit) -> i8 {
        t.as_i8()
    }
}

impl TryFrom<i8> for Trit {
    type Error = i8;

    /// Fails with the offending byte when it is not a valid encoding.
    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Trit::from_i8(value).ok_or(value)
    }
}

impl From<bool> for Trit {
    fn from(b: bool) -> Self {
        if b {
            Self::True
        } else {
            Self::False
        }
    }
}

impl fmt::Display for Trit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::False => 'F',
            Self::Unknown => '?',
            Self::True => 'T',
        };
        write!(f, "{c}")
    }
}
