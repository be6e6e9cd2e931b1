// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;

use mpbridge_core::check;

/// Stream time in microseconds.
///
/// The eight values at either end of the `i64` range are reserved markers
/// (see the associated constants); everything between [`Timestamp::MIN`]
/// and [`Timestamp::MAX`] is an ordinary range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

/// Selector for the reserved timestamps, as numbered on the C surface.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialTimestamp {
    Unset = 0,
    Unstarted = 1,
    PreStream = 2,
    Min = 3,
    Max = 4,
    PostStream = 5,
    OneOverPostStream = 6,
    Done = 7,
}

impl SpecialTimestamp {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Unset),
            1 => Some(Self::Unstarted),
            2 => Some(Self::PreStream),
            3 => Some(Self::Min),
            4 => Some(Self::Max),
            5 => Some(Self::PostStream),
            6 => Some(Self::OneOverPostStream),
            7 => Some(Self::Done),
            _ => None,
        }
    }

    pub fn timestamp(self) -> Timestamp {
        match self {
            Self::Unset => Timestamp::UNSET,
            Self::Unstarted => Timestamp::UNSTARTED,
            Self::PreStream => Timestamp::PRE_STREAM,
            Self::Min => Timestamp::MIN,
            Self::Max => Timestamp::MAX,
            Self::PostStream => Timestamp::POST_STREAM,
            Self::OneOverPostStream => Timestamp::ONE_OVER_POST_STREAM,
            Self::Done => Timestamp::DONE,
        }
    }
}

impl Timestamp {
    pub const UNITS_PER_SECOND: f64 = 1_000_000.0;

    pub const UNSET: Timestamp = Timestamp(i64::MIN);
    pub const UNSTARTED: Timestamp = Timestamp(i64::MIN + 1);
    pub const PRE_STREAM: Timestamp = Timestamp(i64::MIN + 2);
    pub const MIN: Timestamp = Timestamp(i64::MIN + 3);
    pub const MAX: Timestamp = Timestamp(i64::MAX - 3);
    pub const POST_STREAM: Timestamp = Timestamp(i64::MAX - 2);
    pub const ONE_OVER_POST_STREAM: Timestamp = Timestamp(i64::MAX - 1);
    pub const DONE: Timestamp = Timestamp(i64::MAX);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Rounds to the nearest microsecond.
    pub fn from_seconds(seconds: f64) -> Self {
        Self((seconds * Self::UNITS_PER_SECOND).round() as i64)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn microseconds(self) -> i64 {
        self.0
    }

    pub fn seconds(self) -> f64 {
        self.0 as f64 / Self::UNITS_PER_SECOND
    }

    pub fn is_special_value(self) -> bool {
        self <= Self::MIN || self >= Self::MAX
    }

    pub fn is_range_value(self) -> bool {
        Self::MIN <= self && self <= Self::MAX
    }

    pub fn is_allowed_in_stream(self) -> bool {
        self != Self::UNSET
            && self != Self::UNSTARTED
            && self != Self::ONE_OVER_POST_STREAM
            && self != Self::DONE
    }

    /// Smallest timestamp a stream may carry after `self`.
    ///
    /// Aborts for `UNSET` and `UNSTARTED`, which have no successor.
    pub fn next_allowed_in_stream(self) -> Self {
        if self >= Self::MAX || self == Self::PRE_STREAM {
            return Self::ONE_OVER_POST_STREAM;
        }
        self.offset(1)
    }

    /// Largest timestamp a stream may carry before `self`.
    pub fn previous_allowed_in_stream(self) -> Self {
        if self <= Self::MIN || self == Self::POST_STREAM {
            return Self::UNSTARTED;
        }
        self.offset(-1)
    }

    fn offset(self, by: i64) -> Self {
        check!(
            self.is_range_value(),
            "cannot offset special timestamp {}",
            self.debug_string()
        );
        Self(self.0 + by)
    }

    pub fn debug_string(self) -> String {
        let name = match self {
            Self::UNSET => "Timestamp::Unset()",
            Self::UNSTARTED => "Timestamp::Unstarted()",
            Self::PRE_STREAM => "Timestamp::PreStream()",
            Self::MIN => "Timestamp::Min()",
            Self::MAX => "Timestamp::Max()",
            Self::POST_STREAM => "Timestamp::PostStream()",
            Self::ONE_OVER_POST_STREAM => "Timestamp::OneOverPostStream()",
            Self::DONE => "Timestamp::Done()",
            Self(value) => return value.to_string(),
        };
        name.to_string()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::UNSET
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions() {
        let ts = Timestamp::new(1_500_000);
        assert_eq!(ts.microseconds(), 1_500_000);
        assert_eq!(ts.seconds(), 1.5);
        assert_eq!(Timestamp::from_seconds(2.0000004), Timestamp::new(2_000_000));
    }

    #[test]
    fn special_values() {
        assert!(Timestamp::UNSET.is_special_value());
        assert!(Timestamp::MIN.is_special_value());
        assert!(Timestamp::MAX.is_special_value());
        assert!(!Timestamp::new(0).is_special_value());

        assert!(Timestamp::MIN.is_range_value());
        assert!(!Timestamp::PRE_STREAM.is_range_value());

        assert!(Timestamp::PRE_STREAM.is_allowed_in_stream());
        assert!(Timestamp::POST_STREAM.is_allowed_in_stream());
        assert!(!Timestamp::DONE.is_allowed_in_stream());
        assert!(!Timestamp::UNSET.is_allowed_in_stream());
    }

    #[test]
    fn stream_neighbours() {
        assert_eq!(Timestamp::new(10).next_allowed_in_stream(), Timestamp::new(11));
        assert_eq!(
            Timestamp::PRE_STREAM.next_allowed_in_stream(),
            Timestamp::ONE_OVER_POST_STREAM
        );
        assert_eq!(
            Timestamp::MAX.next_allowed_in_stream(),
            Timestamp::ONE_OVER_POST_STREAM
        );
        assert_eq!(Timestamp::new(10).previous_allowed_in_stream(), Timestamp::new(9));
        assert_eq!(
            Timestamp::POST_STREAM.previous_allowed_in_stream(),
            Timestamp::UNSTARTED
        );
        assert_eq!(Timestamp::UNSET.previous_allowed_in_stream(), Timestamp::UNSTARTED);
    }

    #[test]
    fn debug_strings() {
        assert_eq!(Timestamp::new(-42).debug_string(), "-42");
        assert_eq!(Timestamp::UNSET.debug_string(), "Timestamp::Unset()");
        assert_eq!(Timestamp::DONE.to_string(), "Timestamp::Done()");
        assert_eq!(
            SpecialTimestamp::from_raw(5).map(SpecialTimestamp::timestamp),
            Some(Timestamp::POST_STREAM)
        );
        assert_eq!(SpecialTimestamp::from_raw(8), None);
    }
}
