// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Closed time windows.
//!
//! A [`Period<S>`] bounds both the scanner's search window and an ephemeris
//! provider's coverage; clamping one to the other is an intersection.

use super::{Time, TimeScale};
use chrono::{DateTime, Utc};
use qtty::Days;
use std::fmt;

/// A window `[start, end]` on time scale `S`.
///
/// # Examples
///
/// ```
/// use ganji::{Period, Time, UT};
/// use qtty::Days;
///
/// let window = Period::new(Time::<UT>::new(2_460_000.0), Time::<UT>::new(2_460_010.0));
/// assert_eq!(window.duration(), Days::new(10.0));
/// assert!(window.contains(Time::<UT>::new(2_460_005.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period<S: TimeScale> {
    pub start: Time<S>,
    pub end: Time<S>,
}

impl<S: TimeScale> Period<S> {
    pub fn new(start: Time<S>, end: Time<S>) -> Self {
        Period { start, end }
    }

    /// `end - start`.
    pub fn duration(&self) -> Days {
        self.end - self.start
    }

    /// True when `start < end`.
    pub fn is_proper(&self) -> bool {
        self.start < self.end
    }

    pub fn contains(&self, instant: Time<S>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Overlap of two windows, or `None` when it is empty or a single point.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(Self::new(start, end))
        } else {
            None
        }
    }

    /// Pull both ends inwards by `margin`; the result may be improper.
    pub fn shrink(&self, margin: Days) -> Self {
        Self::new(self.start + margin, self.end - margin)
    }

    /// Push both ends outwards by `pad`.
    pub fn widen(&self, pad: Days) -> Self {
        Self::new(self.start - pad, self.end + pad)
    }

    /// Build a window from two UTC timestamps.
    pub fn from_utc(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(Time::from_utc(start), Time::from_utc(end))
    }

    /// Both ends as UTC timestamps, when representable.
    pub fn to_utc(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start.to_utc()?, self.end.to_utc()?))
    }
}

impl<S: TimeScale> fmt::Display for Period<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_utc() {
            Some((start, end)) => write!(
                f,
                "{} to {}",
                start.format("%Y-%m-%dT%H:%M:%SZ"),
                end.format("%Y-%m-%dT%H:%M:%SZ")
            ),
            None => write!(f, "{} to {}", self.start, self.end),
        }
    }
}
