// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Removing the 360° → 0° discontinuity from a sampled longitude track.

use qtty::Degrees;

use crate::{Time, UT};

/// One longitude sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub instant: Time<UT>,
    pub longitude: Degrees,
}

impl Sample {
    pub fn new(instant: Time<UT>, longitude: Degrees) -> Self {
        Self { instant, longitude }
    }
}

/// A time-ordered track whose longitudes are non-decreasing.
///
/// Built once per scan window from raw `[0, 360)` samples. A drop from one
/// raw sample to the next is read as one full wrap, so the sampling step must
/// keep true motion between neighbours below 360°.
#[derive(Debug, Clone, PartialEq)]
pub struct UnwrappedTrack {
    samples: Vec<Sample>,
}

impl UnwrappedTrack {
    pub fn from_raw(raw: &[Sample]) -> Self {
        let mut offset = 0.0;
        let mut previous: Option<f64> = None;
        let samples = raw
            .iter()
            .map(|s| {
                let lon = s.longitude.value();
                if previous.is_some_and(|p| lon < p) {
                    offset += 360.0;
                }
                previous = Some(lon);
                Sample::new(s.instant, Degrees::new(lon + offset))
            })
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Smallest unwrapped longitude (the first sample).
    pub fn min(&self) -> Option<Degrees> {
        self.samples.first().map(|s| s.longitude)
    }

    /// Largest unwrapped longitude (the last sample).
    pub fn max(&self) -> Option<Degrees> {
        self.samples.last().map(|s| s.longitude)
    }

    /// Largest jump between consecutive samples.
    pub fn max_step(&self) -> Degrees {
        let widest = self
            .samples
            .windows(2)
            .map(|w| (w[1].longitude - w[0].longitude).value())
            .fold(0.0, f64::max);
        Degrees::new(widest)
    }

    /// First consecutive pair `(left, right)` with
    /// `left.longitude <= target <= right.longitude`.
    pub fn bracket(&self, target: Degrees) -> Option<(Sample, Sample)> {
        // first index whose longitude reaches the target
        let idx = self.samples.partition_point(|s| s.longitude < target);
        match idx {
            0 => match self.samples.get(..2) {
                Some([left, right]) if left.longitude == target => Some((*left, *right)),
                _ => None,
            },
            i if i < self.samples.len() => Some((self.samples[i - 1], self.samples[i])),
            _ => None,
        }
    }
}
