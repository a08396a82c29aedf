// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Location Integrity
//!
//! Best-effort GPS capture for event payloads, a swappable mock-location
//! classifier, and great-circle distance for advisory geofence checks.
//! Location is optional metadata: nothing here ever blocks recording an event.

mod capture;
mod geofence;

pub use capture::{LocationProvider, LocationValidator, RawFix, StaticLocationProvider};
pub use geofence::{distance_meters, GeofenceCheck, Zone, EARTH_RADIUS_METERS};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coordinates closer than this (in degrees) to (0, 0) are treated as a
/// placeholder or injected value.
pub const NULL_ISLAND_EPSILON_DEGREES: f64 = 1e-3;

/// Location capture errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// No fix within the capture timeout.
    #[error("no location fix within {0:?}")]
    Timeout(Duration),

    /// The platform could not provide a location.
    #[error("location unavailable: {0}")]
    Unavailable(String),

    /// The user or OS denied location access.
    #[error("location permission denied")]
    PermissionDenied,
}

/// A captured, classified location reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
    /// Set when the reading looks artificially injected.
    pub mock_location: bool,
}

impl LocationSample {
    /// Creates an unclassified sample.
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        LocationSample {
            latitude,
            longitude,
            accuracy,
            mock_location: false,
        }
    }
}

/// Decides whether a sample is suspected to be mocked.
///
/// Implementations may use platform signals; the default is a cheap heuristic
/// with expected false negatives.
pub trait MockLocationClassifier: Send + Sync {
    /// Returns true if the sample should be flagged as suspect.
    fn is_suspect(&self, sample: &LocationSample) -> bool;
}

/// Flags physically impossible or placeholder readings.
///
/// A sample is suspect when its accuracy is exactly zero or when it sits
/// within [`NULL_ISLAND_EPSILON_DEGREES`] of (0, 0).
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl MockLocationClassifier for HeuristicClassifier {
    fn is_suspect(&self, sample: &LocationSample) -> bool {
        classify_mock_location(sample)
    }
}

/// Heuristic mock-location check used by [`HeuristicClassifier`].
pub fn classify_mock_location(sample: &LocationSample) -> bool {
    let zero_accuracy = sample.accuracy == 0.0;
    let null_island = sample.latitude.abs() < NULL_ISLAND_EPSILON_DEGREES
        && sample.longitude.abs() < NULL_ISLAND_EPSILON_DEGREES;
    zero_accuracy || null_island
}
