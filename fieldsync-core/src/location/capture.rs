// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Location capture with a hard timeout.
//!
//! At most one provider call is outstanding per validator. Callers that
//! arrive while it runs (or after an earlier caller gave up on it) wait for
//! that same call instead of starting another thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::{HeuristicClassifier, LocationError, LocationSample, MockLocationClassifier};

/// A raw reading as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    /// Platform-level mock flag (e.g. a mock provider is active), when known.
    pub reported_mock: bool,
}

impl RawFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        RawFix {
            latitude,
            longitude,
            accuracy,
            reported_mock: false,
        }
    }
}

/// Platform GPS source.
///
/// `current_position` may block for as long as the platform takes; the
/// validator bounds the wait, not the provider.
pub trait LocationProvider: Send + Sync + 'static {
    fn current_position(&self) -> Result<RawFix, LocationError>;
}

/// Provider that always reports the same reading.
///
/// Useful for fixed posts (a guard desk without GPS) and for tests.
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    result: Result<RawFix, LocationError>,
}

impl StaticLocationProvider {
    pub fn new(fix: RawFix) -> Self {
        StaticLocationProvider { result: Ok(fix) }
    }

    pub fn failing(error: LocationError) -> Self {
        StaticLocationProvider { result: Err(error) }
    }
}

impl LocationProvider for StaticLocationProvider {
    fn current_position(&self) -> Result<RawFix, LocationError> {
        self.result.clone()
    }
}

type Reading = Result<RawFix, LocationError>;

#[derive(Default)]
struct CaptureSlot {
    generation: u64,
    /// Generation of the provider call still running, if any.
    in_flight: Option<u64>,
    /// Most recent answer and the generation that produced it.
    answer: Option<(u64, Reading)>,
}

#[derive(Default)]
struct CaptureState {
    slot: Mutex<CaptureSlot>,
    answered: Condvar,
}

impl CaptureState {
    fn publish(&self, generation: u64, reading: Reading) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.in_flight = None;
            slot.answer = Some((generation, reading));
        }
        self.answered.notify_all();
    }
}

fn poisoned<T>(_: T) -> LocationError {
    LocationError::Unavailable("location capture state poisoned".into())
}

/// Captures and classifies location samples.
pub struct LocationValidator {
    provider: Arc<dyn LocationProvider>,
    classifier: Arc<dyn MockLocationClassifier>,
    timeout: Duration,
    state: Arc<CaptureState>,
}

impl LocationValidator {
    /// Creates a validator using the heuristic classifier.
    pub fn new(provider: Arc<dyn LocationProvider>, timeout: Duration) -> Self {
        LocationValidator {
            provider,
            classifier: Arc::new(HeuristicClassifier),
            timeout,
            state: Arc::new(CaptureState::default()),
        }
    }

    /// Replaces the mock-location classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn MockLocationClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Obtains a location within the configured timeout.
    ///
    /// The provider runs on its own thread. If it does not answer in time the
    /// caller gets [`LocationError::Timeout`] and no state changes; the call
    /// keeps running and the next capture waits on it rather than starting
    /// another one.
    pub fn capture_location(&self) -> Result<LocationSample, LocationError> {
        let mut slot = self.state.slot.lock().map_err(poisoned)?;
        let generation = match slot.in_flight {
            Some(generation) => {
                debug!(generation, "joining location capture in flight");
                generation
            }
            None => {
                let generation = slot.generation + 1;
                self.spawn_provider_call(generation)?;
                slot.generation = generation;
                slot.in_flight = Some(generation);
                generation
            }
        };

        let (slot, wait) = self
            .state
            .answered
            .wait_timeout_while(slot, self.timeout, |s| {
                s.answer.as_ref().map_or(true, |(g, _)| *g < generation)
            })
            .map_err(poisoned)?;
        if wait.timed_out() {
            warn!(timeout_ms = self.timeout.as_millis() as u64, "location capture timed out");
            return Err(LocationError::Timeout(self.timeout));
        }

        let reading = slot.answer.as_ref().map(|(_, reading)| reading.clone());
        drop(slot);

        match reading {
            Some(Ok(fix)) => Ok(self.classify(fix)),
            Some(Err(e)) => {
                debug!(error = %e, "location provider failed");
                Err(e)
            }
            None => Err(LocationError::Unavailable(
                "location provider exited without a reading".into(),
            )),
        }
    }

    fn spawn_provider_call(&self, generation: u64) -> Result<(), LocationError> {
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);

        thread::Builder::new()
            .name("fieldsync-location".into())
            .spawn(move || {
                let reading = panic::catch_unwind(AssertUnwindSafe(|| provider.current_position()))
                    .unwrap_or_else(|_| {
                        Err(LocationError::Unavailable(
                            "location provider exited without a reading".into(),
                        ))
                    });
                state.publish(generation, reading);
            })
            .map(|_| ())
            .map_err(|e| LocationError::Unavailable(e.to_string()))
    }

    /// Builds a sample from a raw fix and flags it if suspect.
    pub fn classify(&self, fix: RawFix) -> LocationSample {
        let mut sample = LocationSample::new(fix.latitude, fix.longitude, fix.accuracy);
        sample.mock_location = fix.reported_mock || self.classifier.is_suspect(&sample);
        if sample.mock_location {
            warn!(
                latitude = sample.latitude,
                longitude = sample.longitude,
                accuracy = sample.accuracy,
                "location flagged as possible mock"
            );
        }
        sample
    }
}
