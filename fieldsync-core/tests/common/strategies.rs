// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;

use fieldsync_core::EventType;

/// Strategy for known and free-form event type tags.
pub fn event_type_strategy() -> impl Strategy<Value = EventType> {
    prop_oneof![
        Just(EventType::Attendance),
        Just(EventType::Checklist),
        Just(EventType::Panic),
        Just(EventType::GpsPing),
        "[a-z][a-z_]{2,15}".prop_map(EventType::from),
    ]
}

/// Strategy for JSON object payloads with string and number members.
pub fn json_payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..6).prop_map(|fields| {
        let members: Vec<String> = fields
            .iter()
            .map(|(k, v)| format!(r#""{}": {}"#, k, v))
            .collect();
        format!("{{ {} }}", members.join(", ")).into_bytes()
    })
}

/// Strategy for valid (latitude, longitude) pairs.
pub fn coordinate_strategy() -> impl Strategy<Value = (f64, f64)> {
    (-90.0f64..=90.0, -180.0f64..=180.0)
}
