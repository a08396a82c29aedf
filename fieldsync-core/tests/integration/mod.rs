// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration Tests for Fieldsync Core
//!
//! These tests walk complete field workflows: recording while offline,
//! reconnecting, draining, and restarting the app in between.
//!
//! Run with: cargo test --test integration

#[path = "../common/mod.rs"]
mod common;

mod offline_workflow_test;
mod restart_workflow_test;
