// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod power_curve;
pub mod user;

pub use power_curve::{round_watts, PowerCurve, StoredPowerCurve, DURATIONS};
pub use user::{User, UserSummary};
