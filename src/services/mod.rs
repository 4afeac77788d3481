// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod compare;
pub mod curve;
pub mod generation;
pub mod power;
pub mod strava;

pub use compare::{compare_curves, CurveComparison, CurvePoint};
pub use curve::{ActivityCandidate, ActivitySource, CurveAggregator, CurveRun};
pub use generation::CurveService;
pub use power::rolling_max_average;
pub use strava::{StravaActivitySource, StravaClient, StravaSession};
