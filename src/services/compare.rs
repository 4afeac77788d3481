// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Side-by-side curve alignment for display.

use crate::models::PowerCurve;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurvePoint {
    pub duration_secs: u32,
    pub watts: f64,
}

/// Two curves as duration-sorted point sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurveComparison {
    pub mine: Vec<CurvePoint>,
    /// Empty when there is nothing to compare against
    pub other: Vec<CurvePoint>,
}

/// Points of one curve, ascending by duration (the `BTreeMap` key order).
pub fn curve_points(curve: &PowerCurve) -> Vec<CurvePoint> {
    curve
        .watts
        .iter()
        .map(|(&duration_secs, &watts)| CurvePoint {
            duration_secs,
            watts,
        })
        .collect()
}

/// Align `mine` and an optional `other` curve for plotting.
///
/// Each curve is rendered from its own durations; differing coverage is
/// neither interpolated nor rejected.
pub fn compare_curves(mine: &PowerCurve, other: Option<&PowerCurve>) -> CurveComparison {
    CurveComparison {
        mine: curve_points(mine),
        other: other.map(curve_points).unwrap_or_default(),
    }
}
