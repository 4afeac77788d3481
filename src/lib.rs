// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Power curve tracker: best sustained power per duration from Strava rides.
//!
//! This crate provides the backend API that pulls recent power streams from
//! Strava, merges them into one curve per athlete, stores it, and serves
//! side-by-side comparisons between athletes.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::CurveStore;
use services::StravaClient;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn CurveStore>,
    pub strava: StravaClient,
}
