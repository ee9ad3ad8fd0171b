//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod admin;
pub mod frame;
pub mod health;
pub mod matching;

pub use crate::state::AppState;
pub use admin::{get_gps_filter, set_gps_filter, GpsFilterRequest, GpsFilterResponse};
pub use frame::frame_handler;
pub use health::{health, HealthResponse};
pub use matching::{match_handler, ExtrasDto, MatchResponse, NewAnnotationDto, ResultDto};
