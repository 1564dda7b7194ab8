// In crates/web-server/src/types.rs

use dashboard::{ControlBounds, DashboardParams};
use serde::Serialize;

/// Body of `GET /api/controls`: everything the UI needs to draw its inputs.
#[derive(Debug, Serialize)]
pub struct ControlsResponse {
    pub bounds: ControlBounds,
    pub params: DashboardParams,
}

/// Every error response has this shape.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
