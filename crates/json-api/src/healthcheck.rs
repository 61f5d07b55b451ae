//! Shopsync JSON API Healthcheck Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, state::State};

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `degraded` once background jobs have been dropped
    pub status: String,

    /// Modules served by the delta feed
    pub modules: Vec<String>,

    /// Event publishes and marker writes lost to a full or closed queue
    pub dropped_jobs: u64,
}

/// Healthcheck handler
///
/// Dropped background jobs mean subscribers missed events and have to catch
/// up through the delta feed, so they degrade the reported status.
#[endpoint(tags("health"), summary = "Health check endpoint")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<HealthResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let dropped_jobs = state.dispatcher.stats().dropped;

    Ok(Json(HealthResponse {
        status: if dropped_jobs == 0 { "ok" } else { "degraded" }.to_string(),
        modules: state
            .modules
            .modules()
            .into_iter()
            .map(str::to_string)
            .collect(),
        dropped_jobs,
    }))
}
