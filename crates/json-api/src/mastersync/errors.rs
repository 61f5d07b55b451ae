//! Master Sync Errors

use salvo::http::StatusError;
use tracing::error;

use shopsync_app::{mastersync::MasterSyncError, sync::RecordsServiceError};

pub(crate) fn feed_error(error: RecordsServiceError) -> StatusError {
    match error {
        RecordsServiceError::Validation(source) => StatusError::bad_request()
            .brief("Invalid master-sync request")
            .detail(source.to_string()),
        error => {
            error!("master-sync feed failure: {error}");

            StatusError::internal_server_error()
        }
    }
}

pub(crate) fn marker_error(error: MasterSyncError) -> StatusError {
    error!("master-sync marker failure: {error}");

    StatusError::internal_server_error()
}
