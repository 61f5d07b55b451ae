//! Sale Channel Errors

use salvo::http::StatusError;
use tracing::error;

use shopsync_app::sync::RecordsServiceError;

pub(crate) fn into_status_error(error: RecordsServiceError) -> StatusError {
    match error {
        RecordsServiceError::Validation(source) => StatusError::bad_request()
            .brief("Invalid sale channel payload")
            .detail(source.to_string()),
        RecordsServiceError::NotFound => StatusError::not_found().brief("Sale channel not found"),
        RecordsServiceError::DuplicateKey => {
            StatusError::conflict().brief("Sale channel code already exists")
        }
        RecordsServiceError::Store(source) => {
            error!("sale channel store failure: {source}");

            StatusError::internal_server_error()
        }
    }
}
