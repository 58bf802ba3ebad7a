use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tessera_core::models::RedemptionReceipt;
use tessera_core::AppError;
use tessera_ingest::DeclaredHeaders;

use crate::constants::CONTENT_MD5_HEADER;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Read the declared metadata from request headers.
///
/// Missing headers stay `None` so the validator decides which rule failed.
/// A header that is present but unreadable is rejected as invalid input.
pub(crate) fn declared_headers(headers: &HeaderMap) -> Result<DeclaredHeaders, AppError> {
    let text = |name: &str| -> Result<Option<String>, AppError> {
        headers
            .get(name)
            .map(|value| {
                value
                    .to_str()
                    .map(|s| s.trim().to_string())
                    .map_err(|_| AppError::InvalidInput(format!("{} header is not valid text", name)))
            })
            .transpose()
    };

    let content_length = text(header::CONTENT_LENGTH.as_str())?
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| {
                AppError::InvalidInput(format!("Content-Length '{}' is not a byte count", raw))
            })
        })
        .transpose()?;

    Ok(DeclaredHeaders {
        content_type: text(header::CONTENT_TYPE.as_str())?,
        content_length,
        checksum: text(CONTENT_MD5_HEADER)?,
    })
}

/// Redeem an upload ticket with the raw file bytes
#[utoipa::path(
    put,
    path = "/api/v0/uploads/{ticket_id}",
    tag = "uploads",
    params(
        ("ticket_id" = String, Path, description = "Upload ticket identifier"),
        ("Content-Type" = String, Header, description = "Must equal the ticket's declared content type"),
        ("Content-MD5" = String, Header, description = "MD5 of the body, base64 or hex"),
        ("Content-Length" = Option<u64>, Header, description = "Must not exceed the ticket's declared size")
    ),
    request_body(content = Vec<u8>, description = "Raw file bytes", content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "File stored and recorded", body = RedemptionReceipt),
        (status = 400, description = "Declared headers do not match the ticket", body = ErrorResponse),
        (status = 403, description = "Target path escapes the storage root", body = ErrorResponse),
        (status = 404, description = "Ticket absent, used or expired", body = ErrorResponse),
        (status = 409, description = "File record could not be committed", body = ErrorResponse),
        (status = 422, description = "Body could not be stored or failed verification", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(ticket_id = %ticket_id, operation = "redeem_upload"))]
pub async fn redeem_upload(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let declared = declared_headers(&headers)?;

    let receipt = state
        .pipeline
        .redeem(&ticket_id, declared, body.into_data_stream())
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_all_declared_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("11"));
        headers.insert(CONTENT_MD5_HEADER, HeaderValue::from_static(" XrY7u+Ae7tCTyyK7j1rNww== "));

        let declared = declared_headers(&headers).unwrap();

        assert_eq!(declared.content_type.as_deref(), Some("text/plain"));
        assert_eq!(declared.content_length, Some(11));
        assert_eq!(declared.checksum.as_deref(), Some("XrY7u+Ae7tCTyyK7j1rNww=="));
    }

    #[test]
    fn missing_headers_are_left_to_the_validator() {
        let declared = declared_headers(&HeaderMap::new()).unwrap();
        assert!(declared.content_type.is_none());
        assert!(declared.content_length.is_none());
        assert!(declared.checksum.is_none());
    }

    #[test]
    fn unparseable_content_length_is_invalid_input() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("eleven"));
        assert!(matches!(
            declared_headers(&headers),
            Err(AppError::InvalidInput(_))
        ));
    }
}
