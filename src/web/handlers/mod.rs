// Route handlers, grouped by resource.

pub mod datasets;
pub mod model;
pub mod retrain;
pub mod scan;
pub mod scans;

use axum::extract::Multipart;

use super::error::ApiError;

/// Pull the first file field out of a multipart upload.
/// Returns the client-supplied filename and the raw bytes.
pub(crate) async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("Failed to read upload: {e}")))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(ApiError::InvalidInput("No file uploaded".to_string()))
}
