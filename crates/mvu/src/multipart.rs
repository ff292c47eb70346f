use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderMap},
};
use form::{FilePart, MultipartForm};
use multer::{Constraints, SizeLimit};
use tracing::trace;

use crate::error::DispatchError;

const FORM_DATA: &str = "multipart/form-data";

/// The media type of `headers`' content type, without parameters.
pub(crate) fn media_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .unwrap_or_default()
}

/// Reads a `multipart/form-data` body into memory. The whole stream may not
/// exceed `max_memory` bytes.
pub(crate) async fn read_form(
    headers: &HeaderMap,
    body: Body,
    max_memory: u64,
) -> Result<MultipartForm, DispatchError> {
    let media_type = media_type(headers);
    if !media_type.eq_ignore_ascii_case(FORM_DATA) {
        return Err(DispatchError::UnsupportedContentType(media_type.to_string()));
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type).map_err(DispatchError::Multipart)?;
    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(max_memory));
    let mut multipart =
        multer::Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut form = MultipartForm::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(DispatchError::Multipart)?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            trace!("skipping unnamed multipart field");
            continue;
        };

        match field.file_name().map(str::to_owned) {
            Some(file_name) => {
                let content_type = field.content_type().map(|mime| mime.to_string());
                let data = field.bytes().await.map_err(|source| DispatchError::FileRead {
                    field: name.clone(),
                    source,
                })?;
                form.push_file(
                    name,
                    FilePart {
                        file_name: Some(file_name),
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let value = field.text().await.map_err(DispatchError::Multipart)?;
                form.push_value(name, value);
            }
        }
    }

    Ok(form)
}
