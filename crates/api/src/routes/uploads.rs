//! Request bodies that may carry image files.
//!
//! Catalog writes accept either plain JSON or `multipart/form-data` with the
//! JSON body in a text part (`category`, `product`) and images in file parts
//! (`image`, `images`). [`Submission`] reads both shapes.

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::models::StoredImage;
use crate::models::product::accept_image;

/// Largest request body accepted on upload routes.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// A JSON body plus any uploaded images, in upload order.
#[derive(Debug)]
pub struct Submission<T> {
    pub body: T,
    pub images: Vec<StoredImage>,
}

impl<T> Submission<T> {
    /// The first uploaded image, for resources with a single picture.
    pub fn first_image(self) -> (T, Option<StoredImage>) {
        (self.body, self.images.into_iter().next())
    }
}

impl<S, T> FromRequest<S> for Submission<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            read_multipart(multipart).await
        } else {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            Ok(Self {
                body,
                images: Vec::new(),
            })
        }
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

/// Parts with a file name are images; the text part is the JSON body.
/// Empty file parts, as browsers send for an untouched file input, are
/// skipped.
async fn read_multipart<T: DeserializeOwned>(
    mut multipart: Multipart,
) -> Result<Submission<T>, AppError> {
    let mut body: Option<T> = None;
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        if field.file_name().is_some() {
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            if data.is_empty() {
                continue;
            }
            images.push(accept_image(data.to_vec(), content_type).map_err(AppError::BadRequest)?);
        } else {
            let name = field.name().unwrap_or("body").to_string();
            let text = field
                .text()
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            body = Some(
                serde_json::from_str(&text)
                    .map_err(|e| AppError::bad_request(format!("Invalid {name} part: {e}")))?,
            );
        }
    }

    let body = body.ok_or_else(|| AppError::bad_request("Missing JSON part in upload"))?;
    Ok(Submission { body, images })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    fn multipart_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/api/categories")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=X-BOUNDARY")
            .body(Body::from(body.replace('\n', "\r\n")))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/categories")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Shoes"}"#))
            .unwrap();
        let submission = Submission::<Named>::from_request(req, &()).await.unwrap();
        assert_eq!(submission.body.name, "Shoes");
        assert!(submission.images.is_empty());
    }

    #[tokio::test]
    async fn test_multipart_body_with_image() {
        let req = multipart_request(
            "--X-BOUNDARY
Content-Disposition: form-data; name=\"category\"

{\"name\":\"Running\"}
--X-BOUNDARY
Content-Disposition: form-data; name=\"image\"; filename=\"run.png\"
Content-Type: image/png

PNGDATA
--X-BOUNDARY--
",
        );
        let submission = Submission::<Named>::from_request(req, &()).await.unwrap();
        assert_eq!(submission.body.name, "Running");
        assert_eq!(submission.images.len(), 1);
        assert_eq!(submission.images[0].data, b"PNGDATA");
        assert_eq!(submission.images[0].content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_multipart_rejects_non_image() {
        let req = multipart_request(
            "--X-BOUNDARY
Content-Disposition: form-data; name=\"category\"

{\"name\":\"Running\"}
--X-BOUNDARY
Content-Disposition: form-data; name=\"image\"; filename=\"notes.txt\"
Content-Type: text/plain

hello
--X-BOUNDARY--
",
        );
        let err = Submission::<Named>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("text/plain")));
    }

    #[tokio::test]
    async fn test_multipart_without_json_part() {
        let req = multipart_request(
            "--X-BOUNDARY
Content-Disposition: form-data; name=\"image\"; filename=\"run.png\"
Content-Type: image/png

PNGDATA
--X-BOUNDARY--
",
        );
        let err = Submission::<Named>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
