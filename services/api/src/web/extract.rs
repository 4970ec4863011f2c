//! services/api/src/web/extract.rs
//!
//! Request body extractor that reports malformed payloads through `ApiError`,
//! so they come back as a 400 with a `{"message"}` body.

use axum::extract::FromRequest;

use crate::error::ApiError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
