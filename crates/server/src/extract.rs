//! Extractors whose rejections render through `ApiError`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::ApiError;

/// `axum::Json` with `{"error","code"}` rejections.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` with `{"error","code"}` rejections.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);
