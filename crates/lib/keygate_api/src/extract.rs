//! Request body extraction.

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body whose rejections render as [`AppError::InvalidArgument`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct RpcJson<T>(pub T);
