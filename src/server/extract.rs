//! Extractors whose rejections are reported as `CatalogError` JSON bodies
//! instead of axum's plain-text defaults.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::catalog::CatalogError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(CatalogError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(CatalogError))]
pub struct PathParam<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(CatalogError))]
pub struct QueryParams<T>(pub T);

impl From<JsonRejection> for CatalogError {
    fn from(rejection: JsonRejection) -> Self {
        CatalogError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for CatalogError {
    fn from(rejection: PathRejection) -> Self {
        CatalogError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for CatalogError {
    fn from(rejection: QueryRejection) -> Self {
        CatalogError::Validation(rejection.body_text())
    }
}
