//! Request extractors that report rejections through the error envelope
//! instead of axum's plain-text bodies.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde_json::Value;

use crate::config::PaginationConfig;
use crate::error::ApiError;
use crate::filter::Page;
use crate::validation::report::{validate_date_range, DateRange};
use crate::validation::{parse_flag, parse_positive_id};

/// Any JSON body; validators decide what shape it must have
pub struct JsonBody(pub Value);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                Err(ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text())))
            }
        }
    }
}

/// The `:id` segment as a positive integer
pub struct PathId(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PathId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("id must be a positive integer in URL parameter"))?;
        parse_positive_id("id", &raw)
            .map(PathId)
            .map_err(|_| ApiError::bad_request("id must be a positive integer in URL parameter"))
    }
}

/// Raw query string parameters with typed getters
#[derive(Debug, Default)]
pub struct QueryParams(pub HashMap<String, String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e.body_text())))?;
        Ok(QueryParams(params))
    }
}

impl QueryParams {
    /// Non-blank, trimmed value
    pub fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    pub fn id(&self, name: &str) -> Result<Option<i64>, ApiError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => Ok(Some(parse_positive_id(name, raw)?)),
        }
    }

    pub fn branch_id(&self) -> Result<Option<i64>, ApiError> {
        self.id("branch_id")
    }

    pub fn flag(&self, name: &str) -> Result<Option<bool>, ApiError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => Ok(Some(parse_flag(name, raw)?)),
        }
    }

    pub fn page(&self, config: &PaginationConfig) -> Result<Page, ApiError> {
        Ok(Page::from_query(self.text("page"), self.text("limit"), config)?)
    }

    pub fn range(&self) -> Result<Option<DateRange>, ApiError> {
        Ok(validate_date_range(self.text("start_date"), self.text("end_date"))?)
    }

    /// Member of a closed set; `message` reported on mismatch
    pub fn choice<T: std::str::FromStr>(&self, name: &str, message: &str) -> Result<Option<T>, ApiError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| ApiError::bad_request(message)),
        }
    }
}
