//! Shared response envelope types for API handlers.
//!
//! Read endpoints that return a resource or a list use a `{ "data": ... }`
//! envelope. Command endpoints (`accepted`, `found`, `updated`) answer with
//! flat bodies their callers branch on directly.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: slugs }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
