pub mod auth;
pub mod extract;
pub mod policy;
pub mod response;

pub use auth::require_auth;
pub use extract::{JsonBody, PathId, QueryParams};
pub use policy::authorize_route;
pub use response::{ApiResponse, ApiResult};
