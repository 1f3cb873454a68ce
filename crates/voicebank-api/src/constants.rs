/// API path prefix for all clip routes.
pub const API_PREFIX: &str = "/api/v1";
