pub mod actor;
pub mod set_cors_headers;
