/// Middleware modules for the API server
///
/// - `auth`: JWT authentication and the admin role gate

pub mod auth;
