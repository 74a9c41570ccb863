mod oauth_service_memory;
mod session_service_memory;
mod token_service_jwt;

pub use oauth_service_memory::*;
pub use session_service_memory::*;
pub use token_service_jwt::*;
