mod oauth_service;
mod session_service;
mod token_service;

pub use oauth_service::*;
pub use session_service::*;
pub use token_service::*;
