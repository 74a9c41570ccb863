mod id;
mod pending_login;
mod provider;
mod session;
mod user;

pub use id::*;
pub use pending_login::*;
pub use provider::*;
pub use session::*;
pub use user::*;
