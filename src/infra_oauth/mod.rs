mod identity_provider_fake;
mod identity_provider_oauth;

pub use identity_provider_fake::*;
pub use identity_provider_oauth::*;
