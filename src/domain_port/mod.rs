mod clock;
mod expirable;
mod identity_provider;

pub use clock::*;
pub use expirable::*;
pub use identity_provider::*;
