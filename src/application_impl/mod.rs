mod jwt_codec;
mod password_reset;
mod revocation_manager;
mod rotation_coordinator;
mod session_service_impl;
mod telemetry;
mod token_validator;

pub use jwt_codec::*;
pub use password_reset::*;
pub use revocation_manager::*;
pub use rotation_coordinator::*;
pub use session_service_impl::*;
pub use telemetry::*;
pub use token_validator::*;

#[cfg(test)]
mod tests;
