mod auth_service_fake;
mod auth_service_impl;
mod profile_gateway;
mod refresh_coordinator;
mod request_authorizer;
mod session_store;
mod user_admin_service_fake;
mod user_admin_service_impl;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use profile_gateway::*;
pub use refresh_coordinator::*;
pub use request_authorizer::*;
pub use session_store::*;
pub use user_admin_service_fake::*;
pub use user_admin_service_impl::*;
