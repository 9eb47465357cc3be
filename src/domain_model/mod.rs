mod endpoint;
mod http;
mod profile;
mod session;
mod token;

pub use endpoint::*;
pub use http::*;
pub use profile::*;
pub use session::*;
pub use token::*;
