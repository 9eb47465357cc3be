// storage

mod session_storage;

pub use session_storage::*;

// transport

mod identity_transport;

pub use identity_transport::*;
