#[cfg(test)]
mod identity_transport_fake;
mod session_storage_file;
mod session_storage_memory;

#[cfg(test)]
pub use identity_transport_fake::*;
pub use session_storage_file::*;
pub use session_storage_memory::*;
