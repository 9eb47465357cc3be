mod identity_transport_reqwest;

pub use identity_transport_reqwest::*;
