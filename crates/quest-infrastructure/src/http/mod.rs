mod client;
mod endpoints;

pub use client::HttpRemoteClient;
pub use endpoints::Endpoint;
