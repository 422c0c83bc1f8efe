pub mod cache;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod observability;
pub mod pipeline;
pub mod remote;
pub mod session;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ReaderClient;
pub use error::ClientError;
