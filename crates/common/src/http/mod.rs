//! HTTP plumbing shared by the OAuth procedure and the API client.

pub mod client;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
