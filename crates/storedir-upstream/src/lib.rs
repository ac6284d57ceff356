//! Client side of the storedir gateway: everything that talks to the upstream
//! REST API.
//!
//! - [`UpstreamClient`] owns the `reqwest` client and the API base URL.
//! - [`AuthRelay`] carries the browser's auth cookie and `Authorization`
//!   header onto outbound requests.
//! - [`UpstreamClient::relay`] forwards to a single known path;
//!   [`UpstreamClient::probe`] walks a list of [`Candidate`] paths.
//! - [`visitors`] reshapes visitor-summary payloads.

mod auth;
mod client;
mod error;
mod probe;
mod response;
pub mod visitors;

pub use auth::AuthRelay;
pub use client::{Forward, OutboundBody, UpstreamClient};
pub use error::UpstreamError;
pub use probe::Candidate;
pub use response::{Payload, ProxyFailure, ProxyOutcome, UpstreamResponse};
