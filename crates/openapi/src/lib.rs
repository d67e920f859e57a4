//! StorageOS v2 REST API transport.
//!
//! Implements [`apiclient::Transport`] over HTTP with `reqwest`. The
//! [`apiclient`] crate sees only the trait; everything about URLs, headers
//! and JSON lives here.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request construction, credential injection, wire
//! models and their decoding. No domain policy (error taxonomy, CAS, fan-out)
//! is implemented here: failures are reported as raw
//! [`apiclient::TransportError`]s carrying the status and error payload.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`model`] | Wire structs as the API encodes them |
//! | [`codec`] | Wire → domain decoding |
//! | [`transport`] | [`OpenApiTransport`] |

pub mod codec;
pub mod model;
pub mod transport;

pub use transport::{OpenApiTransport, SetupError, TransportConfig};
