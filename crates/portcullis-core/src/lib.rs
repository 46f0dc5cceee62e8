//! # Portcullis Core
//!
//! Core types shared across the Portcullis gateway:
//!
//! - [`GatewayError`] - the failure taxonomy carried through the middleware chain
//! - [`ValidationError`] / [`Issue`] / [`IssuePath`] - structured schema failures
//! - [`ResponseError`] - the normalized three-field wire envelope
//! - [`RequestId`] - UUID v7 request identifier
//!
//! This crate contains no I/O. Everything here is plain data that the
//! middleware and server crates move around.

#![doc(html_root_url = "https://docs.rs/portcullis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod request_id;

pub use error::{
    GatewayError, GatewayResult, Issue, IssuePath, PathSegment, ResponseError, ValidationError,
    FALLBACK_MESSAGE,
};
pub use request_id::RequestId;
