//! Streaming HTTP fetch with content-type and size policy checks.
//!
//! This module retrieves image bodies from HTTP/HTTPS URLs, rejecting
//! non-image content types and oversized payloads before and during the
//! transfer.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient regardless of body size)
//! - Header policy checks before the first byte touches disk
//! - Running size enforcement while streaming (guards lying servers)
//! - Safe filename derivation from URL paths
//! - Structured error types with full context

mod client;
mod constants;
mod error;
mod filename;

pub use client::{FetchStatus, ImageClient};
pub use constants::{CONNECT_TIMEOUT_SECS, MAX_IMAGE_BYTES, READ_TIMEOUT_SECS};
pub use error::FetchError;
pub use filename::{IMAGE_EXTENSION_HINTS, resolve_filename};
