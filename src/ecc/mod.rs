//! GF(256) Reed-Solomon error correction
//!
//! This module contains the redundancy coding shared by 2D symbol formats:
//! - Field arithmetic over GF(256) with per-format field parameters
//! - Polynomial algebra over the field
//! - Encoding (generator-polynomial remainder)
//! - Decoding (syndromes, Euclidean algorithm, Chien search, Forney)

/// Reed-Solomon decoding and error reporting
pub mod decode;
/// Reed-Solomon encoding
pub mod encode;
/// GF(256) field tables and arithmetic
pub mod gf256;
/// Polynomials over GF(256)
pub mod poly;

pub use decode::{EccError, RsDecoder};
pub use encode::RsEncoder;
pub use gf256::{DATA_MATRIX_FIELD, Gf256Field, QR_FIELD};
pub use poly::GfPoly;
