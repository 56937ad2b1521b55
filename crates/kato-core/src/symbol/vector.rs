//! Vector symbolization
//!
//! Maps a fixed-dimension real vector to a stable `VCTR|<hex>` symbol:
//!
//! 1. L2-normalize the vector.
//! 2. Round each coordinate to 6 decimal places (determinism under float
//!    drift between producers).
//! 3. Serialize the rounded coordinates as little-endian `f64` bytes and hash
//!    with SHA1.
//! 4. The symbol is `"VCTR|"` followed by the first 12 hex characters of the
//!    digest.
//!
//! The original (unrounded) vector is not touched here — storing it in the
//! ANN collaborator is the caller's responsibility (see `kb::AnnService`).

use sha1::{Digest, Sha1};

/// Presentation/identity prefix for vector-derived symbols.
pub const VECTOR_SYMBOL_PREFIX: &str = "VCTR|";

/// Number of hex characters kept from the SHA1 digest.
const SYMBOL_HEX_LEN: usize = 12;

/// Decimal places vector coordinates are rounded to before hashing.
const ROUNDING_PLACES: i32 = 6;

/// Errors from vector symbolization.
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum VectorSymbolError {
    /// The vector's length did not match the configured dimension.
    #[error("expected vector of dimension {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// The vector was all-zero and therefore cannot be L2-normalized.
    #[error("cannot normalize a zero vector")]
    ZeroVector,
}

/// Deterministically derive a `VCTR|<hex>` symbol for `vector`.
///
/// `expected_dim` is the configured embedding dimension (recommended 768);
/// pass `0` to skip the dimension check.
pub fn symbolize_vector(vector: &[f32], expected_dim: usize) -> Result<String, VectorSymbolError> {
    if expected_dim != 0 && vector.len() != expected_dim {
        return Err(VectorSymbolError::DimensionMismatch {
            expected: expected_dim,
            actual: vector.len(),
        });
    }

    let norm = vector.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Err(VectorSymbolError::ZeroVector);
    }

    let scale = 10f64.powi(ROUNDING_PLACES);
    let mut hasher = Sha1::new();
    for x in vector {
        let normalized = (*x as f64) / norm;
        let rounded = (normalized * scale).round() / scale;
        hasher.update(rounded.to_le_bytes());
    }
    let digest = hasher.finalize();
    let hex = hex_encode(&digest);

    Ok(format!("{VECTOR_SYMBOL_PREFIX}{}", &hex[..SYMBOL_HEX_LEN]))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
