//! Symbol fingerprinting
//!
//! Mapped records identify their trading symbol by a compact 32-bit
//! fingerprint rather than the symbol string. The fingerprint must be
//! stable across processes and restarts, so it is computed with a plain
//! 31-polynomial rolling hash over the UTF-8 bytes.

/// Compute the 32-bit fingerprint of a symbol string.
///
/// Deterministic across runs and architectures. Distinct symbols can in
/// principle collide; the engine refuses to register a colliding symbol.
pub fn symbol_fingerprint(symbol: &str) -> u32 {
    symbol
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)))
}
