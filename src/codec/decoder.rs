//! Syndrome-based error correction for when erasure positions are unknown:
//! syndromes, Berlekamp-Massey, Chien search and Forney magnitudes, plus
//! the systematic encoder that pairs with them.
//!
//! Codewords are little-endian polynomials like everything else in this
//! module: index = degree. A systematic codeword is `remainder ‖ message`,
//! so the message occupies the high-degree coefficients.

use crate::codec::{CodecError, GaloisField};
use crate::codec::gf256::FIELD_ORDER;

/// `∏ (x − g^i)` for `i = 0..m-1`: the degree-`m` generator polynomial
/// whose roots every valid codeword shares.
pub fn generator_poly(field: &GaloisField, parity: usize) -> Vec<u8> {
    let roots: Vec<u8> = (0..parity).map(|i| field.exp(i)).collect();
    field.poly_from_roots(&roots)
}

/// Syndrome `j` is the codeword evaluated at `g^j`. All zero means no
/// errors.
pub fn calc_syndromes(field: &GaloisField, msg: &[u8], parity: usize) -> Vec<u8> {
    (0..parity)
        .map(|j| field.poly_eval(msg, field.exp(j)))
        .collect()
}

/// Berlekamp-Massey: the shortest LFSR generating the syndrome sequence is
/// the error locator Λ(x), returned little-endian with Λ(0) = 1.
pub fn berlekamp_massey(field: &GaloisField, syndromes: &[u8]) -> Vec<u8> {
    let mut cur = vec![1u8]; // Λ under construction
    let mut prev = vec![1u8]; // Λ before the last length change
    let mut l = 0usize; // current LFSR length
    let mut shift = 1usize; // x-power applied to prev
    let mut prev_delta = 1u8; // discrepancy at the last length change

    for n in 0..syndromes.len() {
        let mut delta = syndromes[n];
        for i in 1..=l.min(cur.len() - 1) {
            delta ^= field.mul(cur[i], syndromes[n - i]);
        }

        if delta == 0 {
            shift += 1;
            continue;
        }

        let coef = field.div(delta, prev_delta);
        let needed = prev.len() + shift;
        if cur.len() < needed {
            cur.resize(needed, 0);
        }

        if 2 * l <= n {
            let snapshot = cur.clone();
            for (i, &p) in prev.iter().enumerate() {
                cur[i + shift] ^= field.mul(coef, p);
            }
            l = n + 1 - l;
            prev = snapshot;
            prev_delta = delta;
            shift = 1;
        } else {
            for (i, &p) in prev.iter().enumerate() {
                cur[i + shift] ^= field.mul(coef, p);
            }
            shift += 1;
        }
    }

    cur.truncate(l + 1);
    cur
}

/// Chien search over the message length: position `p` is an error location
/// iff `Λ(g^(255−p)) = 0`.
pub fn error_locator_roots(field: &GaloisField, locator: &[u8], len: usize) -> Vec<usize> {
    (0..len)
        .filter(|&p| field.poly_eval(locator, field.exp(FIELD_ORDER - (p % FIELD_ORDER))) == 0)
        .collect()
}

/// Formal derivative in characteristic 2: odd-index coefficients survive
/// (dropping one degree), even-index coefficients vanish.
pub fn formal_derivative(poly: &[u8]) -> Vec<u8> {
    (1..poly.len())
        .map(|i| if i % 2 == 1 { poly[i] } else { 0 })
        .collect()
}

/// Forney magnitudes: Ω(x) = (S·Λ) mod x^m, and the magnitude at position
/// `p` (with X = g^p) is `X · Ω(X⁻¹) / Λ′(X⁻¹)`.
pub fn forney(
    field: &GaloisField,
    syndromes: &[u8],
    locator: &[u8],
    positions: &[usize],
) -> Result<Vec<u8>, CodecError> {
    let mut omega = field.poly_mul(syndromes, locator);
    omega.truncate(syndromes.len());
    let derivative = formal_derivative(locator);

    let mut magnitudes = Vec::with_capacity(positions.len());
    for &p in positions {
        let x_inv = field.exp(FIELD_ORDER - (p % FIELD_ORDER));
        let num = field.poly_eval(&omega, x_inv);
        let den = field.poly_eval(&derivative, x_inv);
        if den == 0 {
            return Err(CodecError::TooManyErrors);
        }
        magnitudes.push(field.mul(field.exp(p), field.div(num, den)));
    }
    Ok(magnitudes)
}

/// Systematic encoding: shift the message up by `m` positions, take the
/// remainder under the generator, and emit `remainder ‖ message`. A clean
/// codeword has all-zero syndromes.
pub fn encode_systematic(
    field: &GaloisField,
    msg: &[u8],
    parity: usize,
) -> Result<Vec<u8>, CodecError> {
    if msg.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    if msg.len() + parity > FIELD_ORDER {
        return Err(CodecError::MaxShardsExceed(msg.len() + parity));
    }

    let gen = generator_poly(field, parity);
    let mut shifted = vec![0u8; parity];
    shifted.extend_from_slice(msg);

    let (_, mut remainder) = field.poly_div(&shifted, &gen)?;
    remainder.resize(parity, 0);
    remainder.extend_from_slice(msg);
    Ok(remainder)
}

/// Full unknown-position repair: locate up to ⌊m/2⌋ errors, compute their
/// magnitudes and fix the codeword in place, re-checking the syndromes at
/// the end.
pub fn correct_errors(
    field: &GaloisField,
    msg: &[u8],
    parity: usize,
) -> Result<Vec<u8>, CodecError> {
    let syndromes = calc_syndromes(field, msg, parity);
    if syndromes.iter().all(|&s| s == 0) {
        return Ok(msg.to_vec());
    }

    let locator = berlekamp_massey(field, &syndromes);
    let error_count = locator.len() - 1;
    if error_count * 2 > parity {
        return Err(CodecError::TooManyErrors);
    }

    let positions = error_locator_roots(field, &locator, msg.len());
    if positions.len() != error_count {
        return Err(CodecError::TooManyErrors);
    }

    let magnitudes = forney(field, &syndromes, &locator, &positions)?;

    let mut repaired = msg.to_vec();
    for (&p, &e) in positions.iter().zip(magnitudes.iter()) {
        repaired[p] ^= e;
    }

    if calc_syndromes(field, &repaired, parity)
        .iter()
        .any(|&s| s != 0)
    {
        return Err(CodecError::TooManyErrors);
    }

    tracing::debug!("Corrected {} errors at {:?}", positions.len(), positions);
    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_poly_roots() {
        let gf = GaloisField::new();
        let gen = generator_poly(&gf, 4);
        assert_eq!(gen.len(), 5);
        for i in 0..4 {
            assert_eq!(gf.poly_eval(&gen, gf.exp(i)), 0);
        }
        assert_ne!(gf.poly_eval(&gen, gf.exp(4)), 0);
    }

    #[test]
    fn test_clean_codeword_has_zero_syndromes() {
        let gf = GaloisField::new();
        let msg = b"data availability";
        let codeword = encode_systematic(&gf, msg, 6).unwrap();

        assert_eq!(codeword.len(), msg.len() + 6);
        // The message sits in the high coefficients.
        assert_eq!(&codeword[6..], msg);

        let syndromes = calc_syndromes(&gf, &codeword, 6);
        assert!(syndromes.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_corrupted_codeword_has_nonzero_syndromes() {
        let gf = GaloisField::new();
        let mut codeword = encode_systematic(&gf, b"payload", 4).unwrap();
        codeword[3] ^= 0x40;

        let syndromes = calc_syndromes(&gf, &codeword, 4);
        assert!(syndromes.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_single_error_located_and_fixed() {
        let gf = GaloisField::new();
        let clean = encode_systematic(&gf, b"locate me", 4).unwrap();

        let mut corrupted = clean.clone();
        corrupted[7] ^= 0x5a;

        let syndromes = calc_syndromes(&gf, &corrupted, 4);
        let locator = berlekamp_massey(&gf, &syndromes);
        assert_eq!(locator.len(), 2);

        let positions = error_locator_roots(&gf, &locator, corrupted.len());
        assert_eq!(positions, vec![7]);

        let magnitudes = forney(&gf, &syndromes, &locator, &positions).unwrap();
        assert_eq!(magnitudes, vec![0x5a]);

        assert_eq!(correct_errors(&gf, &corrupted, 4).unwrap(), clean);
    }

    #[test]
    fn test_two_errors_corrected() {
        let gf = GaloisField::new();
        let clean = encode_systematic(&gf, b"double trouble in here", 6).unwrap();

        let mut corrupted = clean.clone();
        corrupted[2] ^= 0x11;
        corrupted[15] ^= 0xee;

        assert_eq!(correct_errors(&gf, &corrupted, 6).unwrap(), clean);
    }

    #[test]
    fn test_beyond_capacity_rejected() {
        let gf = GaloisField::new();
        let clean = encode_systematic(&gf, b"overwhelmed codeword", 4).unwrap();

        // Three errors against m = 4 (capacity 2).
        let mut corrupted = clean.clone();
        corrupted[0] ^= 1;
        corrupted[5] ^= 2;
        corrupted[9] ^= 3;

        assert!(correct_errors(&gf, &corrupted, 4).is_err());
    }

    #[test]
    fn test_clean_input_passthrough() {
        let gf = GaloisField::new();
        let clean = encode_systematic(&gf, b"nothing wrong", 4).unwrap();
        assert_eq!(correct_errors(&gf, &clean, 4).unwrap(), clean);
    }

    #[test]
    fn test_formal_derivative_char2() {
        // d/dx (a + bx + cx² + dx³) = b + dx² in characteristic 2.
        assert_eq!(formal_derivative(&[5, 7, 9, 11]), vec![7, 0, 11]);
        assert!(formal_derivative(&[42]).is_empty());
    }

    #[test]
    fn test_encode_systematic_limits() {
        let gf = GaloisField::new();
        assert_eq!(
            encode_systematic(&gf, &[], 4).unwrap_err(),
            CodecError::EmptyInput
        );
        let long = vec![1u8; 252];
        assert!(matches!(
            encode_systematic(&gf, &long, 4).unwrap_err(),
            CodecError::MaxShardsExceed(_)
        ));
    }
}
