//! GF(2⁸) arithmetic over the primitive polynomial `0x11D` with generator 2.
//!
//! All lookup tables live inside a [`GaloisField`] value owned by whoever
//! needs the math; there is no process-global state. Division or inversion
//! of zero is a contract violation and panics.

use crate::codec::CodecError;

/// Primitive polynomial x⁸ + x⁴ + x³ + x² + 1.
pub const FIELD_POLY: u16 = 0x11D;

/// Multiplicative generator of the field.
pub const GENERATOR: u8 = 2;

/// Order of the multiplicative group.
pub const FIELD_ORDER: usize = 255;

/// Precomputed GF(2⁸) tables: exponentials (doubled for wraparound-free
/// indexing), logarithms, the full multiplication table and inverses.
pub struct GaloisField {
    exp: [u8; 2 * FIELD_ORDER],
    log: [u8; 256],
    mul: Box<[[u8; 256]; 256]>,
    inv: [u8; 256],
}

impl Default for GaloisField {
    fn default() -> Self {
        Self::new()
    }
}

impl GaloisField {
    pub fn new() -> Self {
        let mut exp = [0u8; 2 * FIELD_ORDER];
        let mut log = [0u8; 256];

        let mut x: u16 = 1;
        for i in 0..FIELD_ORDER {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= FIELD_POLY;
            }
        }
        for i in FIELD_ORDER..2 * FIELD_ORDER {
            exp[i] = exp[i - FIELD_ORDER];
        }

        let mut mul = Box::new([[0u8; 256]; 256]);
        for a in 1..256 {
            for b in 1..256 {
                mul[a][b] = exp[log[a] as usize + log[b] as usize];
            }
        }

        let mut inv = [0u8; 256];
        for a in 1..256 {
            inv[a] = exp[FIELD_ORDER - log[a] as usize];
        }

        Self { exp, log, mul, inv }
    }

    /// Addition is XOR.
    #[inline]
    pub fn add(&self, a: u8, b: u8) -> u8 {
        a ^ b
    }

    /// Subtraction equals addition in characteristic 2.
    #[inline]
    pub fn sub(&self, a: u8, b: u8) -> u8 {
        a ^ b
    }

    #[inline]
    pub fn mul(&self, a: u8, b: u8) -> u8 {
        self.mul[a as usize][b as usize]
    }

    /// Panics on a zero divisor; the encoder's invariants preclude it.
    #[inline]
    pub fn div(&self, a: u8, b: u8) -> u8 {
        if b == 0 {
            panic!("division by zero in GF(2^8)");
        }
        self.mul(a, self.inv[b as usize])
    }

    /// Panics on zero; zero has no inverse.
    #[inline]
    pub fn inv(&self, a: u8) -> u8 {
        if a == 0 {
            panic!("inverse of zero in GF(2^8)");
        }
        self.inv[a as usize]
    }

    /// `g^i`, reduced modulo the group order.
    #[inline]
    pub fn exp(&self, i: usize) -> u8 {
        self.exp[i % FIELD_ORDER]
    }

    /// Discrete log base `g`; panics on zero.
    #[inline]
    pub fn log(&self, a: u8) -> u8 {
        if a == 0 {
            panic!("log of zero in GF(2^8)");
        }
        self.log[a as usize]
    }

    /// Exponentiation with negative exponents via the inverse.
    /// `pow(a, 0) = 1` for every `a`, including zero; `pow(0, n > 0) = 0`.
    pub fn pow(&self, a: u8, n: i32) -> u8 {
        if n == 0 {
            return 1;
        }
        if a == 0 {
            if n > 0 {
                return 0;
            }
            panic!("inverse of zero in GF(2^8)");
        }
        let mut e = (self.log[a as usize] as i64 * n as i64) % FIELD_ORDER as i64;
        if e < 0 {
            e += FIELD_ORDER as i64;
        }
        self.exp[e as usize]
    }

    // Polynomials are little-endian coefficient vectors; the degree is the
    // index of the top non-zero coefficient.

    /// Horner evaluation.
    pub fn poly_eval(&self, poly: &[u8], x: u8) -> u8 {
        let mut acc = 0u8;
        for &c in poly.iter().rev() {
            acc = self.mul(acc, x) ^ c;
        }
        acc
    }

    pub fn poly_add(&self, a: &[u8], b: &[u8]) -> Vec<u8> {
        let len = a.len().max(b.len());
        let mut out = vec![0u8; len];
        for (i, &c) in a.iter().enumerate() {
            out[i] ^= c;
        }
        for (i, &c) in b.iter().enumerate() {
            out[i] ^= c;
        }
        out
    }

    pub fn poly_scale(&self, poly: &[u8], s: u8) -> Vec<u8> {
        poly.iter().map(|&c| self.mul(c, s)).collect()
    }

    pub fn poly_mul(&self, a: &[u8], b: &[u8]) -> Vec<u8> {
        if a.is_empty() || b.is_empty() {
            return Vec::new();
        }
        let mut out = vec![0u8; a.len() + b.len() - 1];
        for (i, &ca) in a.iter().enumerate() {
            if ca == 0 {
                continue;
            }
            for (j, &cb) in b.iter().enumerate() {
                out[i + j] ^= self.mul(ca, cb);
            }
        }
        out
    }

    /// `∏ (x − r)` over the given roots; the empty product is `1`.
    pub fn poly_from_roots(&self, roots: &[u8]) -> Vec<u8> {
        let mut poly = vec![1u8];
        for &r in roots {
            poly = self.poly_mul(&poly, &[r, 1]);
        }
        poly
    }

    /// Long division; fails when the divisor is the zero polynomial.
    pub fn poly_div(&self, num: &[u8], den: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CodecError> {
        let den_deg = match den.iter().rposition(|&c| c != 0) {
            Some(d) => d,
            None => return Err(CodecError::NotRepresentable),
        };
        let num_deg = match num.iter().rposition(|&c| c != 0) {
            Some(d) => d,
            None => return Ok((Vec::new(), Vec::new())),
        };
        if num_deg < den_deg {
            return Ok((Vec::new(), num.to_vec()));
        }

        let mut rem = num.to_vec();
        let mut quot = vec![0u8; num_deg - den_deg + 1];
        let lead_inv = self.inv(den[den_deg]);

        for d in (den_deg..=num_deg).rev() {
            let coef = rem[d];
            if coef == 0 {
                continue;
            }
            let q = self.mul(coef, lead_inv);
            quot[d - den_deg] = q;
            for i in 0..=den_deg {
                rem[d - den_deg + i] ^= self.mul(q, den[i]);
            }
        }

        rem.truncate(den_deg);
        Ok((quot, rem))
    }

    /// Lagrange interpolation through `(xs[i], ys[i])`. Fails on length
    /// mismatch or duplicate x values; empty input yields the empty
    /// polynomial.
    pub fn interpolate(&self, xs: &[u8], ys: &[u8]) -> Result<Vec<u8>, CodecError> {
        if xs.len() != ys.len() {
            return Err(CodecError::LengthMismatch);
        }
        if xs.is_empty() {
            return Ok(Vec::new());
        }
        for i in 0..xs.len() {
            for j in (i + 1)..xs.len() {
                if xs[i] == xs[j] {
                    return Err(CodecError::DuplicatePoint);
                }
            }
        }

        let mut acc = vec![0u8; xs.len()];
        for i in 0..xs.len() {
            let others: Vec<u8> = xs
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &x)| x)
                .collect();
            let basis = self.poly_from_roots(&others);
            let denom = self.poly_eval(&basis, xs[i]);
            let scaled = self.poly_scale(&basis, self.div(ys[i], denom));
            acc = self.poly_add(&acc, &scaled);
        }

        while acc.last() == Some(&0) {
            acc.pop();
        }
        Ok(acc)
    }

    /// `[1, x, x², …, x^(n−1)]`.
    pub fn vandermonde_row(&self, x: u8, n: usize) -> Vec<u8> {
        let mut row = Vec::with_capacity(n);
        let mut acc = 1u8;
        for _ in 0..n {
            row.push(acc);
            acc = self.mul(acc, x);
        }
        row
    }
}

impl std::fmt::Debug for GaloisField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaloisField")
            .field("poly", &FIELD_POLY)
            .field("generator", &GENERATOR)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_table_basics() {
        let gf = GaloisField::new();
        assert_eq!(gf.exp(0), 1);
        assert_eq!(gf.exp(1), 2);
        assert_eq!(gf.log(1), 0);
        assert_eq!(gf.log(2), 1);
        // Wraparound region mirrors the base table.
        assert_eq!(gf.exp(255), gf.exp(0));
    }

    #[test]
    fn test_mul_matches_exp_log() {
        let gf = GaloisField::new();
        for a in 1..=255u8 {
            for b in 1..=255u8 {
                let via_log =
                    gf.exp(gf.log(a) as usize + gf.log(b) as usize);
                assert_eq!(gf.mul(a, b), via_log);
            }
            assert_eq!(gf.mul(a, 0), 0);
            assert_eq!(gf.mul(0, a), 0);
        }
    }

    #[test]
    fn test_inverses() {
        let gf = GaloisField::new();
        for a in 1..=255u8 {
            assert_eq!(gf.mul(a, gf.inv(a)), 1);
            assert_eq!(gf.div(a, a), 1);
        }
    }

    #[test]
    #[should_panic(expected = "division by zero")]
    fn test_div_by_zero_panics() {
        GaloisField::new().div(5, 0);
    }

    #[test]
    #[should_panic(expected = "inverse of zero")]
    fn test_inv_of_zero_panics() {
        GaloisField::new().inv(0);
    }

    #[test]
    fn test_pow_edges() {
        let gf = GaloisField::new();
        assert_eq!(gf.pow(0, 0), 1);
        assert_eq!(gf.pow(7, 0), 1);
        assert_eq!(gf.pow(0, 5), 0);
        assert_eq!(gf.pow(2, 1), 2);
        // Negative exponents go through the inverse.
        assert_eq!(gf.mul(gf.pow(7, -1), 7), 1);
        assert_eq!(gf.pow(3, -2), gf.inv(gf.mul(3, 3)));
    }

    #[test]
    fn test_poly_eval_horner() {
        let gf = GaloisField::new();
        // 1 + x at x = 2.
        assert_eq!(gf.poly_eval(&[1, 1], 2), 3);
        assert_eq!(gf.poly_eval(&[], 9), 0);
        assert_eq!(gf.poly_eval(&[7], 0), 7);
    }

    #[test]
    fn test_poly_div_roundtrip() {
        let gf = GaloisField::new();
        let num = [5u8, 3, 0, 7, 1];
        let den = [2u8, 1];
        let (quot, rem) = gf.poly_div(&num, &den).unwrap();

        // num == quot * den + rem
        let mut back = gf.poly_mul(&quot, &den);
        back = gf.poly_add(&back, &rem);
        back.resize(num.len(), 0);
        assert_eq!(back, num);
    }

    #[test]
    fn test_poly_div_zero_divisor() {
        let gf = GaloisField::new();
        assert_eq!(
            gf.poly_div(&[1, 2, 3], &[0, 0]).unwrap_err(),
            CodecError::NotRepresentable
        );
    }

    #[test]
    fn test_poly_from_roots_has_those_roots() {
        let gf = GaloisField::new();
        let roots = [3u8, 9, 200];
        let poly = gf.poly_from_roots(&roots);
        for &r in &roots {
            assert_eq!(gf.poly_eval(&poly, r), 0);
        }
        assert_ne!(gf.poly_eval(&poly, 5), 0);
    }

    #[test]
    fn test_interpolate_exact() {
        let gf = GaloisField::new();
        let poly = [17u8, 42, 99];
        let xs: Vec<u8> = (1..=3).collect();
        let ys: Vec<u8> = xs.iter().map(|&x| gf.poly_eval(&poly, x)).collect();

        let recovered = gf.interpolate(&xs, &ys).unwrap();
        assert_eq!(recovered, poly.to_vec());
    }

    #[test]
    fn test_interpolate_failures() {
        let gf = GaloisField::new();
        assert_eq!(
            gf.interpolate(&[1, 2], &[1]).unwrap_err(),
            CodecError::LengthMismatch
        );
        assert_eq!(
            gf.interpolate(&[1, 1], &[2, 3]).unwrap_err(),
            CodecError::DuplicatePoint
        );
        assert!(gf.interpolate(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_vandermonde_row() {
        let gf = GaloisField::new();
        let row = gf.vandermonde_row(2, 4);
        assert_eq!(row, vec![1, 2, 4, 8]);
        assert_eq!(gf.vandermonde_row(7, 0), Vec::<u8>::new());
    }

    proptest! {
        #[test]
        fn prop_field_axioms(a: u8, b: u8, c: u8) {
            let gf = GaloisField::new();

            // Additive group: XOR, commutative, associative, identity 0.
            prop_assert_eq!(gf.add(a, b), a ^ b);
            prop_assert_eq!(gf.add(a, b), gf.add(b, a));
            prop_assert_eq!(gf.add(gf.add(a, b), c), gf.add(a, gf.add(b, c)));
            prop_assert_eq!(gf.add(a, 0), a);

            // Multiplicative: commutative, associative, identity 1.
            prop_assert_eq!(gf.mul(a, b), gf.mul(b, a));
            prop_assert_eq!(gf.mul(gf.mul(a, b), c), gf.mul(a, gf.mul(b, c)));
            prop_assert_eq!(gf.mul(a, 1), a);

            // Distributivity.
            prop_assert_eq!(
                gf.mul(a, gf.add(b, c)),
                gf.add(gf.mul(a, b), gf.mul(a, c))
            );
        }

        #[test]
        fn prop_nonzero_inverse(a in 1u8..=255) {
            let gf = GaloisField::new();
            prop_assert_eq!(gf.mul(a, gf.inv(a)), 1);
        }
    }
}
