//! Evaluation-based Reed-Solomon codec.
//!
//! At every byte position the `k` data-shard bytes form the coefficients of
//! a degree-<k polynomial; shard `i` carries the evaluation at
//! `eval_points[i] = g^i`. Every shard, data or parity, is an evaluation,
//! so any `k` of them recover the polynomial by Lagrange interpolation —
//! the code is MDS.

use crate::codec::{CodecError, GaloisField};

pub struct ReedSolomon {
    data_shards: usize,
    parity_shards: usize,
    field: GaloisField,
    eval_points: Vec<u8>,
}

impl ReedSolomon {
    pub fn new(data_shards: usize, parity_shards: usize) -> Result<Self, CodecError> {
        if data_shards == 0 || parity_shards == 0 {
            return Err(CodecError::InvalidConfig {
                data_shards,
                parity_shards,
            });
        }
        let total = data_shards + parity_shards;
        if total > 255 {
            return Err(CodecError::MaxShardsExceed(total));
        }

        let field = GaloisField::new();
        let eval_points = (0..total).map(|i| field.exp(i)).collect();

        Ok(Self {
            data_shards,
            parity_shards,
            field,
            eval_points,
        })
    }

    pub fn data_shards(&self) -> usize {
        self.data_shards
    }

    pub fn parity_shards(&self) -> usize {
        self.parity_shards
    }

    pub fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }

    pub fn field(&self) -> &GaloisField {
        &self.field
    }

    /// Split `data` into `k` coefficient shards (zero-padded to equal
    /// length) and emit the evaluation at every point.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
        if data.is_empty() {
            return Err(CodecError::EmptyInput);
        }

        let k = self.data_shards;
        let shard_size = data.len().div_ceil(k);
        let mut padded = data.to_vec();
        padded.resize(k * shard_size, 0);

        let n = self.total_shards();
        let mut shards = vec![vec![0u8; shard_size]; n];
        let mut coeffs = vec![0u8; k];

        for b in 0..shard_size {
            for (j, coeff) in coeffs.iter_mut().enumerate() {
                *coeff = padded[j * shard_size + b];
            }
            for (i, shard) in shards.iter_mut().enumerate() {
                shard[b] = self.field.poly_eval(&coeffs, self.eval_points[i]);
            }
        }

        tracing::debug!(
            "Encoded {} bytes into {}+{} shards of {} bytes",
            data.len(),
            k,
            self.parity_shards,
            shard_size
        );

        Ok(shards)
    }

    fn present_indices(&self, shards: &[Option<Vec<u8>>]) -> Result<Vec<usize>, CodecError> {
        let n = self.total_shards();
        if shards.len() != n {
            return Err(CodecError::ShardCount {
                expected: n,
                got: shards.len(),
            });
        }

        let mut present = Vec::new();
        let mut size = None;
        for (i, shard) in shards.iter().enumerate() {
            if let Some(bytes) = shard {
                match size {
                    None => size = Some(bytes.len()),
                    Some(s) if s != bytes.len() => return Err(CodecError::ShardSize),
                    _ => {}
                }
                present.push(i);
            }
        }

        if present.len() < self.data_shards {
            return Err(CodecError::TooFewShards {
                needed: self.data_shards,
                got: present.len(),
            });
        }
        Ok(present)
    }

    /// Recover the full shard set from any `k` present shards.
    pub fn reconstruct(&self, shards: &[Option<Vec<u8>>]) -> Result<Vec<Vec<u8>>, CodecError> {
        let present = self.present_indices(shards)?;
        let chosen = &present[..self.data_shards];
        let shard_size = shards[chosen[0]].as_ref().map_or(0, |s| s.len());

        let xs: Vec<u8> = chosen.iter().map(|&i| self.eval_points[i]).collect();
        let n = self.total_shards();
        let mut out = vec![vec![0u8; shard_size]; n];
        let mut ys = vec![0u8; self.data_shards];

        for b in 0..shard_size {
            for (j, &i) in chosen.iter().enumerate() {
                ys[j] = shards[i].as_ref().expect("chosen shards are present")[b];
            }
            let poly = self.field.interpolate(&xs, &ys)?;
            for (i, shard) in out.iter_mut().enumerate() {
                shard[b] = self.field.poly_eval(&poly, self.eval_points[i]);
            }
        }

        Ok(out)
    }

    /// Recover the original data: the interpolated coefficients, one per
    /// data shard per byte position, zero-padded to `k * shard_size`.
    pub fn reconstruct_data(&self, shards: &[Option<Vec<u8>>]) -> Result<Vec<u8>, CodecError> {
        let present = self.present_indices(shards)?;
        let chosen = &present[..self.data_shards];
        let shard_size = shards[chosen[0]].as_ref().map_or(0, |s| s.len());

        let xs: Vec<u8> = chosen.iter().map(|&i| self.eval_points[i]).collect();
        let mut data = vec![0u8; self.data_shards * shard_size];
        let mut ys = vec![0u8; self.data_shards];

        for b in 0..shard_size {
            for (j, &i) in chosen.iter().enumerate() {
                ys[j] = shards[i].as_ref().expect("chosen shards are present")[b];
            }
            let poly = self.field.interpolate(&xs, &ys)?;
            for j in 0..self.data_shards {
                data[j * shard_size + b] = poly.get(j).copied().unwrap_or(0);
            }
        }

        Ok(data)
    }

    /// Interpolate from the first `k` shards and check every remaining
    /// shard against its re-evaluation; false on the first mismatch.
    pub fn verify_integrity(&self, shards: &[Vec<u8>]) -> Result<bool, CodecError> {
        Ok(self.check_derived(shards, true)?.is_empty())
    }

    /// Like [`verify_integrity`](Self::verify_integrity) but records every
    /// shard whose re-evaluation differs, sorted ascending.
    pub fn detect_corruption(&self, shards: &[Vec<u8>]) -> Result<Vec<usize>, CodecError> {
        self.check_derived(shards, false)
    }

    fn check_derived(
        &self,
        shards: &[Vec<u8>],
        stop_at_first: bool,
    ) -> Result<Vec<usize>, CodecError> {
        let n = self.total_shards();
        if shards.len() != n {
            return Err(CodecError::ShardCount {
                expected: n,
                got: shards.len(),
            });
        }
        let shard_size = shards[0].len();
        if shards.iter().any(|s| s.len() != shard_size) {
            return Err(CodecError::ShardSize);
        }

        let k = self.data_shards;
        let xs = &self.eval_points[..k];
        let mut ys = vec![0u8; k];
        let mut bad = Vec::new();

        'shards: for i in k..n {
            for b in 0..shard_size {
                for (j, y) in ys.iter_mut().enumerate() {
                    *y = shards[j][b];
                }
                let poly = self.field.interpolate(xs, &ys)?;
                if self.field.poly_eval(&poly, self.eval_points[i]) != shards[i][b] {
                    bad.push(i);
                    if stop_at_first {
                        return Ok(bad);
                    }
                    continue 'shards;
                }
            }
        }

        Ok(bad)
    }
}

impl std::fmt::Debug for ReedSolomon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReedSolomon")
            .field("data_shards", &self.data_shards)
            .field("parity_shards", &self.parity_shards)
            .finish()
    }
}
