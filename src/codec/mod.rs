pub mod decoder;
pub mod gf256;
pub mod rs;

pub use decoder::{
    berlekamp_massey, calc_syndromes, correct_errors, encode_systematic, error_locator_roots,
    formal_derivative, forney, generator_poly,
};
pub use gf256::GaloisField;
pub use rs::ReedSolomon;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid shard configuration: {data_shards} data, {parity_shards} parity")]
    InvalidConfig {
        data_shards: usize,
        parity_shards: usize,
    },
    #[error("total shards {0} exceeds the field limit of 255")]
    MaxShardsExceed(usize),
    #[error("empty input")]
    EmptyInput,
    #[error("wrong shard count: expected {expected}, got {got}")]
    ShardCount { expected: usize, got: usize },
    #[error("shards have mismatched sizes")]
    ShardSize,
    #[error("too few shards for reconstruction: need {needed}, got {got}")]
    TooFewShards { needed: usize, got: usize },
    #[error("interpolation inputs have mismatched lengths")]
    LengthMismatch,
    #[error("duplicate x value in interpolation")]
    DuplicatePoint,
    #[error("polynomial division result not representable")]
    NotRepresentable,
    #[error("too many errors to correct")]
    TooManyErrors,
}
