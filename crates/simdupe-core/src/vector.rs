//! Vector math over fixed-length embeddings.
//!
//! Every binary operation requires equal lengths and fails with
//! [`Error::DimensionMismatch`] otherwise.

use crate::error::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

fn check_dimensions(a: &[f64], b: &[f64]) -> Result<(), Error> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Cosine similarity in [-1, 1]. Returns 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, Error> {
    check_dimensions(a, b)?;

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64, Error> {
    check_dimensions(a, b)?;

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum();
    Ok(sum.sqrt())
}

/// Unit-length copy of `v`. A zero vector is returned unchanged.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Similarity under `metric`. For Euclidean this is
/// `1 - distance / sqrt(dimension)`, which is not bounded below by -1 for
/// vectors of large magnitude.
pub fn similarity(a: &[f64], b: &[f64], metric: Metric) -> Result<f64, Error> {
    match metric {
        Metric::Cosine => cosine_similarity(a, b),
        Metric::Euclidean => {
            let distance = euclidean_distance(a, b)?;
            if a.is_empty() {
                return Ok(1.0);
            }
            Ok(1.0 - distance / (a.len() as f64).sqrt())
        }
    }
}
