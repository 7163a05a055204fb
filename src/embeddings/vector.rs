//! Vector math helpers.

/// Euclidean (L2) norm of a vector.
#[must_use]
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector to unit length in place.
///
/// A zero vector (or one with a non-finite norm) is left unchanged rather
/// than filled with NaN.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > 0.0 && norm.is_finite() {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Normalize every vector of a batch.
#[must_use]
pub fn normalize_all(mut vectors: Vec<Vec<f32>>) -> Vec<Vec<f32>> {
    for v in &mut vectors {
        l2_normalize(v);
    }
    vectors
}
