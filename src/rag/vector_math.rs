use std::cmp::Ordering;

use ndarray::ArrayView1;

use crate::core::errors::RagError;

/// Vectors come from the embedding provider, so an empty or mismatched pair
/// is a provider fault rather than bad caller input.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, RagError> {
    if query.is_empty() || candidate.is_empty() {
        return Err(RagError::Internal("Embedding vector is empty".to_string()));
    }
    if query.len() != candidate.len() {
        return Err(RagError::Internal(format!(
            "Embedding dimension mismatch: {} != {}",
            query.len(),
            candidate.len()
        )));
    }

    let query = ArrayView1::from(query);
    let candidate = ArrayView1::from(candidate);

    let dot = query.dot(&candidate);
    let denom = l2_norm(&query) * l2_norm(&candidate);
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }

    Ok(dot / denom)
}

/// `(index, score)` pairs, highest score first. Ties keep input order.
pub fn rank_descending_by_cosine<'a, I>(
    query: &[f32],
    candidates: I,
) -> Result<Vec<(usize, f32)>, RagError>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scores = candidates
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| cosine_similarity(query, candidate).map(|score| (idx, score)))
        .collect::<Result<Vec<_>, _>>()?;

    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    Ok(scores)
}

fn l2_norm(vector: &ArrayView1<f32>) -> f32 {
    vector.dot(vector).sqrt()
}
