//! Query-to-unit relevance scores
//!
//! Every metric is turned into a score where larger means closer, so the
//! index can rank candidates the same way whichever metric it was built with.

use reportqa_kernel::rag::SimilarityMetric;

/// Relevance of `unit` to `query` under `metric`.
///
/// Euclidean distance `d` is reported as `1 / (1 + d)`, which lies in `(0, 1]`.
/// Dot product is not normalised; on unit-length embeddings it equals cosine.
pub fn compute_similarity(query: &[f32], unit: &[f32], metric: SimilarityMetric) -> f32 {
    match metric {
        SimilarityMetric::Cosine => cosine_similarity(query, unit),
        SimilarityMetric::Euclidean => 1.0 / (1.0 + squared_distance(query, unit).sqrt()),
        SimilarityMetric::DotProduct => dot(query, unit),
    }
}

/// Cosine of the angle between `a` and `b`; 0.0 when either is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (ab, aa, bb) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(ab, aa, bb), (x, y)| {
            (ab + x * y, aa + x * x, bb + y * y)
        });

    if aa == 0.0 || bb == 0.0 {
        return 0.0;
    }
    ab / (aa.sqrt() * bb.sqrt())
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
