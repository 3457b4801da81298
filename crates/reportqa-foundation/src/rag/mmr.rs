//! Maximal Marginal Relevance selection
//!
//! Greedily picks candidates that balance relevance against redundancy:
//! `score = lambda * relevance - (1 - lambda) * max_cosine(candidate, selected)`
//!
//! - `lambda = 1.0`: pure relevance (plain nearest-neighbour order)
//! - `lambda = 0.5`: balanced
//! - `lambda = 0.0`: pure diversity

use super::similarity::cosine_similarity;

/// A first-stage search hit eligible for MMR selection.
#[derive(Debug, Clone, Copy)]
pub struct MmrCandidate<'a> {
    /// Position of the unit in the index
    pub id: usize,
    /// Relevance to the query from the first-stage search
    pub relevance: f32,
    pub vector: &'a [f32],
}

/// Select up to `k` candidates by maximal marginal relevance.
///
/// `candidates` must be sorted by relevance, best first. Among equal MMR
/// scores the candidate with the better relevance rank wins. Returns
/// `(id, relevance)` pairs in selection order.
pub fn mmr_select(candidates: &[MmrCandidate<'_>], k: usize, lambda: f32) -> Vec<(usize, f32)> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }

    let k = k.min(candidates.len());
    let mut selected: Vec<MmrCandidate<'_>> = Vec::with_capacity(k);
    let mut remaining: Vec<MmrCandidate<'_>> = candidates.to_vec();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, candidate) in remaining.iter().enumerate() {
            let score = mmr_score(candidate, &selected, lambda);
            // strict: earlier rank wins ties
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    selected.into_iter().map(|c| (c.id, c.relevance)).collect()
}

fn mmr_score(candidate: &MmrCandidate<'_>, selected: &[MmrCandidate<'_>], lambda: f32) -> f32 {
    if lambda >= 1.0 {
        return candidate.relevance;
    }

    let redundancy = selected
        .iter()
        .map(|s| cosine_similarity(candidate.vector, s.vector))
        .fold(f32::NEG_INFINITY, f32::max);
    let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

    lambda * candidate.relevance - (1.0 - lambda) * redundancy
}
