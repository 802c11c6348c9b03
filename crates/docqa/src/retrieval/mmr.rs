//! Maximal marginal relevance selection

use super::similarity::cosine_similarity;

/// One ranked candidate: index into the chunk set plus relevance score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredIndex {
    pub idx: usize,
    pub score: f32,
}

/// Select up to `k` candidates balancing relevance against redundancy.
///
/// `ranked` must be sorted by descending score. The best candidate seeds
/// the selection; each round then adds the unselected candidate maximizing
/// `lambda * relevance - (1 - lambda) * redundancy`, where redundancy is
/// the candidate's highest similarity to anything already selected,
/// floored at zero. Ties keep the earlier (higher-ranked) candidate.
pub fn mmr_select(
    ranked: &[ScoredIndex],
    embeddings: &[&[f32]],
    k: usize,
    lambda: f32,
) -> Vec<usize> {
    if ranked.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut selected = vec![ranked[0].idx];
    let mut remaining: Vec<ScoredIndex> = ranked[1..].to_vec();

    while selected.len() < k && !remaining.is_empty() {
        let mut best: Option<(usize, f32)> = None;
        for (pos, candidate) in remaining.iter().enumerate() {
            let mut redundancy = 0.0f32;
            for &chosen in &selected {
                let sim = cosine_similarity(embeddings[candidate.idx], embeddings[chosen]);
                if sim > redundancy {
                    redundancy = sim;
                }
            }
            let score = lambda * candidate.score - (1.0 - lambda) * redundancy;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((pos, score));
            }
        }
        match best {
            Some((pos, _)) => {
                let chosen = remaining.remove(pos);
                selected.push(chosen.idx);
            }
            None => break,
        }
    }

    selected
}
