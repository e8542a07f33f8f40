// Relevance filtering of ranked candidates

/// Keep at most `k` useful candidates, in their original rank order
///
/// Blank candidates are always dropped. Candidates whose trimmed length
/// reaches `min_chars` are preferred; when fewer than `k` of them exist,
/// shorter non-blank candidates fill the remaining slots by rank. If the
/// filter leaves nothing, the unfiltered top-`k` is returned instead.
pub fn filter_relevant(candidates: &[String], k: usize, min_chars: usize) -> Vec<String> {
    if k == 0 {
        return Vec::new();
    }

    let non_blank: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.trim().is_empty())
        .map(|(i, _)| i)
        .collect();

    let mut keep: Vec<usize> = non_blank
        .iter()
        .copied()
        .filter(|&i| candidates[i].trim().chars().count() >= min_chars)
        .take(k)
        .collect();

    if keep.len() < k {
        let missing = k - keep.len();
        let backfill: Vec<usize> = non_blank
            .iter()
            .copied()
            .filter(|i| !keep.contains(i))
            .take(missing)
            .collect();
        keep.extend(backfill);
        keep.sort_unstable();
    }

    if keep.is_empty() {
        return candidates.iter().take(k).cloned().collect();
    }

    keep.into_iter().map(|i| candidates[i].clone()).collect()
}
