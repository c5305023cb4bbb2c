//! Weighted distance selection.
//!
//! Candidates are weighted by how much closer they are than the farthest
//! candidate, so nearby targets and partners win most rolls while far ones
//! stay possible. Every target, escort and defender pick goes through here.
use rand::Rng;

use crate::geometry::Point;
use crate::numbers::ceil_weight;

/// Pick the index of one candidate, biased towards `reference`.
///
/// Candidates are sorted by ascending distance; each gets
/// `ceil(max_distance - distance)` weight and the first whose cumulative
/// weight reaches a uniform roll in `[0, total)` wins. When every weight is
/// zero (all candidates equidistant) the pick is uniform.
pub fn select_index_by_distance<T, R, F>(
    reference: &Point,
    candidates: &[T],
    position_of: F,
    rng: &mut R,
) -> Option<usize>
where
    F: Fn(&T) -> Point,
    R: Rng + ?Sized,
{
    match candidates.len() {
        0 => return None,
        1 => return Some(0),
        _ => {}
    }

    let mut ranked: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| (idx, reference.distance(&position_of(candidate))))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let max_distance = ranked.last().map_or(0.0, |(_, d)| *d);
    let mut total: u64 = 0;
    let cumulative: Vec<(usize, u64)> = ranked
        .iter()
        .map(|&(idx, distance)| {
            total = total.saturating_add(ceil_weight(max_distance - distance));
            (idx, total)
        })
        .collect();

    if total == 0 {
        return Some(rng.gen_range(0..candidates.len()));
    }

    let roll = rng.gen_range(0..total);
    cumulative
        .iter()
        .find(|(_, cum)| *cum >= roll)
        .map(|(idx, _)| *idx)
}

/// Pick one candidate by reference, biased towards `reference`.
pub fn select_by_distance<'a, T, R, F>(
    reference: &Point,
    candidates: &'a [T],
    position_of: F,
    rng: &mut R,
) -> Option<&'a T>
where
    F: Fn(&T) -> Point,
    R: Rng + ?Sized,
{
    select_index_by_distance(reference, candidates, position_of, rng)
        .and_then(|idx| candidates.get(idx))
}
