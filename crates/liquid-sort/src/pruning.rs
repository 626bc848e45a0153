//! Pour legality rules for the search.
//!
//! A pour is physically possible when the source has liquid, the
//! destination has room, and the colors meet. On top of that the search
//! skips pours that can never help: emptying a single-color tube into an
//! empty tube only relabels which tube holds that color.

use crate::puzzle::{is_monochrome, top, Color, Configuration, Move};

/// Physical pour rules: source non-empty, destination not full, and the
/// destination is empty or its top matches the source's top.
pub fn can_pour(from: &[Color], to: &[Color], capacity: usize) -> bool {
    let Some(source_top) = top(from) else {
        return false;
    };
    if to.len() >= capacity {
        return false;
    }
    match top(to) {
        Some(dest_top) => dest_top == source_top,
        None => true,
    }
}

/// Pouring a single-color tube into an empty tube
pub fn is_pointless_pour(from: &[Color], to: &[Color]) -> bool {
    to.is_empty() && is_monochrome(from)
}

/// Check whether the search should consider pouring `from` into `to`
pub fn is_legal_pour(from: &[Color], to: &[Color], capacity: usize, prune_monochrome: bool) -> bool {
    if !can_pour(from, to, capacity) {
        return false;
    }
    !(prune_monochrome && is_pointless_pour(from, to))
}

/// All legal moves from a configuration, source-major order.
pub fn legal_moves(
    config: &Configuration,
    prune_monochrome: bool,
) -> impl Iterator<Item = Move> + '_ {
    let tubes = config.tubes();
    let capacity = config.capacity();
    (0..tubes.len()).flat_map(move |i| {
        (0..tubes.len()).filter_map(move |j| {
            if i != j && is_legal_pour(&tubes[i], &tubes[j], capacity, prune_monochrome) {
                Some(Move::new(i, j))
            } else {
                None
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors(ids: &[u16]) -> Vec<Color> {
        ids.iter().map(|&c| Color(c)).collect()
    }

    #[test]
    fn test_empty_source_cannot_pour() {
        assert!(!can_pour(&[], &colors(&[1]), 3));
    }

    #[test]
    fn test_full_destination_cannot_receive() {
        assert!(!can_pour(&colors(&[0, 1]), &colors(&[1, 1]), 2));
    }

    #[test]
    fn test_top_colors_must_match() {
        assert!(!can_pour(&colors(&[0, 1]), &colors(&[0]), 3));
        assert!(can_pour(&colors(&[0, 1]), &colors(&[1]), 3));
    }

    #[test]
    fn test_mixed_tube_may_pour_into_empty() {
        assert!(is_legal_pour(&colors(&[0, 1]), &[], 2, true));
    }

    #[test]
    fn test_monochrome_into_empty_is_pruned() {
        let mono = colors(&[2, 2]);
        assert!(can_pour(&mono, &[], 2));
        assert!(is_pointless_pour(&mono, &[]));
        assert!(!is_legal_pour(&mono, &[], 2, true));
        assert!(is_legal_pour(&mono, &[], 2, false));
    }

    #[test]
    fn test_monochrome_onto_matching_color_is_allowed() {
        // Only pours into empty tubes are pruned.
        assert!(is_legal_pour(&colors(&[2]), &colors(&[2]), 2, true));
    }

    #[test]
    fn test_legal_moves_never_offers_monochrome_into_empty() {
        let config = Configuration::from_colors(&[&[0, 0], &[1, 0], &[], &[1]], 2);
        let moves: Vec<Move> = legal_moves(&config, true).collect();

        assert_eq!(moves, vec![Move::new(1, 2)]);
        for mv in &moves {
            let from = &config.tubes()[mv.from];
            let to = &config.tubes()[mv.to];
            assert!(!is_pointless_pour(from, to));
        }
    }

    #[test]
    fn test_legal_moves_without_pruning() {
        let config = Configuration::from_colors(&[&[0, 0], &[]], 2);
        assert_eq!(legal_moves(&config, true).count(), 0);
        assert_eq!(legal_moves(&config, false).collect::<Vec<_>>(), vec![Move::new(0, 1)]);
    }
}
