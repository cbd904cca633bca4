use crate::models::{Direction, Node};
use std::collections::BTreeMap;

/// Calculates taxis values and neighbours within a sibling group
pub struct TaxisCalculator;

impl TaxisCalculator {
    /// Find the adjacent sibling in `direction` from `current_taxis`
    ///
    /// The candidate must sit strictly on the requested side: nearest-lower
    /// taxis for `Up`, nearest-higher for `Down`. Equal-taxis candidates (only
    /// possible with corrupted data) resolve to the smallest id.
    ///
    /// # Examples
    /// ```text
    /// // siblings X:10, Y:20, Z:30
    /// nearest_sibling(group, 20, Up)   => X
    /// nearest_sibling(group, 20, Down) => Z
    /// nearest_sibling(group, 10, Up)   => None
    /// ```
    pub fn nearest_sibling<'a, I>(
        siblings: I,
        current_taxis: i64,
        direction: Direction,
    ) -> Option<&'a Node>
    where
        I: IntoIterator<Item = &'a Node>,
    {
        siblings
            .into_iter()
            .filter(|sibling| match direction {
                Direction::Up => sibling.taxis < current_taxis,
                Direction::Down => sibling.taxis > current_taxis,
            })
            .min_by_key(|sibling| (sibling.taxis.abs_diff(current_taxis), sibling.id))
    }

    /// Taxis for a node appended after all existing siblings
    ///
    /// `None` when the last sibling already holds `i64::MAX`.
    ///
    /// # Examples
    /// ```text
    /// next_taxis([])           => Some(1)
    /// next_taxis([10, 30, 20]) => Some(31)
    /// next_taxis([i64::MAX])   => None
    /// ```
    pub fn next_taxis<I>(sibling_taxis: I) -> Option<i64>
    where
        I: IntoIterator<Item = i64>,
    {
        match sibling_taxis.into_iter().max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    /// Taxis values shared by more than one sibling, ascending
    ///
    /// An empty result means the group satisfies the uniqueness invariant.
    pub fn duplicate_taxis<I>(sibling_taxis: I) -> Vec<i64>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for taxis in sibling_taxis {
            *counts.entry(taxis).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(taxis, _)| taxis)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sibling(id: i64, taxis: i64) -> Node {
        Node {
            id,
            site_id: 1,
            parent_id: 1,
            taxis,
            name: format!("node-{}", id),
        }
    }

    fn group() -> Vec<Node> {
        vec![sibling(2, 10), sibling(3, 20), sibling(4, 30)]
    }

    #[test]
    fn test_nearest_sibling_up() {
        let group = group();
        let found = TaxisCalculator::nearest_sibling(&group, 20, Direction::Up);
        assert_eq!(found.map(|n| n.id), Some(2));
    }

    #[test]
    fn test_nearest_sibling_down() {
        let group = group();
        let found = TaxisCalculator::nearest_sibling(&group, 20, Direction::Down);
        assert_eq!(found.map(|n| n.id), Some(4));
    }

    #[test]
    fn test_nearest_sibling_at_boundary() {
        let group = group();
        assert!(TaxisCalculator::nearest_sibling(&group, 10, Direction::Up).is_none());
        assert!(TaxisCalculator::nearest_sibling(&group, 30, Direction::Down).is_none());
    }

    #[test]
    fn test_nearest_sibling_with_sparse_values() {
        let group = vec![sibling(2, 3), sibling(3, 70), sibling(4, 1000), sibling(5, 71)];
        let up = TaxisCalculator::nearest_sibling(&group, 1000, Direction::Up);
        assert_eq!(up.map(|n| n.id), Some(5));
        let down = TaxisCalculator::nearest_sibling(&group, 3, Direction::Down);
        assert_eq!(down.map(|n| n.id), Some(3));
    }

    #[test]
    fn test_nearest_sibling_equal_taxis_picks_smallest_id() {
        let group = vec![sibling(9, 10), sibling(4, 10), sibling(6, 10), sibling(5, 20)];
        let found = TaxisCalculator::nearest_sibling(&group, 20, Direction::Up);
        assert_eq!(found.map(|n| n.id), Some(4));
    }

    #[test]
    fn test_next_taxis() {
        assert_eq!(TaxisCalculator::next_taxis(Vec::new()), Some(1));
        assert_eq!(TaxisCalculator::next_taxis(vec![10, 30, 20]), Some(31));
        assert_eq!(TaxisCalculator::next_taxis(vec![i64::MAX - 1]), Some(i64::MAX));
    }

    #[test]
    fn test_next_taxis_at_max_is_none() {
        assert_eq!(TaxisCalculator::next_taxis(vec![3, i64::MAX]), None);
    }

    #[test]
    fn test_duplicate_taxis() {
        assert!(TaxisCalculator::duplicate_taxis(vec![1, 2, 3]).is_empty());
        assert_eq!(
            TaxisCalculator::duplicate_taxis(vec![5, 1, 5, 2, 1, 5]),
            vec![1, 5]
        );
    }
}
