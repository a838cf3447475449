//! Partitioning of a job's steps into concurrent groups.
//!
//! A run of non-sequential steps plus the sequential step that follows it
//! forms one group: the sequential step is the join point closing the batch.
//! A sequential step not preceded by such a run is a group on its own.
//!
//! ```text
//! sequential: F F F T F      groups: [0 1 2 3] [4]
//! sequential: T T F F        groups: [0] [1] [2 3]
//! ```

use std::ops::Range;

/// Partition step indices by their `sequential` flags.
///
/// Returns contiguous, ordered, non-empty ranges covering every index exactly once.
pub fn partition(sequential: &[bool]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut pending: Option<Range<usize>> = None;

    for (index, &is_sequential) in sequential.iter().enumerate() {
        match pending.take() {
            // Buffer ends with a concurrent step: grow it, and close it on a join point.
            Some(buffer) if !sequential[buffer.end - 1] => {
                let buffer = buffer.start..index + 1;
                if is_sequential {
                    groups.push(buffer);
                } else {
                    pending = Some(buffer);
                }
            }
            previous => {
                groups.extend(previous);
                pending = Some(index..index + 1);
            }
        }
    }

    groups.extend(pending);
    groups
}

/// Partition any slice using `is_sequential` to read each item's flag.
pub fn partition_by<T>(items: &[T], is_sequential: impl Fn(&T) -> bool) -> Vec<Range<usize>> {
    let flags: Vec<bool> = items.iter().map(is_sequential).collect();
    partition(&flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: bool = false;
    const T: bool = true;

    fn groups(flags: &[bool]) -> Vec<Vec<usize>> {
        partition(flags).into_iter().map(|r| r.collect()).collect()
    }

    #[test]
    fn concurrent_run_closed_by_join_point() {
        assert_eq!(groups(&[F, F, F, T]), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn trailing_concurrent_step_is_its_own_group() {
        assert_eq!(groups(&[F, F, F, T, F]), vec![vec![0, 1, 2, 3], vec![4]]);
    }

    #[test]
    fn leading_sequential_steps_are_singletons() {
        assert_eq!(groups(&[T, T, F, F]), vec![vec![0], vec![1], vec![2, 3]]);
    }

    #[test]
    fn consecutive_sequential_after_join() {
        assert_eq!(groups(&[F, T, T]), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn all_sequential_is_one_group_per_step() {
        assert_eq!(groups(&[T, T, T]), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn all_concurrent_is_one_group() {
        assert_eq!(groups(&[F, F, F]), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert!(partition(&[]).is_empty());
    }

    #[test]
    fn single_steps() {
        assert_eq!(groups(&[T]), vec![vec![0]]);
        assert_eq!(groups(&[F]), vec![vec![0]]);
    }

    #[test]
    fn sequential_then_concurrent_batch_then_join() {
        assert_eq!(
            groups(&[T, F, F, T, T, F, T]),
            vec![vec![0], vec![1, 2, 3], vec![4], vec![5, 6]]
        );
    }

    #[test]
    fn every_index_appears_once_in_order() {
        let flags = [F, T, F, F, T, T, F, T, F, F];
        let flattened: Vec<usize> = partition(&flags).into_iter().flatten().collect();
        assert_eq!(flattened, (0..flags.len()).collect::<Vec<_>>());
    }

    #[test]
    fn partition_by_reads_flags() {
        let steps = [("pull", false), ("download", false), ("migrate", true)];
        assert_eq!(partition_by(&steps, |s| s.1), vec![0..3]);
    }
}
