// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The sorter set.
//!
//! Three independent comparison sorts over any `PartialOrd + Clone` element.
//! Each takes a borrowed slice and returns a freshly allocated, sorted copy;
//! the caller's sequence is never touched.
//!
//! Tie-breaking is part of the contract:
//! - quick sort sends elements equal to the pivot to the right partition,
//! - binary insertion sort inserts a new element after existing equal ones.

use crate::types::Algorithm;

/// Sort `input` with the given algorithm.
pub fn sort_with<T: PartialOrd + Clone>(algorithm: Algorithm, input: &[T]) -> Vec<T> {
    sort_owned(algorithm, input.to_vec())
}

/// Sort an owned working copy. Used by the instrumentation so the copy
/// happens outside the timed window.
pub fn sort_owned<T: PartialOrd>(algorithm: Algorithm, mut items: Vec<T>) -> Vec<T> {
    match algorithm {
        Algorithm::BubbleSort => {
            bubble_sort_in_place(&mut items);
            items
        }
        Algorithm::QuickSort => quick_sort_owned(items),
        Algorithm::BinarySort => {
            binary_insertion_sort_in_place(&mut items);
            items
        }
    }
}

/// Exchange sort. Repeats adjacent-swap passes until a pass makes no swap.
///
/// Stable. Quadratic in the worst case, linear on already-sorted input.
pub fn bubble_sort<T: PartialOrd + Clone>(input: &[T]) -> Vec<T> {
    let mut items = input.to_vec();
    bubble_sort_in_place(&mut items);
    items
}

fn bubble_sort_in_place<T: PartialOrd>(items: &mut [T]) {
    let mut end = items.len();

    loop {
        let mut swapped = false;
        for i in 1..end {
            if items[i - 1] > items[i] {
                items.swap(i - 1, i);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
        // The largest remaining element is now in its final slot.
        end -= 1;
    }
}

enum Work<T> {
    Sort(Vec<T>),
    Emit(T),
}

/// Partition sort with the first element of each partition as pivot.
///
/// Elements strictly less than the pivot go left, everything else (including
/// equals) goes right; result is `left + pivot + right`. Partitions are kept
/// on an explicit work stack instead of the call stack, so sorted input of any
/// length degrades to quadratic time without overflowing the thread stack.
pub fn quick_sort<T: PartialOrd + Clone>(input: &[T]) -> Vec<T> {
    quick_sort_owned(input.to_vec())
}

fn quick_sort_owned<T: PartialOrd>(items: Vec<T>) -> Vec<T> {
    let mut output = Vec::with_capacity(items.len());
    let mut stack = vec![Work::Sort(items)];

    while let Some(work) = stack.pop() {
        match work {
            Work::Emit(value) => output.push(value),
            Work::Sort(partition) => {
                let mut rest = partition.into_iter();
                let Some(pivot) = rest.next() else {
                    continue;
                };
                let (less, not_less): (Vec<T>, Vec<T>) = rest.partition(|x| *x < pivot);

                // Popped in reverse: left first, then the pivot, then right.
                stack.push(Work::Sort(not_less));
                stack.push(Work::Emit(pivot));
                stack.push(Work::Sort(less));
            }
        }
    }

    output
}

/// Insertion sort that locates each slot by binary search over the sorted
/// prefix, then shifts the prefix tail right by one to open it.
pub fn binary_insertion_sort<T: PartialOrd + Clone>(input: &[T]) -> Vec<T> {
    let mut items = input.to_vec();
    binary_insertion_sort_in_place(&mut items);
    items
}

fn binary_insertion_sort_in_place<T: PartialOrd>(items: &mut [T]) {
    for i in 1..items.len() {
        let slot = upper_bound(&items[..i], &items[i]);
        items[slot..=i].rotate_right(1);
    }
}

/// First index whose element is strictly greater than `value`.
fn upper_bound<T: PartialOrd>(sorted: &[T], value: &T) -> usize {
    let (mut lo, mut hi) = (0, sorted.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if sorted[mid] <= *value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortValue;

    /// Orders by `key` only so tie placement is observable through `tag`.
    #[derive(Debug, Clone)]
    struct Keyed {
        key: i32,
        tag: char,
    }

    impl PartialEq for Keyed {
        fn eq(&self, other: &Self) -> bool {
            self.key == other.key
        }
    }

    impl PartialOrd for Keyed {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            self.key.partial_cmp(&other.key)
        }
    }

    fn keyed(pairs: &[(i32, char)]) -> Vec<Keyed> {
        pairs.iter().map(|&(key, tag)| Keyed { key, tag }).collect()
    }

    fn tags(items: &[Keyed]) -> String {
        items.iter().map(|k| k.tag).collect()
    }

    /// Deterministic xorshift input so failures reproduce.
    fn pseudo_random(len: usize, seed: u64, modulo: i64) -> Vec<i64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % modulo as u64) as i64 - modulo / 2
            })
            .collect()
    }

    fn assert_sorted_permutation(input: &[i64], output: &[i64]) {
        assert!(output.windows(2).all(|w| w[0] <= w[1]), "{:?}", output);
        let mut expected = input.to_vec();
        expected.sort();
        assert_eq!(output, expected.as_slice());
    }

    #[test]
    fn test_all_algorithms_agree_on_random_input() {
        for (seed, len) in [(1u64, 0usize), (7, 1), (42, 17), (99, 200), (1234, 513)] {
            let input = pseudo_random(len, seed, 50);
            let outputs: Vec<_> = Algorithm::ALL
                .iter()
                .map(|&a| sort_with(a, &input))
                .collect();
            for output in &outputs {
                assert_sorted_permutation(&input, output);
            }
            assert_eq!(outputs[0], outputs[1]);
            assert_eq!(outputs[1], outputs[2]);
        }
    }

    #[test]
    fn test_duplicates_with_tie_break() {
        let input = vec![3, 1, 3, 2];
        for algorithm in Algorithm::ALL {
            assert_eq!(sort_with(algorithm, &input), vec![1, 2, 3, 3]);
        }
    }

    #[test]
    fn test_quick_sort_equal_elements_follow_pivot() {
        let input = keyed(&[(3, 'a'), (1, 'b'), (3, 'c'), (2, 'd')]);
        let sorted = quick_sort(&input);
        assert_eq!(tags(&sorted), "bdac");
    }

    #[test]
    fn test_binary_insertion_places_duplicates_after_existing() {
        let input = keyed(&[(1, 'a'), (0, 'x'), (1, 'b'), (1, 'c')]);
        let sorted = binary_insertion_sort(&input);
        assert_eq!(tags(&sorted), "xabc");
    }

    #[test]
    fn test_bubble_sort_is_stable() {
        let input = keyed(&[(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')]);
        assert_eq!(tags(&bubble_sort(&input)), "bdac");
    }

    #[test]
    fn test_integer_and_float_ties_keep_representation_order() {
        let input: Vec<SortValue> = serde_json::from_str("[1.0, 0, 1]").unwrap();
        let sorted = binary_insertion_sort(&input);
        assert_eq!(serde_json::to_string(&sorted).unwrap(), "[0,1.0,1]");
    }

    #[test]
    fn test_algorithms_agree_on_integers_beyond_f64_precision() {
        let input: Vec<SortValue> =
            serde_json::from_str("[9007199254740993, 9007199254740992.0, 9007199254740992]")
                .unwrap();

        let outputs: Vec<String> = Algorithm::ALL
            .iter()
            .map(|&a| serde_json::to_string(&sort_with(a, &input)).unwrap())
            .collect();
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[1], outputs[2]);

        let sorted = sort_with(Algorithm::BubbleSort, &input);
        assert!(!sorted[0].is_integer());
        assert_eq!(sorted[1].as_number().as_u64(), Some(9_007_199_254_740_992));
        assert_eq!(sorted[2].as_number().as_u64(), Some(9_007_199_254_740_993));
    }

    #[test]
    fn test_sorted_input_is_unchanged() {
        let input: Vec<i64> = (0..64).collect();
        for algorithm in Algorithm::ALL {
            assert_eq!(sort_with(algorithm, &input), input);
        }
    }

    #[test]
    fn test_reverse_sorted_input() {
        let input: Vec<i64> = (0..300).rev().collect();
        for algorithm in Algorithm::ALL {
            assert_sorted_permutation(&input, &sort_with(algorithm, &input));
        }
    }

    #[test]
    fn test_empty_and_singleton() {
        let empty: Vec<i64> = Vec::new();
        for algorithm in Algorithm::ALL {
            assert!(sort_with(algorithm, &empty).is_empty());
            assert_eq!(sort_with(algorithm, &[5]), vec![5]);
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let input = vec![9, 4, 7, 1];
        let snapshot = input.clone();
        for algorithm in Algorithm::ALL {
            let _ = sort_with(algorithm, &input);
        }
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_quick_sort_deep_sorted_input() {
        let input: Vec<i64> = (0..10_000).collect();
        assert_eq!(quick_sort(&input), input);
    }
}
