#![no_std]

//! Stable, in-place block merge sort.
//!
//! Sorts in `O(n log n)` comparisons and moves with `O(1)` auxiliary memory:
//! a prefix of pairwise-distinct values is extracted from the input itself
//! and serves as both a permutation record and a merge buffer, so no
//! allocation ever happens. A caller-supplied scratch buffer
//! ([`sort_with_scratch`]) accelerates the inner merges but never changes
//! the result.

use core::cmp::Ordering;
use core::mem::{self, MaybeUninit};

mod build;
mod combine;
mod grail;
mod keys;
mod merge;
mod smallsort;

/// Sorts `v` stably in place.
#[inline(always)]
pub fn sort<T: Ord>(v: &mut [T]) {
    grailsort(v, &mut [], &mut |a, b| a.lt(b));
}

/// Sorts `v` stably in place with a comparison function.
#[inline(always)]
pub fn sort_by<T, F: FnMut(&T, &T) -> Ordering>(v: &mut [T], mut compare: F) {
    grailsort(v, &mut [], &mut |a, b| compare(a, b) == Ordering::Less);
}

/// Sorts `v` stably in place, using `scratch` to speed up the inner merges.
///
/// Scratch contents on entry and on exit are unspecified. Any scratch length
/// works, including zero; 512 elements or `sqrt(v.len())` capture most of
/// the benefit. The resulting order is identical for every scratch size.
#[inline(always)]
pub fn sort_with_scratch<T: Ord>(v: &mut [T], scratch: &mut [MaybeUninit<T>]) {
    grailsort(v, scratch, &mut |a, b| a.lt(b));
}

/// Sorts `v` stably in place with a comparison function and scratch space.
#[inline(always)]
pub fn sort_by_with_scratch<T, F: FnMut(&T, &T) -> Ordering>(
    v: &mut [T],
    scratch: &mut [MaybeUninit<T>],
    mut compare: F,
) {
    grailsort(v, scratch, &mut |a, b| compare(a, b) == Ordering::Less);
}

#[inline(always)]
fn grailsort<T, F: FnMut(&T, &T) -> bool>(
    v: &mut [T],
    scratch: &mut [MaybeUninit<T>],
    is_less: &mut F,
) {
    if v.len() < 2 || mem::size_of::<T>() == 0 {
        return;
    }

    // The move-based scratch paths leave transient bitwise duplicates in the
    // slice, which is only sound for types without drop glue. Everything
    // else takes the swap-based pipeline and produces the same permutation.
    let scratch = if mem::needs_drop::<T>() { &mut [] } else { scratch };

    grail::grail_sort(v, scratch, is_less);
}
