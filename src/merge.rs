use core::mem::MaybeUninit;
use core::ptr;

use crate::smallsort::{lower_bound, rotate, upper_bound};

// Primitive merges. The "buffered" variants expect buffer slots inside the
// slice itself, adjacent to the two runs; they advance by swapping, so the
// slice is a permutation of its input at every step. The "ext" variants are
// their move-based equivalents: they park the buffer contents in the
// caller's external scratch, merge by single moves into the vacated slots,
// and restore the parked elements through a drop guard, so the slice is a
// permutation again on every exit, including an unwinding comparator. They
// require `T` without drop glue (enforced at the public entry) because
// moved-from slots transiently hold bitwise duplicates.

/// Merges the sorted runs `v[b..b + l]` and `v[b + l..]` (where `b` is
/// `buf_len` and `l` is `left_len`), swapping merged output into the buffer
/// slots `v[..b]`. Requires `right_len <= buf_len` so the output can never
/// overrun an unconsumed element. Afterwards the merged run occupies
/// `v[..l + r]` and the displaced buffer contents sit behind it.
pub fn merge_forward<T, F>(v: &mut [T], buf_len: usize, left_len: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let mid = buf_len + left_len;
    let end = v.len();

    let mut out = 0;
    let mut left = buf_len;
    let mut right = mid;

    while right < end {
        if left == mid || is_less(&v[right], &v[left]) {
            v.swap(out, right);
            right += 1;
        } else {
            v.swap(out, left);
            left += 1;
        }
        out += 1;
    }

    if out != left {
        while left < mid {
            v.swap(out, left);
            out += 1;
            left += 1;
        }
    }
}

/// Merges the sorted runs `v[..left_len]` and `v[left_len..left_len + r]`
/// from their tails, swapping merged output into the buffer slots at the top
/// of `v`. Requires `left_len <= buf_len`. Afterwards the merged run occupies
/// the top `l + r` slots and the displaced buffer contents sit at `v[..b]`.
pub fn merge_backward<T, F>(v: &mut [T], left_len: usize, right_len: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let mut left = left_len;
    let mut right = left_len + right_len;
    let mut out = v.len();

    while left > 0 {
        if right == left_len || is_less(&v[right - 1], &v[left - 1]) {
            v.swap(out - 1, left - 1);
            left -= 1;
        } else {
            v.swap(out - 1, right - 1);
            right -= 1;
        }
        out -= 1;
    }

    if right != out {
        while right > left_len {
            v.swap(out - 1, right - 1);
            out -= 1;
            right -= 1;
        }
    }
}

// Rotation-based merge for the case where the left run is the shorter one:
// binary-search the insertion point of the left head in the right run,
// rotate the intervening right prefix in front, then skip everything that is
// now in place. Each round shrinks the left run.
fn merge_left_inplace<T, F>(v: &mut [T], left_len: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let mut base = 0;
    let mut left_len = left_len;
    let mut right_len = v.len() - left_len;

    while left_len != 0 {
        let split = base + left_len;
        let target = lower_bound(&v[split..split + right_len], &v[base], is_less);
        if target != 0 {
            rotate(&mut v[base..split + target], left_len);
            base += target;
            right_len -= target;
        }

        if right_len == 0 {
            break;
        }

        loop {
            base += 1;
            left_len -= 1;
            if left_len == 0 || is_less(&v[base + left_len], &v[base]) {
                break;
            }
        }
    }
}

// Mirror image of `merge_left_inplace` for a shorter right run, walking from
// the tails with upper-bound so equal elements keep the right run last.
fn merge_right_inplace<T, F>(v: &mut [T], left_len: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let mut left_len = left_len;
    let mut right_len = v.len() - left_len;

    while right_len != 0 {
        let target = upper_bound(&v[..left_len], &v[left_len + right_len - 1], is_less);
        if target != left_len {
            rotate(&mut v[target..left_len + right_len], left_len - target);
            left_len = target;
        }

        if left_len == 0 {
            break;
        }

        loop {
            right_len -= 1;
            if right_len == 0 || is_less(&v[left_len + right_len - 1], &v[left_len - 1]) {
                break;
            }
        }
    }
}

/// Stable in-place merge of the sorted runs `v[..left_len]` and
/// `v[left_len..]` using rotations only. Picks the direction that
/// binary-searches with the shorter run.
pub fn merge_inplace<T, F>(v: &mut [T], left_len: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    if left_len < v.len() - left_len {
        merge_left_inplace(v, left_len, is_less);
    } else {
        merge_right_inplace(v, left_len, is_less);
    }
}

/// Buffered merge of two runs of known opposing origin. `from_right` is the
/// origin of the left run: ties go to whichever side came from the left
/// input run, so chained block merges stay stable. Layout and buffer
/// behavior as in [`merge_forward`], with `buf_len` scratch slots in front.
///
/// Returns the length of the unconsumed tail and its origin.
pub fn smart_merge<T, F>(
    v: &mut [T],
    buf_len: usize,
    left_len: usize,
    from_right: bool,
    is_less: &mut F,
) -> (usize, bool)
where
    F: FnMut(&T, &T) -> bool,
{
    let mid = buf_len + left_len;
    let end = v.len();

    let mut out = 0;
    let mut left = buf_len;
    let mut right = mid;

    while left < mid && right < end {
        let take_left = if from_right {
            is_less(&v[left], &v[right])
        } else {
            !is_less(&v[right], &v[left])
        };
        if take_left {
            v.swap(out, left);
            left += 1;
        } else {
            v.swap(out, right);
            right += 1;
        }
        out += 1;
    }

    if left < mid {
        // The right run ran out first. Park the rest of the left run at the
        // very top so it stays adjacent to the next block.
        let rest = mid - left;
        let mut hi_left = mid;
        let mut hi = end;
        while left < hi_left {
            hi_left -= 1;
            hi -= 1;
            v.swap(hi_left, hi);
        }
        (rest, from_right)
    } else {
        (end - right, !from_right)
    }
}

/// Rotation-based counterpart of [`smart_merge`] for buffer-less passes.
/// `v` is `[left | right]` with the left run at `v[..left_len]`.
pub fn smart_merge_inplace<T, F>(
    v: &mut [T],
    left_len: usize,
    from_right: bool,
    is_less: &mut F,
) -> (usize, bool)
where
    F: FnMut(&T, &T) -> bool,
{
    let mut left_len = left_len;
    let mut right_len = v.len() - left_len;
    if right_len == 0 {
        return (left_len, from_right);
    }

    let mut base = 0;
    let overlap = left_len != 0
        && if from_right {
            !is_less(&v[left_len - 1], &v[left_len])
        } else {
            is_less(&v[left_len], &v[left_len - 1])
        };

    if overlap {
        while left_len != 0 {
            let split = base + left_len;
            let target = if from_right {
                upper_bound(&v[split..split + right_len], &v[base], is_less)
            } else {
                lower_bound(&v[split..split + right_len], &v[base], is_less)
            };
            if target != 0 {
                rotate(&mut v[base..split + target], left_len);
                base += target;
                right_len -= target;
            }

            if right_len == 0 {
                return (left_len, from_right);
            }

            loop {
                base += 1;
                left_len -= 1;
                let in_place = left_len != 0
                    && if from_right {
                        is_less(&v[base], &v[base + left_len])
                    } else {
                        !is_less(&v[base + left_len], &v[base])
                    };
                if !in_place {
                    break;
                }
            }
        }
    }

    (right_len, !from_right)
}

// Holds the buffer of a move-based merge, parked in the caller's scratch,
// and tracks the two holes the merge cursors leave in the slice: `out..left`
// and `left_end..right`. Their combined length always equals `parked_len`.
// Dropping the guard copies the parked elements back into the holes, which
// both reunites the buffer behind the merged output on the normal path and
// makes the slice a permutation of its input again if the comparator
// panics mid-merge.
struct GapGuard<T> {
    parked: *const T,
    parked_len: usize,
    out: *mut T,
    left: *mut T,
    left_end: *mut T,
    right: *mut T,
}

impl<T> Drop for GapGuard<T> {
    fn drop(&mut self) {
        // SAFETY: the holes are disjoint from the parked elements and from
        // each other, and together hold exactly `parked_len` slots whose
        // contents have been moved out.
        unsafe {
            let first = self.left.offset_from(self.out) as usize;
            ptr::copy_nonoverlapping(self.parked, self.out, first);
            ptr::copy_nonoverlapping(
                self.parked.add(first),
                self.left_end,
                self.parked_len - first,
            );
        }
    }
}

/// Move-based counterpart of [`merge_forward`]: same layout and same
/// postcondition, but the buffer `v[..buf_len]` is parked in `scratch` and
/// the merge writes by single moves instead of swaps. Requires
/// `right_len <= buf_len` and `T` without drop glue.
pub fn merge_forward_ext<T, F>(
    v: &mut [T],
    buf_len: usize,
    left_len: usize,
    scratch: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    assert!(scratch.len() >= buf_len);
    let mid = buf_len + left_len;
    let len = v.len();

    // SAFETY: every pointer stays inside `v`; the write cursor strictly
    // trails the unconsumed sources because at most `buf_len` elements of
    // the right run exist. `T` has no drop glue per the caller's contract,
    // so overwriting moved-out slots drops nothing, and the guard's drop
    // returns the parked buffer to the holes on completion and on unwind
    // alike.
    unsafe {
        let base = v.as_mut_ptr();
        let parked = scratch.as_mut_ptr() as *mut T;
        ptr::copy_nonoverlapping(base, parked, buf_len);

        let mut gap = GapGuard {
            parked,
            parked_len: buf_len,
            out: base,
            left: base.add(buf_len),
            left_end: base.add(mid),
            right: base.add(mid),
        };
        let right_end = base.add(len);

        while gap.right < right_end {
            let take_left = gap.left < gap.left_end && !is_less(&*gap.right, &*gap.left);
            if take_left {
                ptr::copy_nonoverlapping(gap.left, gap.out, 1);
                gap.left = gap.left.add(1);
            } else {
                ptr::copy_nonoverlapping(gap.right, gap.out, 1);
                gap.right = gap.right.add(1);
            }
            gap.out = gap.out.add(1);
        }

        if gap.out != gap.left {
            while gap.left < gap.left_end {
                ptr::copy_nonoverlapping(gap.left, gap.out, 1);
                gap.out = gap.out.add(1);
                gap.left = gap.left.add(1);
            }
        }
    }
}

/// Move-based counterpart of [`smart_merge`]. Same layout, same return
/// value, same buffer postcondition; requires `left_len <= buf_len`,
/// `right_len <= buf_len` and `T` without drop glue.
pub fn smart_merge_ext<T, F>(
    v: &mut [T],
    buf_len: usize,
    left_len: usize,
    from_right: bool,
    scratch: &mut [MaybeUninit<T>],
    is_less: &mut F,
) -> (usize, bool)
where
    F: FnMut(&T, &T) -> bool,
{
    assert!(scratch.len() >= buf_len);
    let mid = buf_len + left_len;
    let len = v.len();

    // SAFETY: as in `merge_forward_ext`. The left-leftover ending relocates
    // the rest of the left run to the top (disjoint, since it is never
    // longer than the right run's span) and collapses the guard's holes
    // into the single span in front of it before the guard drops.
    unsafe {
        let base = v.as_mut_ptr();
        let parked = scratch.as_mut_ptr() as *mut T;
        ptr::copy_nonoverlapping(base, parked, buf_len);

        let mut gap = GapGuard {
            parked,
            parked_len: buf_len,
            out: base,
            left: base.add(buf_len),
            left_end: base.add(mid),
            right: base.add(mid),
        };
        let right_end = base.add(len);

        while gap.left < gap.left_end && gap.right < right_end {
            let take_left = if from_right {
                is_less(&*gap.left, &*gap.right)
            } else {
                !is_less(&*gap.right, &*gap.left)
            };
            if take_left {
                ptr::copy_nonoverlapping(gap.left, gap.out, 1);
                gap.left = gap.left.add(1);
            } else {
                ptr::copy_nonoverlapping(gap.right, gap.out, 1);
                gap.right = gap.right.add(1);
            }
            gap.out = gap.out.add(1);
        }

        if gap.left < gap.left_end {
            // The right run ran out first. Park the rest of the left run at
            // the very top so it stays adjacent to the next block.
            let rest = gap.left_end.offset_from(gap.left) as usize;
            let top = base.add(len - rest);
            ptr::copy_nonoverlapping(gap.left, top, rest);
            gap.left = top;
            gap.left_end = gap.right;
            (rest, from_right)
        } else {
            let rest = right_end.offset_from(gap.right) as usize;
            (rest, !from_right)
        }
    }
}

/// Bottom-up merge sort built entirely from [`merge_inplace`]. This is the
/// fallback for inputs with fewer than four distinct values, where no key
/// buffer can be extracted; `O(n log^2 n)` comparisons, still stable and
/// fully in place.
pub fn lazy_merge_sort<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();

    let mut i = 1;
    while i < len {
        if is_less(&v[i], &v[i - 1]) {
            v.swap(i, i - 1);
        }
        i += 2;
    }

    let mut run_len = 2;
    while run_len < len {
        let step = run_len * 2;

        let mut base = 0;
        while base + step <= len {
            merge_inplace(&mut v[base..base + step], run_len, is_less);
            base += step;
        }

        let rest = len - base;
        if rest > run_len {
            merge_inplace(&mut v[base..], run_len, is_less);
        }

        run_len = step;
    }
}
