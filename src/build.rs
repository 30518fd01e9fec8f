use core::mem::MaybeUninit;
use core::ptr;

use crate::merge::{merge_backward, merge_forward, merge_forward_ext};
use crate::smallsort::rotate;

/// Turns the value region `v[buf_len..]` into sorted runs of length
/// `2 * buf_len`, using the `buf_len` working-buffer slots in front of it as
/// merge scratch. On return the buffer occupies `v[..buf_len]` again, with
/// its contents permuted.
///
/// If `scratch` is non-empty (the caller only passes scratch for `T` without
/// drop glue), the smallest runs are built with moves instead of swaps, up
/// to the largest power-of-two run length that fits in `scratch`; each
/// move-based step parks the buffer slots it consumes in `scratch` behind a
/// drop guard, so the slice stays a permutation of its input even across a
/// panicking comparator. `buf_len` must be a power of two, at least 4.
pub fn build_blocks<T, F>(
    v: &mut [T],
    buf_len: usize,
    scratch: &mut [MaybeUninit<T>],
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    let size = v.len() - buf_len;

    let mut ext_limit = buf_len;
    while ext_limit > scratch.len() {
        ext_limit /= 2;
    }

    // The value region is tracked by its start `org`, which walks leftward
    // by the run length after every pass: each merge deposits its output one
    // run length before its input, displacing that many buffer elements to
    // the region's end.
    let mut org = buf_len;

    if ext_limit >= 2 {
        // Tracks the two buffer elements displaced by the pair walk, parked
        // in `scratch`. The walk updates `hole` around every comparison;
        // dropping the guard drops them back in, so a panicking comparator
        // cannot strand them.
        struct PairGuard<T> {
            parked: *const T,
            hole: *mut T,
        }

        impl<T> Drop for PairGuard<T> {
            fn drop(&mut self) {
                // SAFETY: `hole` always points at the two moved-out slots.
                unsafe {
                    ptr::copy_nonoverlapping(self.parked, self.hole, 2);
                }
            }
        }

        // SAFETY: `scratch` fits two elements and `T` has no drop glue
        // (caller contract); each pair is read before its destination pair
        // of slots is overwritten, and the guard keeps the two moved-out
        // slots accounted for at every comparison.
        unsafe {
            let base = v.as_mut_ptr();
            let parked = scratch.as_mut_ptr() as *mut T;
            ptr::copy_nonoverlapping(base.add(buf_len - 2), parked, 2);

            let mut guard = PairGuard {
                parked,
                hole: base.add(buf_len - 2),
            };

            // Pair pass: each pair lands sorted, two slots to the left.
            let mut j = 1;
            while j < size {
                let p = buf_len + j;
                guard.hole = base.add(p - 3);
                let swap = is_less(&*base.add(p), &*base.add(p - 1)) as usize;
                ptr::copy_nonoverlapping(base.add(p - 1 + swap), base.add(p - 3), 1);
                ptr::copy_nonoverlapping(base.add(p - swap), base.add(p - 2), 1);
                guard.hole = base.add(p - 1);
                j += 2;
            }
            if size % 2 != 0 {
                ptr::copy_nonoverlapping(
                    base.add(buf_len + size - 1),
                    base.add(buf_len + size - 3),
                    1,
                );
                guard.hole = base.add(buf_len + size - 2);
            }
            // The guard drops here, placing the parked pair behind the
            // shifted region.
        }
    } else {
        let mut j = 1;
        while j < size {
            let p = buf_len + j;
            let swap = is_less(&v[p], &v[p - 1]) as usize;
            v.swap(p - 3, p - 1 + swap);
            v.swap(p - 2, p - swap);
            j += 2;
        }
        if size % 2 != 0 {
            v.swap(buf_len + size - 1, buf_len + size - 3);
        }
    }

    org -= 2;
    let mut run_len = 2;

    while run_len < buf_len {
        let next = run_len * 2;
        let ext = run_len < ext_limit;

        let mut p0 = 0;
        while p0 + next <= size {
            let window = &mut v[org + p0 - run_len..org + p0 + next];
            if ext {
                merge_forward_ext(window, run_len, run_len, scratch, is_less);
            } else {
                merge_forward(window, run_len, run_len, is_less);
            }
            p0 += next;
        }

        let rest = size - p0;
        if rest > run_len {
            let window = &mut v[org + p0 - run_len..org + p0 + rest];
            if ext {
                merge_forward_ext(window, run_len, run_len, scratch, is_less);
            } else {
                merge_forward(window, run_len, run_len, is_less);
            }
        } else {
            rotate(&mut v[org + p0 - run_len..org + p0 + rest], run_len);
        }

        org -= run_len;
        run_len = next;
    }

    // The region has walked all the way down to the start of the slice and
    // the buffer sits behind it. A right-to-left sweep of backward merges
    // doubles the runs one final time while carrying the buffer back to the
    // front.
    debug_assert_eq!(org, 0);

    let full = 2 * buf_len;
    let rest = size % full;
    let tail = size - rest;

    if rest <= buf_len {
        rotate(&mut v[tail..tail + rest + buf_len], rest);
    } else {
        merge_backward(&mut v[tail..tail + rest + buf_len], buf_len, rest - buf_len, is_less);
    }

    let mut p = tail;
    while p != 0 {
        p -= full;
        merge_backward(&mut v[p..p + full + buf_len], buf_len, buf_len, is_less);
    }
}
