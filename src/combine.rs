use core::mem::MaybeUninit;

use crate::merge::{
    merge_forward, merge_forward_ext, merge_inplace, smart_merge, smart_merge_ext,
    smart_merge_inplace,
};
use crate::smallsort::{block_swap, insertion_sort_stable};

// One combine pass doubles the sorted-run length: each chunk of two adjacent
// runs is cut into blocks, the blocks are selection-sorted by head element
// (with the key prefix of `a` recording where each block came from), and a
// single forward sweep merges them back into one run.
//
// `a` is the whole working slice: keys at the front, the value region at
// `a[values_at..values_at + size]`, and in buffered modes `block_len` slots
// of working buffer directly before the value region. The buffer travels
// rightward through each chunk during the sweep and is swapped back in
// front of the region at the end of the pass.

/// Merges every pair of adjacent `run_len`-sized runs in the value region
/// into runs of `2 * run_len`. `scratch` (only passed for `T` without drop
/// glue, in a buffered pass, and only when it fits `block_len` elements)
/// switches the inner merges from swap-based to move-based; each such merge
/// parks the buffer in `scratch` behind a drop guard, so the slice stays a
/// permutation of its input even across a panicking comparator.
pub fn combine_blocks<T, F>(
    a: &mut [T],
    values_at: usize,
    size: usize,
    run_len: usize,
    block_len: usize,
    has_buffer: bool,
    mut scratch: Option<&mut [MaybeUninit<T>]>,
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    let merged = run_len * 2;
    let chunk_count = size / merged;
    let mut rest = size % merged;
    let mut size = size;

    // A tail no longer than one run is already a run; leave it for the next
    // pass instead of special-casing it here.
    if rest <= run_len {
        size -= rest;
        rest = 0;
    }

    for i in 0..=chunk_count {
        let last_chunk = i == chunk_count;
        if last_chunk && rest == 0 {
            break;
        }

        let chunk_len = if last_chunk { rest } else { merged };
        let count = chunk_len / block_len;

        // The previous chunk's sweep left the keys permuted; restore sorted
        // order. One extra key participates for a partial chunk so the
        // median stays addressable even when `count` falls below it.
        insertion_sort_stable(&mut a[..count + last_chunk as usize], is_less);

        let mut median = run_len / block_len;
        let chunk_at = values_at + i * merged;

        // Selection-sort the blocks by first element, dragging the keys
        // along as the permutation record. Ties between heads fall back to
        // key order, which is original block order.
        for j in 1..count {
            let mut target = j - 1;
            for w in j..count {
                let head_t = chunk_at + target * block_len;
                let head_w = chunk_at + w * block_len;
                if is_less(&a[head_w], &a[head_t])
                    || (!is_less(&a[head_t], &a[head_w]) && is_less(&a[w], &a[target]))
                {
                    target = w;
                }
            }
            if target != j - 1 {
                block_swap(
                    a,
                    chunk_at + (j - 1) * block_len,
                    chunk_at + target * block_len,
                    block_len,
                );
                a.swap(j - 1, target);
                if median == j - 1 || median == target {
                    median ^= (j - 1) ^ target;
                }
            }
        }

        // Count trailing blocks that sort entirely after the partial run;
        // they are folded into the final merge instead of the block walk.
        let last = if last_chunk { rest % block_len } else { 0 };
        let mut tail_blocks = 0;
        if last != 0 {
            while tail_blocks < count
                && is_less(
                    &a[chunk_at + count * block_len],
                    &a[chunk_at + (count - tail_blocks - 1) * block_len],
                )
            {
                tail_blocks += 1;
            }
        }

        merge_blocks(
            a,
            chunk_at,
            median,
            count - tail_blocks,
            block_len,
            has_buffer,
            tail_blocks,
            last,
            scratch.as_deref_mut(),
            is_less,
        );
    }

    // Every chunk's output landed `block_len` slots early and the buffer
    // was displaced to the region's end; walk it back to the front.
    if has_buffer {
        let mut s = size;
        while s > 0 {
            s -= 1;
            a.swap(values_at + s, values_at + s - block_len);
        }
    }
}

// The forward sweep over one chunk's selection-sorted blocks. A pending
// fragment of known origin is carried along: a block of the same origin
// flushes it verbatim, a block of the other origin smart-merges with it and
// leaves the leftover as the new fragment. The trailing partial run (plus
// any blocks counted into `tail_blocks`) is merged last. With `scratch` the
// smart and final merges run move-based, behind their own drop guards.
fn merge_blocks<T, F>(
    a: &mut [T],
    chunk_at: usize,
    median: usize,
    block_count: usize,
    block_len: usize,
    has_buffer: bool,
    tail_blocks: usize,
    last: usize,
    mut scratch: Option<&mut [MaybeUninit<T>]>,
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    if block_count == 0 {
        let left_len = tail_blocks * block_len;
        if let Some(scratch) = scratch {
            merge_forward_ext(
                &mut a[chunk_at - block_len..chunk_at + left_len + last],
                block_len,
                left_len,
                scratch,
                is_less,
            );
        } else if has_buffer {
            merge_forward(
                &mut a[chunk_at - block_len..chunk_at + left_len + last],
                block_len,
                left_len,
                is_less,
            );
        } else {
            merge_inplace(&mut a[chunk_at..chunk_at + left_len + last], left_len, is_less);
        }
        return;
    }

    let mut pending_len = block_len;
    let mut pending_from_right = !is_less(&a[0], &a[median]);
    let mut p = block_len;

    for cur in 1..block_count {
        let pending_at = p - pending_len;
        let next_from_right = !is_less(&a[cur], &a[median]);

        if next_from_right == pending_from_right {
            if has_buffer {
                block_swap(
                    a,
                    chunk_at + pending_at - block_len,
                    chunk_at + pending_at,
                    pending_len,
                );
            }
            pending_len = block_len;
        } else {
            let at = chunk_at + pending_at;
            let (len, origin) = if let Some(scratch) = scratch.as_deref_mut() {
                smart_merge_ext(
                    &mut a[at - block_len..at + pending_len + block_len],
                    block_len,
                    pending_len,
                    pending_from_right,
                    scratch,
                    is_less,
                )
            } else if has_buffer {
                smart_merge(
                    &mut a[at - block_len..at + pending_len + block_len],
                    block_len,
                    pending_len,
                    pending_from_right,
                    is_less,
                )
            } else {
                smart_merge_inplace(
                    &mut a[at..at + pending_len + block_len],
                    pending_len,
                    pending_from_right,
                    is_less,
                )
            };
            pending_len = len;
            pending_from_right = origin;
        }

        p += block_len;
    }

    let mut pending_at = p - pending_len;
    if last != 0 {
        let span = block_len * tail_blocks;
        if pending_from_right {
            // The fragment came from the right run, so it sorts after the
            // tail blocks; flush it and merge the tail span instead.
            if has_buffer {
                block_swap(
                    a,
                    chunk_at + pending_at - block_len,
                    chunk_at + pending_at,
                    pending_len,
                );
            }
            pending_at = p;
            pending_len = span;
        } else {
            pending_len += span;
        }

        let at = chunk_at + pending_at;
        if let Some(scratch) = scratch {
            merge_forward_ext(
                &mut a[at - block_len..at + pending_len + last],
                block_len,
                pending_len,
                scratch,
                is_less,
            );
        } else if has_buffer {
            merge_forward(
                &mut a[at - block_len..at + pending_len + last],
                block_len,
                pending_len,
                is_less,
            );
        } else {
            merge_inplace(&mut a[at..at + pending_len + last], pending_len, is_less);
        }
    } else if has_buffer {
        block_swap(
            a,
            chunk_at + pending_at,
            chunk_at + pending_at - block_len,
            pending_len,
        );
    }
}
