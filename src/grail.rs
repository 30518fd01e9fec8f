use core::mem::MaybeUninit;

use crate::{build, combine, keys, merge, smallsort};

// Orchestrates the block-merge pipeline: gather distinct keys at the front,
// build short sorted runs with the keys as working buffer, repeatedly
// combine adjacent runs, then fold the key prefix back in.

// Inputs shorter than this go straight to insertion sort.
const SMALL_SORT_THRESHOLD: usize = 16;

// Block merging needs at least this many distinct values to tag blocks.
const MIN_KEYS: usize = 4;

pub fn grail_sort<T, F>(v: &mut [T], scratch: &mut [MaybeUninit<T>], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    if len < SMALL_SORT_THRESHOLD {
        smallsort::insertion_sort_stable(v, is_less);
        return;
    }

    let mut block_len = 4;
    while block_len * block_len < len {
        block_len *= 2;
    }

    let mut key_count = (len - 1) / block_len + 1;
    let desired = key_count + block_len;
    let found = keys::gather_keys(v, desired, is_less);
    let has_buffer = found >= desired;

    if !has_buffer {
        if found < MIN_KEYS {
            // Too homogeneous to extract a key buffer from.
            merge::lazy_merge_sort(v, is_less);
            return;
        }

        // Shrink the key region to a power of two and give up the separate
        // working buffer; the keys themselves double as the buffer.
        key_count = block_len;
        while key_count > found {
            key_count /= 2;
        }
        block_len = 0;
    }

    let values_at = block_len + key_count;
    let size = len - values_at;
    let buf_len = if has_buffer { block_len } else { key_count };

    build::build_blocks(&mut v[values_at - buf_len..], buf_len, scratch, is_less);

    let mut run_len = buf_len;
    loop {
        run_len *= 2;
        if run_len >= size {
            break;
        }

        let mut pass_block = block_len;
        let mut pass_has_buffer = has_buffer;

        if !has_buffer {
            if key_count > MIN_KEYS && key_count / 8 * key_count >= run_len {
                // Rich enough in keys to promote half of them to a working
                // buffer for this pass.
                pass_block = key_count / 2;
                pass_has_buffer = true;
            } else {
                // Grow the block size as the runs outgrow the key supply,
                // so a chunk never needs more tags than there are keys.
                let mut tags = 1;
                let mut budget = run_len / 2 * key_count;
                while tags < key_count && budget != 0 {
                    tags *= 2;
                    budget /= 8;
                }
                pass_block = (2 * run_len) / tags;
            }
        } else if !scratch.is_empty() {
            // A smaller external buffer can still carry the pass if the
            // blocks are shrunk to fit it, as long as the extra tags stay
            // affordable.
            while pass_block > scratch.len() && pass_block * pass_block > 2 * run_len {
                pass_block /= 2;
            }
        }

        let use_scratch = pass_has_buffer && pass_block <= scratch.len();
        combine::combine_blocks(
            v,
            values_at,
            size,
            run_len,
            pass_block,
            pass_has_buffer,
            if use_scratch { Some(&mut scratch[..]) } else { None },
            is_less,
        );
    }

    // The prefix is pairwise distinct, so an unstable sort of it cannot
    // reorder equal elements.
    smallsort::insertion_sort_unstable(&mut v[..values_at], is_less);
    merge::merge_inplace(v, values_at, is_less);
}
