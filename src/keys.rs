use crate::smallsort::{lower_bound, rotate, rotate_right_one};

/// Gathers up to `desired` pairwise-distinct values into a sorted prefix of
/// `v`, returning how many were found.
///
/// A sorted window of the distinct values found so far is slid rightward
/// through the scan: when `v[i]` is not already in the window, the window is
/// rotated up to abut `i` and the new value is rotated into its slot. The
/// elements passed over keep their relative order, so each distinct value in
/// the prefix is the first occurrence of its equivalence class and a final
/// tie-to-the-left merge restores full stability.
pub fn gather_keys<T, F>(v: &mut [T], desired: usize, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    let mut first_key = 0;
    let mut found = 1;

    let mut i = 1;
    while i < len && found < desired {
        let target = lower_bound(&v[first_key..first_key + found], &v[i], is_less);

        // `lower_bound` lands on the first window slot not below `v[i]`; the
        // value is new iff that slot is past the end or strictly above.
        if target == found || is_less(&v[i], &v[first_key + target]) {
            rotate(&mut v[first_key..i], found);
            first_key = i - found;
            rotate_right_one(&mut v[first_key + target..=i]);
            found += 1;
        }

        i += 1;
    }

    rotate(&mut v[..first_key + found], first_key);
    found
}
