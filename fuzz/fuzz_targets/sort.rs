#![no_main]

use libfuzzer_sys::fuzz_target;

use grailsort::sort;

fuzz_target!(|data: &[u8]| {

    let mut vec: Vec<u8> = data.to_vec();
    sort(&mut vec);

    for window in vec.windows(2) {
        assert!(window[0] <= window[1]);
    }

    let mut counts = [0usize; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    for &b in &vec {
        counts[b as usize] -= 1;
    }
    assert!(counts.iter().all(|&c| c == 0));

});
