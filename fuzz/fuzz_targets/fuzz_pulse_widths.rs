//! Fuzz target: `pack_bits`
//!
//! Interprets the input as little-endian u32 pulse widths (any count) and
//! checks that packing is threshold-exact for the first 40 and ignores the
//! rest.
//!
//! cargo fuzz run fuzz_pulse_widths

#![no_main]

use libfuzzer_sys::fuzz_target;
use tempwatch::sensors::dht22::{pack_bits, BIT_THRESHOLD_US, FRAME_BITS};

fuzz_target!(|data: &[u8]| {
    let widths: Vec<u32> = data
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let frame = pack_bits(widths.iter().copied());

    for i in 0..FRAME_BITS {
        let bit = frame[i / 8] & (1 << (7 - i % 8)) != 0;
        let expected = widths.get(i).is_some_and(|w| *w > BIT_THRESHOLD_US);
        assert_eq!(bit, expected, "bit {}", i);
    }
});
