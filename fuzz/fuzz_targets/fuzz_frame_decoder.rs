//! Fuzz target: `decode_frame`
//!
//! Feeds arbitrary 5-byte frames to the DHT22 frame decoder and asserts it
//! never panics, that a checksum mismatch always wins over range checks,
//! and that accepted values are finite and inside the sensor range.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use tempwatch::error::DecodeError;
use tempwatch::sensors::dht22::{checksum, decode_frame, in_range, Frame};

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = <Frame>::try_from(data.get(..5).unwrap_or(&[])) else {
        return;
    };

    match decode_frame(&frame) {
        Ok((t, h)) => {
            assert_eq!(checksum(&frame), frame[4]);
            assert!(in_range(t, h), "accepted out-of-range value t={} h={}", t, h);
        }
        Err(DecodeError::ChecksumMismatch) => assert_ne!(checksum(&frame), frame[4]),
        Err(DecodeError::OutOfRange) => assert_eq!(checksum(&frame), frame[4]),
        Err(DecodeError::Timeout(_)) => panic!("pure decode cannot time out"),
    }
});
