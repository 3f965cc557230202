//! Integration tests for Reed-Solomon encoding and decoding
//!
//! These pin the codec's core properties: encode/decode round trips, the
//! floor(ec/2) correction bound, honest reporting of uncorrectable blocks,
//! and the standard QR test vector.

use gridcode::{DATA_MATRIX_FIELD, EccError, QR_FIELD, RsDecoder, RsEncoder};

/// Deterministic byte stream for building test blocks
fn pseudo_bytes(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2654435761).max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 8) as u8
        })
        .collect()
}

#[test]
fn test_round_trip_across_block_shapes() {
    let mut encoder = RsEncoder::new(&QR_FIELD);
    let decoder = RsDecoder::new(&QR_FIELD);

    for (data_len, ec_count) in [(1, 2), (4, 7), (16, 10), (55, 22), (223, 32)] {
        let data = pseudo_bytes(data_len, (data_len + ec_count) as u32);
        let mut block = encoder.encode(&data, ec_count);
        assert_eq!(block.len(), data_len + ec_count);

        let corrected = decoder.decode(&mut block, ec_count).unwrap();
        assert_eq!(corrected, 0, "clean block must need zero corrections");
        assert_eq!(&block[..data_len], &data[..]);
    }
}

#[test]
fn test_correction_bound_is_reached() {
    let mut encoder = RsEncoder::new(&QR_FIELD);
    let decoder = RsDecoder::new(&QR_FIELD);

    for ec_count in [4usize, 7, 10, 16, 30] {
        let data = pseudo_bytes(20, ec_count as u32);
        let reference = encoder.encode(&data, ec_count);

        // Corrupt exactly floor(ec/2) distinct symbols
        let errors = ec_count / 2;
        let mut block = reference.clone();
        for e in 0..errors {
            // Spaced so every corrupted position is distinct
            let pos = e * 3 + 1;
            block[pos] ^= 0x80 | (e as u8 + 1);
        }

        let corrected = decoder
            .decode(&mut block, ec_count)
            .unwrap_or_else(|_| panic!("{} errors with {} ec codewords must correct", errors, ec_count));
        assert_eq!(corrected, errors);
        assert_eq!(block, reference);
    }
}

#[test]
fn test_beyond_bound_never_fakes_success() {
    let mut encoder = RsEncoder::new(&QR_FIELD);
    let decoder = RsDecoder::new(&QR_FIELD);

    for ec_count in [4usize, 8, 10] {
        let data = pseudo_bytes(12, 77 + ec_count as u32);
        let reference = encoder.encode(&data, ec_count);

        // One error past the bound, several corruption shapes
        let errors = ec_count / 2 + 1;
        for seed in 0..8u32 {
            let noise = pseudo_bytes(errors, seed + 1000);
            let mut block = reference.clone();
            for (e, n) in noise.iter().enumerate() {
                let pos = (e * 3 + seed as usize) % block.len();
                block[pos] ^= n | 1;
            }
            if block == reference {
                continue; // corruption cancelled itself out
            }

            match decoder.decode(&mut block, ec_count) {
                Err(EccError::Uncorrectable) => {}
                Ok(_) => {
                    // Permitted only when a valid (if different) codeword
                    // was hit: the output must be syndrome-clean
                    let mut check = block.clone();
                    assert_eq!(decoder.decode(&mut check, ec_count), Ok(0));
                }
            }
        }
    }
}

#[test]
fn test_standard_qr_vector_with_damage() {
    let data = [
        0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC,
        0x11,
    ];
    let expected_ec = [0xA5, 0x24, 0xD4, 0xC1, 0xED, 0x36, 0xC7, 0x87, 0x2C, 0x55];

    let mut encoder = RsEncoder::new(&QR_FIELD);
    let encoded = encoder.encode(&data, 10);
    assert_eq!(&encoded[16..], &expected_ec);

    // Corrupt 5 of the 26 bytes (the correction bound for 10 ec codewords)
    let decoder = RsDecoder::new(&QR_FIELD);
    let mut block = encoded.clone();
    for (pos, mask) in [(0, 0xFF), (5, 0x0F), (12, 0x55), (19, 0xA0), (25, 0x3C)] {
        block[pos] ^= mask;
    }
    let corrected = decoder.decode(&mut block, 10).unwrap();
    assert_eq!(corrected, 5);
    assert_eq!(&block[..16], &data);
}

#[test]
fn test_fields_are_not_interchangeable() {
    // A block encoded in the QR field should not decode cleanly in the
    // Data Matrix field: the redundancy is field-specific
    let data = pseudo_bytes(10, 5);
    let mut qr_encoder = RsEncoder::new(&QR_FIELD);
    let mut block = qr_encoder.encode(&data, 8);

    let dm_decoder = RsDecoder::new(&DATA_MATRIX_FIELD);
    match dm_decoder.decode(&mut block, 8) {
        Err(EccError::Uncorrectable) => {}
        Ok(corrections) => assert!(corrections > 0, "cross-field block cannot be clean"),
    }
}

#[test]
fn test_data_matrix_round_trip_with_damage() {
    let data = pseudo_bytes(14, 99);
    let mut encoder = RsEncoder::new(&DATA_MATRIX_FIELD);
    let decoder = RsDecoder::new(&DATA_MATRIX_FIELD);

    let reference = encoder.encode(&data, 10);
    let mut block = reference.clone();
    for pos in [0usize, 6, 11, 17, 23] {
        block[pos] ^= 0x42;
    }
    let corrected = decoder.decode(&mut block, 10).unwrap();
    assert_eq!(corrected, 5);
    assert_eq!(block, reference);
}
