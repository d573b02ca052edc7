//! Property tests for constant encoding.

use proptest::prelude::*;

use crate::translator::constants::{decode_push_int, encode_push_data, encode_push_int};

/// Integers biased toward the encoding boundaries.
fn boundary_i64() -> impl Strategy<Value = i64> {
    prop_oneof![
        Just(-1i64),
        Just(0i64),
        Just(16i64),
        Just(17i64),
        Just(i64::from(i8::MIN)),
        Just(i64::from(i8::MAX) + 1),
        Just(i64::from(i16::MIN)),
        Just(i64::from(i16::MAX) + 1),
        Just(i64::from(i32::MIN)),
        Just(i64::from(i32::MAX) + 1),
        Just(i64::MIN),
        Just(i64::MAX),
        any::<i64>(),
    ]
}

/// The shortest encoding any conforming emitter could produce for `value`.
fn minimal_len(value: i64) -> usize {
    if (-1..=16).contains(&value) {
        1
    } else if i8::try_from(value).is_ok() {
        2
    } else if i16::try_from(value).is_ok() {
        3
    } else if i32::try_from(value).is_ok() {
        5
    } else {
        9
    }
}

proptest! {
    #[test]
    fn integer_pushes_decode_to_their_value(value in boundary_i64()) {
        let insn = encode_push_int(value).unwrap();
        prop_assert_eq!(decode_push_int(&insn), Some(value));
    }

    #[test]
    fn integer_pushes_are_minimal(value in boundary_i64()) {
        let insn = encode_push_int(value).unwrap();
        prop_assert_eq!(insn.byte_len() as usize, minimal_len(value));
    }

    #[test]
    fn data_pushes_carry_their_payload(data in proptest::collection::vec(any::<u8>(), 0..600)) {
        let insn = encode_push_data(data.clone()).unwrap();
        let bytes = insn.to_bytes();
        let prefix_width = if data.len() < 0x100 { 1 } else { 2 };
        prop_assert_eq!(bytes.len(), 1 + prefix_width + data.len());
        prop_assert_eq!(&bytes[1 + prefix_width..], data.as_slice());
    }
}
