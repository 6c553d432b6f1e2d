//! Property-based tests over the codec surface.

use proptest::prelude::*;

use m17::address::Address;
use m17::bits;
use m17::crc;
use m17::golay;
use m17::interleave::interleave;
use m17::ip::IpFrame;
use m17::lsf::LinkSetupFrame;
use m17::puncture::{P1, P2, P3, depuncture, puncture};
use m17::randomize::{randomize, randomize_soft};
use m17::scrambler::{Scrambler, ScramblerMode};
use m17::viterbi::Viterbi;

// A string over the base-40 alphabet, at most 9 characters and not
// ending in space (trailing spaces are zero digits and vanish).
fn callsign() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Z0-9/.-]{0,8}[A-Z0-9/.]").expect("regex")
}

proptest! {
    #[test]
    fn address_round_trip(cs in callsign()) {
        let addr = Address::from_callsign(&cs).expect("valid callsign");
        prop_assert_eq!(addr.callsign().expect("decodable"), cs);
    }

    #[test]
    fn address_ranges(cs in callsign()) {
        let addr = Address::from_callsign(&cs).expect("valid callsign");
        prop_assert!(addr.is_regular());
        let wire = Address::from_bytes(addr.to_bytes());
        prop_assert_eq!(wire, addr);
    }

    #[test]
    fn crc_of_data_with_crc_is_zero(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut v = data.clone();
        v.extend(crc::crc_bytes(&data));
        prop_assert_eq!(crc::crc(&v), 0);
        prop_assert!(crc::verify(&v));
    }

    #[test]
    fn lsf_reserialization_is_identical(
        dst in 0u64..262_144_000_000_000,
        src in 0u64..262_144_000_000_000,
        type_field in any::<u16>(),
        meta in any::<[u8; 14]>(),
    ) {
        let lsf = LinkSetupFrame::new(
            Address::from_u64(dst).expect("in range"),
            Address::from_u64(src).expect("in range"),
            type_field,
            meta,
        );
        let bytes = lsf.to_bytes();
        let parsed = LinkSetupFrame::from_bytes_with_crc(&bytes).expect("own CRC");
        prop_assert_eq!(parsed, lsf);
        prop_assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn ip_frame_round_trip(
        stream_id in any::<u16>(),
        frame_number in any::<u16>(),
        payload in any::<[u8; 16]>(),
        meta in any::<[u8; 14]>(),
    ) {
        let lsf = LinkSetupFrame::new(Address::BROADCAST,
            Address::from_callsign("W2FBI").expect("fixed"), 0x0005, meta);
        let frame = IpFrame { stream_id, lsf, frame_number, payload };
        prop_assert_eq!(IpFrame::from_bytes(&frame.to_bytes()).expect("own CRC"), frame);
    }

    #[test]
    fn interleave_involution(data in proptest::collection::vec(any::<u8>(), 368)) {
        prop_assert_eq!(interleave(&interleave(&data)), data);
    }

    #[test]
    fn randomize_self_inverse(data in proptest::collection::vec(0u8..2, 368)) {
        let mut bits = data.clone();
        randomize(&mut bits);
        randomize(&mut bits);
        prop_assert_eq!(bits, data);
    }

    #[test]
    fn soft_randomize_self_inverse(data in proptest::collection::vec(any::<u16>(), 368)) {
        let mut soft = data.clone();
        randomize_soft(&mut soft);
        randomize_soft(&mut soft);
        prop_assert_eq!(soft, data);
    }

    #[test]
    fn puncture_all_keep_identity(data in proptest::collection::vec(0u8..2, 1..200)) {
        prop_assert_eq!(puncture(&data, &[1, 1, 1, 1]), data);
    }

    #[test]
    fn depuncture_restores_punctured_stream(
        data in proptest::collection::vec(0u8..2, 296usize..297),
    ) {
        // P2 as used by stream frames: positions survive exactly.
        let punctured = puncture(&data, &P2);
        let soft: Vec<u16> = punctured.iter().map(|&b| if b != 0 { 0xFFFF } else { 0 }).collect();
        let restored = depuncture(&soft, &P2, 0x7FFF);
        prop_assert_eq!(restored.len(), data.len());
        let hard = bits::to_hard(&restored);
        for (i, (&orig, got)) in data.iter().zip(hard).enumerate() {
            if i % 12 != 11 {
                prop_assert_eq!(got, orig);
            }
        }
    }

    #[test]
    fn golay_corrects_double_errors(data in 0u16..0x1000, i in 0usize..24, j in 0usize..24) {
        let cw = golay::encode(data);
        let corrupted = cw ^ (1 << i) ^ (1 << j);
        let (decoded, errors) = golay::decode(corrupted).expect("within capacity");
        prop_assert_eq!(decoded, data);
        prop_assert!(errors <= 2);
    }

    #[test]
    fn conv_viterbi_round_trip(data in proptest::collection::vec(any::<u8>(), 1..30)) {
        let nbits = data.len() * 8;
        let coded = m17::convolutional::encode(&bits::unpack(&data, nbits), true);
        let soft = bits::to_soft(&coded);
        let (decoded, cost) = Viterbi::new().decode(&soft).expect("sized for frame");
        prop_assert_eq!(&decoded[..data.len()], &data[..]);
        prop_assert_eq!(cost, 0);
    }

    #[test]
    fn conv_viterbi_punctured_round_trip(data in proptest::collection::vec(any::<u8>(), 26usize..27)) {
        let coded = m17::convolutional::encode(&bits::unpack(&data, 208), true);
        for pattern in [&P1[..], &P2[..], &P3[..]] {
            let punctured = puncture(&coded, pattern);
            let soft = bits::to_soft(&punctured);
            let (decoded, _) = Viterbi::new()
                .decode_punctured(&soft, pattern)
                .expect("sized for frame");
            prop_assert_eq!(&decoded[..data.len()], &data[..]);
        }
    }

    #[test]
    fn scrambler_symmetric(
        data in proptest::collection::vec(any::<u8>(), 0..64),
        seed in proptest::collection::vec(any::<u8>(), 1..4),
    ) {
        for mode in [ScramblerMode::Bit8, ScramblerMode::Bit16, ScramblerMode::Bit24] {
            let s = Scrambler::new(mode);
            prop_assert_eq!(s.decrypt(&s.encrypt(&data, &seed), &seed), data.clone());
        }
    }
}
