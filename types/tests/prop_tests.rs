use proptest::prelude::*;

use authwallet_types::{OperationId, ThresholdParams, Timestamp, WalletAddress};

proptest! {
    /// Parsing the displayed form yields the same address.
    #[test]
    fn address_display_parses_back(bytes in prop::array::uniform20(0u8..)) {
        let addr = WalletAddress::new(bytes);
        let parsed: WalletAddress = addr.to_string().parse().unwrap();
        prop_assert_eq!(parsed, addr);
    }

    /// Upper-casing the hex digits never changes which wallet is named.
    #[test]
    fn address_parse_is_case_insensitive(bytes in prop::array::uniform20(0u8..)) {
        let addr = WalletAddress::new(bytes);
        let upper = format!("0x{}", hex_upper(&bytes));
        prop_assert_eq!(WalletAddress::parse(&upper).unwrap(), addr);
    }

    /// Address bincode serialization goes through the string form.
    #[test]
    fn address_bincode_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let addr = WalletAddress::new(bytes);
        let encoded = bincode::serialize(&addr).unwrap();
        let decoded: WalletAddress = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, addr);
    }

    /// OperationId ordering follows the raw counter.
    #[test]
    fn operation_id_ordering(a in 0u64..u64::MAX - 1, b in 0u64..u64::MAX - 1) {
        prop_assert_eq!(OperationId::new(a) < OperationId::new(b), a < b);
        prop_assert!(OperationId::new(a).next() > Some(OperationId::new(a)));
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
    }

    /// Every accepted threshold pair decides a fully voted operation.
    #[test]
    fn valid_thresholds_always_decide(approval in 0u32..6, rejection in 0u32..6) {
        if ThresholdParams::new(approval, rejection).is_ok() {
            for approvals in 0..=3u32 {
                let rejections = 3 - approvals;
                prop_assert!(approvals >= approval || rejections >= rejection);
            }
        }
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
