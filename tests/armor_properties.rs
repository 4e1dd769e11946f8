//! Property tests for armor normalization.

use proptest::prelude::*;
use wxcrypt::{armor_encode, normalize, ArmorKind};

fn kind_strategy() -> impl Strategy<Value = ArmorKind> {
    prop_oneof![
        Just(ArmorKind::Message),
        Just(ArmorKind::PublicKey),
        Just(ArmorKind::PrivateKey),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normalize_is_idempotent(data in prop::collection::vec(any::<u8>(), 1..512), kind in kind_strategy()) {
        let text = armor_encode(kind, &data).unwrap().to_armored_string();
        let once = normalize(&text).unwrap();
        let twice = normalize(&once.to_armored_string()).unwrap();
        prop_assert_eq!(once.to_armored_string(), text);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn bytes_survive_armoring(data in prop::collection::vec(any::<u8>(), 1..1024)) {
        let block = normalize(&armor_encode(ArmorKind::Message, &data).unwrap().to_armored_string()).unwrap();
        prop_assert_eq!(block.decode().unwrap(), data);
    }

    #[test]
    fn indentation_and_blank_lines_are_ignored(
        data in prop::collection::vec(any::<u8>(), 1..512),
        indent in 0usize..8,
        blank_every in 1usize..5,
    ) {
        let clean = armor_encode(ArmorKind::Message, &data).unwrap().to_armored_string();
        let mut messy = String::new();
        for (i, line) in clean.lines().enumerate() {
            messy.push_str(&" ".repeat(indent));
            messy.push_str(line);
            messy.push_str("\r\n");
            if i % blank_every == 0 {
                messy.push_str("  \n");
            }
        }
        prop_assert_eq!(normalize(&messy).unwrap().to_armored_string(), clean);
    }
}
