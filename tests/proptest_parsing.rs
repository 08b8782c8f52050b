use proptest::prelude::*;

use staking_wallet_connect::core::address::{parse_psbt, validate_address};
use staking_wallet_connect::core::errors::WalletError;
use staking_wallet_connect::core::types::Network;

proptest! {
    // Any failure message mentioning a rejection normalizes to
    // ConnectionRejected, everything else stays an extension error.
    #[test]
    fn prop_rejection_classification(
        prefix in "[a-zA-Z ]{0,20}",
        suffix in "[a-zA-Z ]{0,20}",
    ) {
        let rejected = format!("{}rejected{}", prefix, suffix);
        prop_assert!(WalletError::from_extension_failure("OKX Wallet", &rejected).is_rejection());

        let other = format!("{}{}", prefix, suffix);
        if !other.contains("rejected") {
            prop_assert!(!WalletError::from_extension_failure("OKX Wallet", &other).is_rejection());
        }
    }

    // Strings this short cannot carry a valid checksum on any network.
    #[test]
    fn prop_short_strings_are_never_addresses(address in "[a-z0-9]{0,10}") {
        prop_assert!(validate_address(Network::Mainnet, &address).is_err());
        prop_assert!(validate_address(Network::Signet, &address).is_err());
    }

    // Random hex never parses as a PSBT (no magic), and non-hex input
    // fails before deserialization.
    #[test]
    fn prop_garbage_never_parses_as_psbt(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        // "psbt\xff" magic makes real payloads; random prefixes never match
        prop_assume!(!bytes.starts_with(b"psbt"));
        let as_hex = hex::encode(&bytes);
        prop_assert!(parse_psbt(&as_hex).is_err());
    }

    #[test]
    fn prop_non_hex_psbt_input_is_rejected(input in "[g-z]{1,32}") {
        prop_assert!(matches!(parse_psbt(&input), Err(WalletError::InvalidInput(_))));
    }
}
