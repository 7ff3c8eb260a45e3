//! Property tests: seal/open must round-trip for arbitrary plaintexts and
//! AAD, and must never round-trip across mismatched keys or AAD.

use proptest::prelude::*;
use tokenvault_crypto::{open_envelope, seal_envelope};

proptest! {
    #[test]
    fn roundtrips_for_any_plaintext(plaintext in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let key = [0x42u8; 32];
        let env = seal_envelope(&key, &plaintext, Some(b"org=acme\x00email")).unwrap();
        let opened = open_envelope(&key, &env, Some(b"org=acme\x00email")).unwrap();
        prop_assert_eq!(opened, plaintext);
    }

    #[test]
    fn wrong_aad_never_opens(plaintext in proptest::collection::vec(any::<u8>(), 0..256), tamper in any::<u8>()) {
        let key = [0x11u8; 32];
        let env = seal_envelope(&key, &plaintext, Some(b"org=acme")).unwrap();
        let mut wrong_aad = b"org=acme".to_vec();
        wrong_aad.push(tamper);
        prop_assert!(open_envelope(&key, &env, Some(&wrong_aad)).is_err());
    }

    #[test]
    fn tampered_ciphertext_never_opens(plaintext in proptest::collection::vec(any::<u8>(), 1..256), flip_index in 0usize..256) {
        let key = [0x77u8; 32];
        let mut env = seal_envelope(&key, &plaintext, None).unwrap();
        let idx = flip_index % env.len();
        env[idx] ^= 0x01;
        prop_assert!(open_envelope(&key, &env, None).is_err());
    }
}
