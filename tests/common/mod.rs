//! Shared key generation for the integration tests.

#![allow(dead_code)]

use pgp::composed::{Deserializable, KeyType, SecretKeyParamsBuilder, SignedPublicKey, SubkeyParamsBuilder};
use pgp::crypto::ecc_curve::ECCCurve;
use pgp::packet::{Signature, SubpacketData};
use rand::thread_rng;

pub const TEST_PASSWORD: &str = "test-password-123";
pub const TEST_UID: &str = "Test User <test@example.com>";

/// An armored key pair.
pub struct TestKey {
    pub public_key: String,
    pub secret_key: String,
}

/// Which subkeys a generated key carries besides its primary.
#[derive(Clone, Copy)]
pub enum Layout {
    /// EdDSA primary with an ECDH Curve25519 encryption subkey
    Cv25519,
    /// RSA 2048 primary with an RSA 2048 encryption subkey
    Rsa2k,
    /// EdDSA primary with a signing subkey only
    SigningOnly,
}

pub fn generate(layout: Layout, password: &str) -> TestKey {
    let mut rng = thread_rng();

    let (primary_type, subkey_type, subkey_encrypts) = match layout {
        Layout::Cv25519 => (
            KeyType::Ed25519Legacy,
            KeyType::ECDH(ECCCurve::Curve25519),
            true,
        ),
        Layout::Rsa2k => (KeyType::Rsa(2048), KeyType::Rsa(2048), true),
        Layout::SigningOnly => (KeyType::Ed25519Legacy, KeyType::Ed25519Legacy, false),
    };

    let mut sub_builder = SubkeyParamsBuilder::default();
    sub_builder
        .key_type(subkey_type)
        .can_encrypt(subkey_encrypts)
        .can_sign(!subkey_encrypts)
        .can_authenticate(false);
    if !password.is_empty() {
        sub_builder.passphrase(Some(password.to_string()));
    }

    let mut key_params = SecretKeyParamsBuilder::default();
    key_params
        .key_type(primary_type)
        .can_certify(true)
        .can_sign(true)
        .can_encrypt(false)
        .primary_user_id(TEST_UID.to_string())
        .subkeys(vec![sub_builder.build().unwrap()]);
    if !password.is_empty() {
        key_params.passphrase(Some(password.to_string()));
    }

    let secret_key = key_params
        .build()
        .unwrap()
        .generate(&mut rng)
        .unwrap()
        .sign(&mut rng, &password.into())
        .unwrap();
    let public_key = secret_key.signed_public_key();

    TestKey {
        public_key: public_key.to_armored_string(None.into()).unwrap(),
        secret_key: secret_key.to_armored_string(None.into()).unwrap(),
    }
}

/// Curve25519 key protected by [`TEST_PASSWORD`].
pub fn protected_key() -> TestKey {
    generate(Layout::Cv25519, TEST_PASSWORD)
}

/// Curve25519 key stored without a passphrase.
pub fn unprotected_key() -> TestKey {
    generate(Layout::Cv25519, "")
}

/// Re-armor a public key with the key flags subpackets removed from its
/// subkey binding signatures. The rebuilt signatures no longer verify.
pub fn strip_subkey_flags(public_key: &str) -> String {
    let (mut key, _headers) = SignedPublicKey::from_string(public_key).unwrap();
    for subkey in &mut key.public_subkeys {
        for sig in &mut subkey.signatures {
            let mut config = sig.config().unwrap().clone();
            config
                .hashed_subpackets
                .retain(|packet| !matches!(packet.data, SubpacketData::KeyFlags(_)));
            let rebuilt = Signature::from_config(
                config,
                sig.signed_hash_value().unwrap(),
                sig.signature().unwrap().clone(),
            )
            .unwrap();
            *sig = rebuilt;
        }
    }
    key.to_armored_string(None.into()).unwrap()
}
