//! Fixed-key vectors for deterministic attestation signing.
//!
//! Each vector pins a root value, its digest, and the exact `r || s` each
//! backend produces under [`TEST_VECTOR_PRIVATE_KEY`].

use credroot_core::FieldElement;

/// Fixed private key for test vectors (32 bytes)
///
/// ⚠️ WARNING: DO NOT USE IN PRODUCTION ⚠️
///
/// This key is publicly known and only exists so vectors are reproducible.
/// It is below both subgroup orders, so it is valid for either backend.
pub const TEST_VECTOR_PRIVATE_KEY: [u8; 32] = [
    0x05, 0x61, 0xb1, 0x9d, 0xef, 0xfd, 0x5a, 0x60, 0xba, 0x84, 0x4a, 0xf4, 0x92, 0xec, 0x2c, 0xc4,
    0x44, 0x49, 0xc5, 0x69, 0x7b, 0x32, 0x69, 0x19, 0x70, 0x3b, 0xac, 0x03, 0x1c, 0xae, 0x7f, 0x60,
];

/// `x || y` of `TEST_VECTOR_PRIVATE_KEY * G` on Baby Jubjub.
pub const FIELD_ECDSA_PUBLIC_KEY_HEX: &str = "284d462f372909041cbed0dad33d038f88802dbc924d1e28c005dddc241c34972e1ddfd979b9ca80312db924fe5b91461e8251ae5e810b1eb07cfc12d93e0fa9";

/// Compressed SEC1 public key for `TEST_VECTOR_PRIVATE_KEY` on P-256.
pub const P256_ECDSA_PUBLIC_KEY_HEX: &str =
    "02e3b0d6f552e81977c2df67f88ae502ef5fd7a3e1e49f9b99d9b17ad4f3f3303d";

pub struct RootTestVector {
    pub name: &'static str,
    pub root: FieldElement,
    pub expected_digest_hex: &'static str,
    pub expected_field_signature_hex: &'static str,
    pub expected_p256_signature_hex: &'static str,
}

pub fn get_test_vectors() -> Vec<RootTestVector> {
    vec![
        RootTestVector {
            name: "vector_1_zero_root",
            root: FieldElement::zero(),
            expected_digest_hex: "0000000000000000000000000000000000000000000000000000000000000000",
            expected_field_signature_hex: "024fb91ceb78e8c0983a5853a8354e9125f01088be36eef81f60f6f676ba5b240286a7024fba5b43e2383aacf9c530f1e8dfe1dbbd7a5fc392d7d8119e1dd72c",
            expected_p256_signature_hex: "45229ce2ea3eae29bb0aaf5a3a852390fddb2d9ec4aa50bd35596d8ba058b04ce0c9bd5ccd376e0d8de80c694075ba71d9ca9b9c97ca4a1c684fb87c176fd727",
        },
        RootTestVector {
            name: "vector_2_small_root",
            root: FieldElement::from(0x2au64),
            expected_digest_hex: "000000000000000000000000000000000000000000000000000000000000002a",
            expected_field_signature_hex: "02a3f62b0d21c2fb4fe3b90eb2416bc412bdc0c28e28cbf1a3c3db1d59b10aa602e22de021ff0d6593b0bb355d01d0645903444f69995268d31ec7cda6f59b42",
            expected_p256_signature_hex: "a1cb19bc71710646dfecd01ee1382415a770cda7b45d12dc56fa457b7f0982d58df70092c615e893bff2f17164512667f4385e1fae49bcf666c0b45acc3940a7",
        },
        RootTestVector {
            name: "vector_3_wide_root",
            root: FieldElement::from(u128::MAX),
            expected_digest_hex: "00000000000000000000000000000000ffffffffffffffffffffffffffffffff",
            expected_field_signature_hex: "05396f7452842a4ad006ac4e5d4455527a2ae115fda198bbcf6a99fdf928688305a64dca87070e5358d58f4f8e4070c405150d04373e6f50c14889ba1fb196fd",
            expected_p256_signature_hex: "9f4d110aefde4eab6940ed44363089520ff25a48c1eaf83b425629e2c987843051ec07225e921b9f6b208b5625db0ed489a44db98b3453650a3f9c4b6277a181",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::RootDigest;
    use crate::domain::DomainParameters;
    use crate::signer::{AttestationSigner, AttestationVerifier, RootSigner, RootVerifier};
    use credroot_core::SignatureBackend;
    use std::sync::Arc;

    #[test]
    fn test_vectors_are_deterministic() {
        let domain = Arc::new(DomainParameters::baby_jubjub().unwrap());

        for backend in [SignatureBackend::FieldEcdsa, SignatureBackend::P256Ecdsa] {
            let signer =
                AttestationSigner::new(backend, &TEST_VECTOR_PRIVATE_KEY, domain.clone()).unwrap();
            let verifier = AttestationVerifier::new(backend, domain.clone());

            for vector in get_test_vectors() {
                let digest = RootDigest::from_root(&vector.root);
                assert_eq!(hex::encode(digest.as_bytes()), vector.expected_digest_hex);

                let first = signer.sign_digest(&digest).unwrap();
                let second = signer.sign_digest(&digest).unwrap();

                println!("\n=== Test Vector: {} ({}) ===", vector.name, backend);
                println!("Signature:  {}", first.to_hex());
                println!("Public Key: {}", signer.public_key().to_hex());

                assert_eq!(first, second, "signature should be deterministic for {}", vector.name);
                let (expected_signature, expected_key) = match backend {
                    SignatureBackend::FieldEcdsa => (
                        vector.expected_field_signature_hex,
                        FIELD_ECDSA_PUBLIC_KEY_HEX,
                    ),
                    SignatureBackend::P256Ecdsa => (
                        vector.expected_p256_signature_hex,
                        P256_ECDSA_PUBLIC_KEY_HEX,
                    ),
                };
                assert_eq!(first.to_hex(), expected_signature, "signature for {}", vector.name);
                assert_eq!(signer.public_key().to_hex(), expected_key);
                assert!(verifier
                    .verify_digest(&digest, &first, &signer.public_key())
                    .unwrap());
            }
        }
    }

    #[test]
    fn test_backends_sign_identical_digest() {
        let domain = Arc::new(DomainParameters::baby_jubjub().unwrap());
        let field = AttestationSigner::new(
            SignatureBackend::FieldEcdsa,
            &TEST_VECTOR_PRIVATE_KEY,
            domain.clone(),
        )
        .unwrap();
        let p256 = AttestationSigner::new(
            SignatureBackend::P256Ecdsa,
            &TEST_VECTOR_PRIVATE_KEY,
            domain.clone(),
        )
        .unwrap();

        let root = FieldElement::from(0x2au64);
        let digest = RootDigest::from_root(&root);

        // Each backend accepts its own signature over the shared digest.
        let field_sig = field.sign_root(&root).unwrap();
        let p256_sig = p256.sign_root(&root).unwrap();
        assert!(AttestationVerifier::new(SignatureBackend::FieldEcdsa, domain.clone())
            .verify_digest(&digest, &field_sig, &field.public_key())
            .unwrap());
        assert!(AttestationVerifier::new(SignatureBackend::P256Ecdsa, domain)
            .verify_digest(&digest, &p256_sig, &p256.public_key())
            .unwrap());

        assert_eq!(field.public_key().bytes.len(), 64);
        assert_eq!(p256.public_key().bytes.len(), 33);
    }
}
