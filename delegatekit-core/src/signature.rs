//! Owner signatures: meta-execution digests, signer recovery, and the
//! signature-validation result code.

use alloy_core::sol_types::SolValue;
use alloy_primitives::{keccak256, uint, Address, Bytes, Signature, B256, U256};

use crate::error::{AccountError, AccountResult};

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Result code for a signature the owner produced.
pub const VALID_SIGNATURE_MAGIC: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Result code for any other signature.
pub const INVALID_SIGNATURE_MAGIC: [u8; 4] = [0xff; 4];

/// Half the secp256k1 group order. Signatures with a larger `s` are malleable twins.
const SECP256K1N_HALF: U256 =
    uint!(0x7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0_U256);

/// Digest the owner signs to authorize a meta-execution.
///
/// `keccak256(target ++ value ++ payload ++ nonce)` with the packed ABI encoding of
/// `(address, uint256, bytes, uint256)`.
#[must_use]
pub fn meta_digest(target: Address, value: U256, payload: &Bytes, nonce: U256) -> B256 {
    keccak256((target, value, payload.clone(), nonce).abi_encode_packed())
}

/// Recovers the address that produced `signature` over `digest`.
///
/// `v` may be given as 0/1 or 27/28.
///
/// # Errors
/// `SignatureInvalid` if the signature has the wrong length, an unknown `v`, a
/// high-order `s`, or does not recover to a point.
pub fn recover_signer(digest: &B256, signature: &[u8]) -> AccountResult<Address> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(AccountError::SignatureInvalid(format!(
            "expected {SIGNATURE_LENGTH} bytes, got {}",
            signature.len()
        )));
    }
    let r = U256::from_be_slice(&signature[..32]);
    let s = U256::from_be_slice(&signature[32..64]);
    let v = match signature[64] {
        v @ (0 | 1) => v + 27,
        v => v,
    };
    if v != 27 && v != 28 {
        return Err(AccountError::SignatureInvalid(format!("unsupported v {v}")));
    }
    if s > SECP256K1N_HALF {
        return Err(AccountError::SignatureInvalid("high s value".to_string()));
    }

    Signature::new(r, s, v == 28)
        .recover_address_from_prehash(digest)
        .map_err(|e| AccountError::SignatureInvalid(e.to_string()))
}

/// Result code for `signature` over `hash` checked against `owner`. Never fails: any
/// problem with the signature yields [`INVALID_SIGNATURE_MAGIC`].
#[must_use]
pub fn signature_result_code(owner: Address, hash: &B256, signature: &[u8]) -> [u8; 4] {
    match recover_signer(hash, signature) {
        Ok(signer) if signer == owner => VALID_SIGNATURE_MAGIC,
        Ok(signer) => {
            log::debug!("signature by {signer} is not the owner's");
            INVALID_SIGNATURE_MAGIC
        }
        Err(err) => {
            log::debug!("rejecting signature 0x{}: {err}", hex::encode(signature));
            INVALID_SIGNATURE_MAGIC
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use alloy_primitives::{address, b256};

    use super::*;

    fn signer() -> PrivateKeySigner {
        PrivateKeySigner::from_bytes(&b256!(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
        ))
        .unwrap()
    }

    #[test]
    fn test_meta_digest_is_packed_encoding() {
        let target = address!("0x00000000000000000000000000000000000000aa");
        let payload = Bytes::from_static(&[0xde, 0xad]);
        let mut packed = Vec::new();
        packed.extend_from_slice(target.as_slice());
        packed.extend_from_slice(&U256::from(7).to_be_bytes::<32>());
        packed.extend_from_slice(&payload);
        packed.extend_from_slice(&U256::from(1).to_be_bytes::<32>());

        assert_eq!(
            meta_digest(target, U256::from(7), &payload, U256::from(1)),
            keccak256(packed)
        );
        assert_ne!(
            meta_digest(target, U256::from(7), &payload, U256::from(1)),
            meta_digest(target, U256::from(7), &payload, U256::from(2))
        );
    }

    #[test]
    fn test_recover_signer_accepts_both_v_encodings() {
        let signer = signer();
        let digest = keccak256(b"delegate");
        let mut bytes = signer.sign_hash_sync(&digest).unwrap().as_bytes();

        assert_eq!(recover_signer(&digest, &bytes).unwrap(), signer.address());
        bytes[64] -= 27;
        assert_eq!(recover_signer(&digest, &bytes).unwrap(), signer.address());
    }

    #[test]
    fn test_recover_signer_rejects_malformed_input() {
        let digest = keccak256(b"delegate");
        let bytes = signer().sign_hash_sync(&digest).unwrap().as_bytes();

        assert!(matches!(
            recover_signer(&digest, &bytes[..64]),
            Err(AccountError::SignatureInvalid(_))
        ));

        let mut bad_v = bytes;
        bad_v[64] = 29;
        assert!(recover_signer(&digest, &bad_v).is_err());

        let mut high_s = bytes;
        high_s[32..64].copy_from_slice(&[0xff; 32]);
        assert!(recover_signer(&digest, &high_s).is_err());
    }

    #[test]
    fn test_signature_result_code() {
        let signer = signer();
        let digest = keccak256(b"message");
        let bytes = signer.sign_hash_sync(&digest).unwrap().as_bytes();

        assert_eq!(
            signature_result_code(signer.address(), &digest, &bytes),
            VALID_SIGNATURE_MAGIC
        );
        assert_eq!(
            signature_result_code(Address::repeat_byte(1), &digest, &bytes),
            INVALID_SIGNATURE_MAGIC
        );
        assert_eq!(
            signature_result_code(signer.address(), &digest, &[0u8; 3]),
            INVALID_SIGNATURE_MAGIC
        );
    }
}
