//! Ed25519 签名身份：地址派生与交易意图签名。

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signer, SigningKey};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::ptb::ObjectId;

pub const ED25519_FLAG: u8 = 0x00;
pub const SECRET_KEY_LENGTH: usize = 32;
pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 1 + 64 + PUBLIC_KEY_LENGTH;

/// TransactionData 意图前缀：scope=0, version=0, app=Sui(0)。
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

type Blake2b256 = Blake2b<U32>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("私钥不是合法的 base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("私钥长度 {0} 字节不受支持（需 32 字节，或带 0x00 标记的 33 字节）")]
    Length(usize),
    #[error("仅支持 Ed25519 私钥，实际方案标记 0x{0:02x}")]
    Scheme(u8),
}

pub struct SigningIdentity {
    key: SigningKey,
    address: ObjectId,
}

impl SigningIdentity {
    /// 解析 base64 私钥。64 字节输入视为 `secret || public`，只取前 32 字节。
    pub fn from_base64(encoded: &str) -> Result<Self, IdentityError> {
        let raw = Zeroizing::new(STANDARD.decode(encoded.trim())?);
        let secret = match raw.len() {
            SECRET_KEY_LENGTH => &raw[..],
            33 => {
                if raw[0] != ED25519_FLAG {
                    return Err(IdentityError::Scheme(raw[0]));
                }
                &raw[1..]
            }
            64 => &raw[..SECRET_KEY_LENGTH],
            other => return Err(IdentityError::Length(other)),
        };
        let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        seed.copy_from_slice(secret);
        Ok(Self::from_seed(&seed))
    }

    /// 生成临时密钥，仅用于本地网络演示。
    pub fn generate() -> Self {
        let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        rand::rng().fill_bytes(&mut seed[..]);
        Self::from_seed(&seed)
    }

    fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        let key = SigningKey::from_bytes(seed);
        let address = derive_address(key.verifying_key().as_bytes());
        Self { key, address }
    }

    pub fn address(&self) -> ObjectId {
        self.address
    }

    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.key.verifying_key().to_bytes()
    }

    /// 对 BCS 编码的 TransactionData 签名，返回 `base64(flag || sig || pk)`。
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let digest = intent_digest(tx_bytes);
        let signature = self.key.sign(&digest);

        let mut serialized = Vec::with_capacity(SIGNATURE_LENGTH);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(&self.public_key_bytes());
        STANDARD.encode(serialized)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

pub fn derive_address(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> ObjectId {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    ObjectId(bytes)
}

pub fn intent_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(TRANSACTION_INTENT);
    hasher.update(tx_bytes);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    use super::*;

    // RFC 8032 test 1
    const SECRET_B64: &str = "nWGxne/9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A=";
    const FLAGGED_SECRET_B64: &str = "AJ1hsZ3v/VpguoRK9JLsLMREScVpezJpGXA7rAMcrn9g";
    const PUBLIC_KEY_HEX: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
    const ADDRESS_HEX: &str = "0x304af458e90e97c841685b8cbbc59b909f3e2cf150df590ada4c81452c29737d";

    #[test]
    fn address_matches_known_vector() {
        let identity = SigningIdentity::from_base64(SECRET_B64).expect("raw secret");
        assert_eq!(hex::encode(identity.public_key_bytes()), PUBLIC_KEY_HEX);
        assert_eq!(identity.address().to_string(), ADDRESS_HEX);

        let flagged = SigningIdentity::from_base64(FLAGGED_SECRET_B64).expect("flagged secret");
        assert_eq!(flagged.address(), identity.address());
    }

    #[test]
    fn rejects_unsupported_key_material() {
        let short = STANDARD.encode([7u8; 16]);
        assert!(matches!(
            SigningIdentity::from_base64(&short),
            Err(IdentityError::Length(16))
        ));

        let mut secp = vec![0x01u8];
        secp.extend_from_slice(&[7u8; 32]);
        assert!(matches!(
            SigningIdentity::from_base64(&STANDARD.encode(secp)),
            Err(IdentityError::Scheme(0x01))
        ));

        assert!(matches!(
            SigningIdentity::from_base64("not base64!"),
            Err(IdentityError::Base64(_))
        ));
    }

    #[test]
    fn signature_layout_is_flag_sig_pubkey() {
        let identity = SigningIdentity::from_base64(SECRET_B64).expect("identity");
        let tx_bytes = b"abc";
        let encoded = identity.sign_transaction(tx_bytes);
        let raw = STANDARD.decode(encoded).expect("signature base64");

        assert_eq!(raw.len(), SIGNATURE_LENGTH);
        assert_eq!(raw[0], ED25519_FLAG);
        assert_eq!(&raw[65..], &identity.public_key_bytes());

        let verifying = VerifyingKey::from_bytes(&identity.public_key_bytes()).expect("pk");
        let signature = Signature::from_slice(&raw[1..65]).expect("signature bytes");
        verifying
            .verify(&intent_digest(tx_bytes), &signature)
            .expect("signature verifies over intent digest");
    }

    #[test]
    fn intent_digest_prefixes_transaction_scope() {
        assert_eq!(
            hex::encode(intent_digest(b"abc")),
            "22b5eeba3fdbee596b685c04b40c6fe810efb95d0fb9156cc6cc022243c8eb18"
        );
    }

    #[test]
    fn generated_identities_are_distinct() {
        let a = SigningIdentity::generate();
        let b = SigningIdentity::generate();
        assert_ne!(a.address(), b.address());
    }
}
