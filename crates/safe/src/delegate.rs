//! Delegate registration messages, valid for the hour bucket they were signed in.

use alloy::{
    primitives::{eip191_hash_message, hex, Address, Signature, B256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use chrono::{DateTime, Utc};

use crate::SafeError;

pub const DELEGATE_WINDOW_SECS: i64 = 3600;

pub fn delegate_time_bucket(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(DELEGATE_WINDOW_SECS)
}

/// Checksummed delegate address followed by the hour bucket.
pub fn delegate_message(delegate: Address, now: DateTime<Utc>) -> String {
    format!("{}{}", delegate.to_checksum(None), delegate_time_bucket(now))
}

/// EIP-191 personal-message hash of [`delegate_message`].
pub fn create_delegate_message_hash(delegate: Address, now: DateTime<Utc>) -> B256 {
    eip191_hash_message(delegate_message(delegate, now))
}

#[derive(Debug, Clone)]
pub struct DelegateSignature {
    pub delegate: Address,
    pub signer: Address,
    pub signature: Signature,
}

impl DelegateSignature {
    pub fn signature_hex(&self) -> String {
        hex::encode_prefixed(self.signature.as_bytes())
    }
}

pub fn sign_delegate(
    delegate: Address,
    signer: &PrivateKeySigner,
    now: DateTime<Utc>,
) -> Result<DelegateSignature, SafeError> {
    let hash = create_delegate_message_hash(delegate, now);
    let signature = signer.sign_hash_sync(&hash)?;
    Ok(DelegateSignature {
        delegate,
        signer: signer.address(),
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const KEY: &str = "0x4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("timestamp")
    }

    #[test]
    fn bucket_is_hour_granular() {
        assert_eq!(delegate_time_bucket(at(0)), 0);
        assert_eq!(delegate_time_bucket(at(3599)), 0);
        assert_eq!(delegate_time_bucket(at(3600)), 1);
        assert_eq!(delegate_time_bucket(at(1_700_000_000)), 472_222);
    }

    #[test]
    fn message_embeds_checksummed_delegate_and_bucket() {
        let delegate: Address = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1"
            .parse()
            .expect("address");
        assert_eq!(
            delegate_message(delegate, at(7200)),
            "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C12"
        );
    }

    #[test]
    fn hash_is_stable_within_a_bucket_and_changes_across_buckets() {
        let delegate = Address::repeat_byte(0x42);
        let first = create_delegate_message_hash(delegate, at(36_000));
        let same_hour = create_delegate_message_hash(delegate, at(39_599));
        let next_hour = create_delegate_message_hash(delegate, at(39_600));
        assert_eq!(first, same_hour);
        assert_ne!(first, next_hour);
    }

    #[test]
    fn signature_recovers_to_signer() {
        let signer: PrivateKeySigner = KEY.parse().expect("key");
        let delegate = Address::repeat_byte(0x42);
        let signed = sign_delegate(delegate, &signer, at(36_000)).expect("sign");
        let recovered = signed
            .signature
            .recover_address_from_prehash(&create_delegate_message_hash(delegate, at(36_000)))
            .expect("recover");
        assert_eq!(recovered, signer.address());
        assert_eq!(signed.signature_hex().len(), 132);
    }
}
