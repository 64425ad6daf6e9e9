//! Signed transaction envelopes: binary codec and network-domain hashing.
//!
//! # Wire Form
//! ```text
//! base64( bincode-fixint( TransactionEnvelope ) )
//! ```
//!
//! # Hash
//! ```text
//! sha256( sha256(network passphrase) || u32-be ENVELOPE_TYPE_TX || bincode(tx) )
//! ```
//! Signatures are not part of the hashed payload, so re-signing an envelope
//! keeps its identity.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bincode::Options;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ledger::types::{LedgerError, LedgerResult};

/// Envelope type tag mixed into the transaction hash.
pub const ENVELOPE_TYPE_TX: u32 = 2;

/// Upper bound on a decoded envelope, in bytes.
pub const MAX_ENVELOPE_BYTES: u64 = 64 * 1024;

/// Strict codec shared by envelopes and result payloads.
pub(crate) fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_ENVELOPE_BYTES)
        .reject_trailing_bytes()
}

/// Validity window of a transaction, in unix seconds.
///
/// `max_time == 0` means the window has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    /// Whether the window closed before `now`.
    pub fn expired_at(&self, now: u64) -> bool {
        self.max_time != 0 && now > self.max_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Memo {
    None,
    Text(String),
    Id(u64),
    Hash([u8; 32]),
}

impl Memo {
    /// Name used for `memo_type` in transaction resources.
    pub fn type_name(&self) -> &'static str {
        match self {
            Memo::None => "none",
            Memo::Text(_) => "text",
            Memo::Id(_) => "id",
            Memo::Hash(_) => "hash",
        }
    }
}

/// A single operation. The body is opaque to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub source_account: Option<[u8; 32]>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub source_account: [u8; 32],
    pub fee: u32,
    pub sequence: i64,
    pub time_bounds: Option<TimeBounds>,
    pub memo: Memo,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: Vec<u8>,
}

/// A signed transaction as submitted for consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

impl TransactionEnvelope {
    /// Decode an envelope from its base64 transport form.
    ///
    /// Rejects non-canonical base64, truncated payloads and trailing bytes.
    pub fn from_base64(raw: &str) -> LedgerResult<Self> {
        let bytes = STANDARD.decode(raw)?;
        Ok(codec().deserialize(&bytes)?)
    }

    /// Encode the envelope into its base64 transport form.
    pub fn to_base64(&self) -> LedgerResult<String> {
        let bytes = codec().serialize(self)?;
        Ok(STANDARD.encode(bytes))
    }

    /// Network-domain-separated hash of the transaction.
    pub fn hash(&self, network_passphrase: &str) -> LedgerResult<[u8; 32]> {
        let network_id = Sha256::digest(network_passphrase.as_bytes());
        let tx_bytes = codec().serialize(&self.tx)?;

        let mut hasher = Sha256::new();
        hasher.update(network_id);
        hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
        hasher.update(&tx_bytes);
        Ok(hasher.finalize().into())
    }
}

/// An envelope read from a submission request, decoded and hashed once.
#[derive(Debug, Clone)]
pub struct EnvelopeInfo {
    raw: String,
    parsed: TransactionEnvelope,
    hash: String,
}

impl EnvelopeInfo {
    /// Decode `raw` and compute its hash under `network_passphrase`.
    pub fn extract(raw: &str, network_passphrase: &str) -> LedgerResult<Self> {
        if raw.is_empty() {
            return Err(LedgerError::Malformed("empty envelope".to_string()));
        }
        let parsed = TransactionEnvelope::from_base64(raw)?;
        let hash = hex::encode(parsed.hash(network_passphrase)?);
        Ok(Self {
            raw: raw.to_string(),
            parsed,
            hash,
        })
    }

    /// The envelope exactly as the caller sent it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parsed(&self) -> &TransactionEnvelope {
        &self.parsed
    }

    /// Hex-encoded transaction hash.
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const PASSPHRASE: &str = "Test Ledger Network ; January 2024";

    pub fn sample_envelope() -> TransactionEnvelope {
        TransactionEnvelope {
            tx: Transaction {
                source_account: [7u8; 32],
                fee: 100,
                sequence: 42,
                time_bounds: Some(TimeBounds {
                    min_time: 0,
                    max_time: 0,
                }),
                memo: Memo::Text("rent".into()),
                operations: vec![Operation {
                    source_account: None,
                    body: vec![1, 2, 3],
                }],
            },
            signatures: vec![DecoratedSignature {
                hint: [1, 2, 3, 4],
                signature: vec![9; 64],
            }],
        }
    }

    #[test]
    fn test_hash_stable_across_reencoding() {
        let envelope = sample_envelope();
        let raw = envelope.to_base64().unwrap();
        let decoded = TransactionEnvelope::from_base64(&raw).unwrap();

        assert_eq!(decoded, envelope);
        assert_eq!(
            envelope.hash(PASSPHRASE).unwrap(),
            decoded.hash(PASSPHRASE).unwrap()
        );
    }

    #[test]
    fn test_hash_is_network_separated() {
        let envelope = sample_envelope();
        let a = envelope.hash(PASSPHRASE).unwrap();
        let b = envelope.hash("Another Network").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_ignores_signatures() {
        let envelope = sample_envelope();
        let mut resigned = envelope.clone();
        resigned.signatures.clear();
        assert_eq!(
            envelope.hash(PASSPHRASE).unwrap(),
            resigned.hash(PASSPHRASE).unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            TransactionEnvelope::from_base64("not base64!!"),
            Err(LedgerError::Base64(_))
        ));

        // Valid base64, not an envelope.
        assert!(matches!(
            TransactionEnvelope::from_base64("AAAA"),
            Err(LedgerError::Binary(_))
        ));
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = codec().serialize(&sample_envelope()).unwrap();
        bytes.push(0);
        let raw = STANDARD.encode(bytes);
        assert!(TransactionEnvelope::from_base64(&raw).is_err());
    }

    #[test]
    fn test_extract_envelope_info() {
        let raw = sample_envelope().to_base64().unwrap();
        let info = EnvelopeInfo::extract(&raw, PASSPHRASE).unwrap();
        assert_eq!(info.raw(), raw);
        assert_eq!(info.hash().len(), 64);
        assert_eq!(
            info.hash(),
            hex::encode(sample_envelope().hash(PASSPHRASE).unwrap())
        );

        assert!(matches!(
            EnvelopeInfo::extract("", PASSPHRASE),
            Err(LedgerError::Malformed(_))
        ));
    }

    #[test]
    fn test_time_bounds() {
        let bounds = TimeBounds {
            min_time: 10,
            max_time: 20,
        };
        assert!(!bounds.expired_at(9));
        assert!(!bounds.expired_at(20));
        assert!(bounds.expired_at(21));

        let open = TimeBounds {
            min_time: 0,
            max_time: 0,
        };
        assert!(!open.expired_at(u64::MAX));

        let far_future = TimeBounds {
            min_time: 0,
            max_time: u64::MAX,
        };
        assert!(!far_future.expired_at(1_792_392_793));
    }
}
