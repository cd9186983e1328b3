//! Content identifiers for JSON blocks
//!
//! A block is addressed by a CIDv1 with the `json` codec and a sha2-256
//! multihash, rendered in base32 (`bagaaiera...`), the same identifiers an
//! IPFS JSON node assigns to the same bytes.

use crate::error::{HarnessError, Result};
use cid::multihash::Multihash;
use cid::Cid;
use sha2::{Digest, Sha256};

/// Multicodec code for JSON.
pub const JSON_CODEC: u64 = 0x0200;
/// Multihash code for sha2-256.
pub const SHA2_256: u64 = 0x12;

pub fn json_cid(bytes: &[u8]) -> Result<Cid> {
    let digest = Sha256::digest(bytes);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest)
        .map_err(|e| HarnessError::CidError(e.to_string()))?;
    Ok(Cid::new_v1(JSON_CODEC, hash))
}

/// Parse a CID string and require the JSON codec.
pub fn parse_cid(s: &str) -> Result<Cid> {
    let cid = Cid::try_from(s)?;
    if cid.codec() != JSON_CODEC {
        return Err(HarnessError::CidError(format!(
            "The passed CID had the incorrect codec 0x{:x}",
            cid.codec()
        )));
    }
    Ok(cid)
}

/// Re-hash stored bytes and compare against the CID's digest.
pub fn verify_block(cid: &Cid, bytes: &[u8]) -> Result<()> {
    if cid.hash().code() != SHA2_256 {
        return Err(HarnessError::CidError(format!(
            "unsupported multihash 0x{:x}",
            cid.hash().code()
        )));
    }
    let digest = Sha256::digest(bytes);
    if cid.hash().digest() != digest.as_slice() {
        return Err(HarnessError::CidError(format!(
            "block {} does not match its digest",
            cid
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let cid = json_cid(br#"{"hello":"world"}"#).unwrap();
        assert_eq!(
            cid.to_string(),
            "bagaaierasords4njcts6vs7qvdjfcvgnume4hqohf65zsfguprqphs3icwea"
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        let cid = json_cid(b"[1,2,3]").unwrap();
        let parsed = parse_cid(&cid.to_string()).unwrap();
        assert_eq!(parsed, cid);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_cid("not-a-cid").is_err());
        assert!(parse_cid("").is_err());
    }

    #[test]
    fn test_wrong_codec_rejected() {
        // CIDv0 strings always carry the dag-pb codec.
        let err = parse_cid("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap_err();
        assert!(err.to_string().contains("incorrect codec"));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let cid = json_cid(b"{\"a\":1}").unwrap();
        assert!(verify_block(&cid, b"{\"a\":1}").is_ok());
        assert!(verify_block(&cid, b"{\"a\":2}").is_err());
    }
}
