//! Reversible credential encoding.
//!
//! Used for `--enc` style credentials on the command line and for passwords
//! written to the session cache. This is obfuscation, not encryption.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::Condition;

pub trait CredentialCodec {
    fn encode(&self, plain: &str) -> String;
    fn decode(&self, encoded: &str) -> Result<String, Condition>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Base64Codec;

impl CredentialCodec for Base64Codec {
    fn encode(&self, plain: &str) -> String {
        STANDARD.encode(plain.as_bytes())
    }

    fn decode(&self, encoded: &str) -> Result<String, Condition> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Condition::Encryption(format!("Unable to decode credentials: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| Condition::Encryption(format!("Decoded credentials are not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReturnCode;

    #[test]
    fn test_decode_known_value() {
        assert_eq!(Base64Codec.decode("YWRtaW4=").unwrap(), "admin");
        assert_eq!(Base64Codec.encode("admin"), "YWRtaW4=");
    }

    #[test]
    fn test_decode_garbage_is_an_encryption_error() {
        let err = Base64Codec.decode("not base64!!").unwrap_err();
        assert_eq!(err.return_code(), ReturnCode::EncryptionError);
    }
}
