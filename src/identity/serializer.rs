use anyhow::{anyhow, Result};
use base64::Engine;

use super::principal::PrincipalCollection;

/// Converts a principal collection to and from an opaque token string.
/// Injectable; when no serializer is configured the remember-me read and write
/// paths are disabled without affecting session-based resolution.
pub trait PrincipalSerializer: Send + Sync {
    fn serialize(&self, principals: &PrincipalCollection) -> Result<String>;
    fn deserialize(&self, token: &str) -> Result<PrincipalCollection>;
}

/// Default codec: JSON array of principals, base64url without padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64JsonSerializer;

impl PrincipalSerializer for Base64JsonSerializer {
    fn serialize(&self, principals: &PrincipalCollection) -> Result<String> {
        let json = serde_json::to_vec(principals)?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json))
    }

    fn deserialize(&self, token: &str) -> Result<PrincipalCollection> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| anyhow!("token_decode_failed: {}", e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
