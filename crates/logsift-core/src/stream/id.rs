//! Tenant and stream identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Tenant scope of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TenantId {
    pub account_id: u32,
    pub project_id: u32,
}

impl TenantId {
    pub fn new(account_id: u32, project_id: u32) -> Self {
        Self {
            account_id,
            project_id,
        }
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.account_id, self.project_id)
    }
}

/// Identifier of a log stream within a tenant.
///
/// The string form is 48 lowercase hex chars: big-endian account ID,
/// project ID, then the 128-bit stream ID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StreamId {
    pub tenant_id: TenantId,
    pub id: u128,
}

impl StreamId {
    pub fn new(tenant_id: TenantId, id: u128) -> Self {
        Self { tenant_id, id }
    }

    /// Big-endian binary form.
    pub fn to_bytes(&self) -> [u8; 24] {
        let mut buf = [0u8; 24];
        buf[..4].copy_from_slice(&self.tenant_id.account_id.to_be_bytes());
        buf[4..8].copy_from_slice(&self.tenant_id.project_id.to_be_bytes());
        buf[8..].copy_from_slice(&self.id.to_be_bytes());
        buf
    }

    /// Decode the big-endian binary form.
    pub fn from_bytes(buf: &[u8; 24]) -> Self {
        let mut account = [0u8; 4];
        let mut project = [0u8; 4];
        let mut id = [0u8; 16];
        account.copy_from_slice(&buf[..4]);
        project.copy_from_slice(&buf[4..8]);
        id.copy_from_slice(&buf[8..]);
        Self {
            tenant_id: TenantId::new(u32::from_be_bytes(account), u32::from_be_bytes(project)),
            id: u128::from_be_bytes(id),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for StreamId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut buf = [0u8; 24];
        hex::decode_to_slice(s, &mut buf)
            .map_err(|e| Error::InvalidStreamId(format!("{s:?}: {e}")))?;
        Ok(Self::from_bytes(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_string_roundtrip() {
        let sid = StreamId::new(TenantId::new(1, 2), 0xdead_beef);
        let s = sid.to_string();
        assert_eq!(s.len(), 48);
        assert_eq!(&s[..16], "0000000100000002");
        assert_eq!(s.parse::<StreamId>().unwrap(), sid);
    }

    #[test]
    fn test_stream_id_rejects_bad_input() {
        assert!(matches!(
            "abc".parse::<StreamId>(),
            Err(Error::InvalidStreamId(_))
        ));
        let bad = "z".repeat(48);
        assert!(matches!(bad.parse::<StreamId>(), Err(Error::InvalidStreamId(_))));
    }
}
