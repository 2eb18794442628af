/*!
 * Channel handshake exchanged at the start of every server connection.
 *
 * Layout on the wire:
 *
 * ```text
 * banner[12] | channel id (u32 BE) or connect key [32] | version[64] (optional)
 * ```
 */
use tracing::debug;

use super::HANDSHAKE_BANNER;
use crate::error::{HdcError, Result};

const BANNER_LEN: usize = 12;
const KEY_LEN: usize = 32;
const VERSION_LEN: usize = 64;

/// Channel handshake structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandShake {
    /// Banner: "OHOS HDC" followed by feature flags
    pub banner: [u8; BANNER_LEN],
    /// Channel ID (server to client) or connect key (client to server)
    pub channel_id_or_key: [u8; KEY_LEN],
    /// Version string, NUL padded
    pub version: [u8; VERSION_LEN],
}

impl ChannelHandShake {
    /// Size of the full handshake in bytes
    pub const SIZE: usize = BANNER_LEN + KEY_LEN + VERSION_LEN;

    /// Size of the handshake without the version field
    pub const SIZE_WITHOUT_VERSION: usize = BANNER_LEN + KEY_LEN;

    /// Longest connect key (device id) the handshake can carry
    pub const MAX_CONNECT_KEY_LEN: usize = KEY_LEN;

    const BANNER_FEATURE_TAG_OFFSET: usize = 11;

    const HUGE_BUF_TAG: u8 = b'H';

    /// Parse a handshake from raw bytes.
    ///
    /// Accepts both the 44-byte form and the 108-byte form carrying a version.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE_WITHOUT_VERSION {
            return Err(HdcError::HandshakeFailed(format!(
                "Handshake data too short: expected at least {}, got {}",
                Self::SIZE_WITHOUT_VERSION,
                data.len()
            )));
        }

        let mut handshake = Self::default();
        handshake.banner.copy_from_slice(&data[..BANNER_LEN]);
        handshake
            .channel_id_or_key
            .copy_from_slice(&data[BANNER_LEN..Self::SIZE_WITHOUT_VERSION]);

        if data.len() >= Self::SIZE {
            handshake
                .version
                .copy_from_slice(&data[Self::SIZE_WITHOUT_VERSION..Self::SIZE]);
        } else {
            debug!("Received handshake without version field ({} bytes)", data.len());
        }

        Ok(handshake)
    }

    /// Serialize the full 108-byte form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.to_bytes_without_version();
        bytes.extend_from_slice(&self.version);
        bytes
    }

    /// Serialize the 44-byte form
    pub fn to_bytes_without_version(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend_from_slice(&self.banner);
        bytes.extend_from_slice(&self.channel_id_or_key);
        bytes
    }

    /// Verify the banner starts with `OHOS HDC`
    pub fn verify_banner(&self) -> Result<()> {
        if !self.banner.starts_with(HANDSHAKE_BANNER) {
            return Err(HdcError::InvalidBanner(self.banner.to_vec()));
        }
        Ok(())
    }

    /// Channel ID assigned by the server
    pub fn channel_id(&self) -> u32 {
        let mut id = [0u8; 4];
        id.copy_from_slice(&self.channel_id_or_key[..4]);
        u32::from_be_bytes(id)
    }

    /// Set the channel ID
    pub fn set_channel_id(&mut self, channel_id: u32) {
        self.channel_id_or_key[..4].copy_from_slice(&channel_id.to_be_bytes());
    }

    /// Set the connect key (device id), truncated to 32 bytes
    pub fn set_connect_key(&mut self, connect_key: &str) {
        write_padded(&mut self.channel_id_or_key, connect_key);
    }

    /// Connect key up to the first NUL
    pub fn connect_key(&self) -> String {
        read_padded(&self.channel_id_or_key)
    }

    /// Whether the server runs in stable buffer mode (no huge-buffer tag)
    pub fn is_stable_buf(&self) -> bool {
        self.banner[Self::BANNER_FEATURE_TAG_OFFSET] != Self::HUGE_BUF_TAG
    }

    /// Version string up to the first NUL
    pub fn version(&self) -> String {
        read_padded(&self.version)
    }

    /// Set the version string, truncated to 64 bytes
    pub fn set_version(&mut self, version: &str) {
        write_padded(&mut self.version, version);
    }
}

impl Default for ChannelHandShake {
    fn default() -> Self {
        Self {
            banner: [0; BANNER_LEN],
            channel_id_or_key: [0; KEY_LEN],
            version: [0; VERSION_LEN],
        }
    }
}

fn write_padded(field: &mut [u8], value: &str) {
    field.fill(0);
    let bytes = value.as_bytes();
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
}

fn read_padded(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
