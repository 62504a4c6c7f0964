use bitflags::bitflags;

use super::{Frame, FrameWriter, UbxPacketMeta, UBX_CFG_ID_VALGET, UBX_CFG_ID_VALSET, UBX_CLASS_CFG};
use crate::error::BuildError;

/// A single VALSET/VALGET request is limited to 64 key-value pairs.
pub const MAX_CFG_ITEMS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageSize {
    OneBit,
    OneByte,
    TwoBytes,
    FourBytes,
    EightBytes,
}

impl StorageSize {
    pub const fn to_usize(self) -> usize {
        match self {
            Self::OneBit | Self::OneByte => 1,
            Self::TwoBytes => 2,
            Self::FourBytes => 4,
            Self::EightBytes => 8,
        }
    }
}

impl KeyId {
    pub(crate) const SIZE: usize = 4;

    /// Value size encoded in bits 28..30 of the key, `None` for reserved patterns.
    pub const fn value_size(&self) -> Option<StorageSize> {
        match (self.0 >> 28) & 0b111 {
            1 => Some(StorageSize::OneBit),
            2 => Some(StorageSize::OneByte),
            3 => Some(StorageSize::TwoBytes),
            4 => Some(StorageSize::FourBytes),
            5 => Some(StorageSize::EightBytes),
            _ => None,
        }
    }

    pub const fn group_id(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn item_id(&self) -> u8 {
        self.0 as u8
    }
}

bitflags! {
    /// The `CfgLayerSet` defines the configuration layer used to set configuration values to.
    /// The definition of the Layers for updating the configuration values is different than
    /// the definition of the Layers for reading values, see [CfgLayerGet]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CfgLayerSet: u8 {
        const RAM = 0b001;
        const BBR = 0b010;
        const FLASH = 0b100;
    }
}

impl Default for CfgLayerSet {
    fn default() -> Self {
        Self::RAM
    }
}

/// The [CfgLayerGet] enum is used to specify the configuration layer to read from.
/// The configuration system in the ublox device is stacked, so a property
/// may be empty for a particular layer and you will receive a NAK.
#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CfgLayerGet {
    /// Read from RAM
    #[default]
    Ram = 0,
    /// Read from BBR (battery backed RAM)
    Bbr = 1,
    /// Read from Flash, if available
    Flash = 2,
    /// Read the current configuration from the active source
    Default = 7,
}

/// One key/value configuration item. Values are little-endian, between
/// one and eight bytes long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CfgItem {
    pub key_id: u32,
    pub value: [u8; 8],
    pub value_len: u8,
}

impl CfgItem {
    /// Copies at most eight bytes; a longer slice keeps its real length and
    /// is rejected when the frame is built.
    pub fn from_bytes(key_id: u32, bytes: &[u8]) -> Self {
        let mut value = [0u8; 8];
        let n = bytes.len().min(8);
        value[..n].copy_from_slice(&bytes[..n]);
        Self {
            key_id,
            value,
            value_len: u8::try_from(bytes.len()).unwrap_or(u8::MAX),
        }
    }

    const fn with_value(key_id: u32, le: &[u8]) -> Self {
        let mut value = [0u8; 8];
        let mut i = 0;
        while i < le.len() {
            value[i] = le[i];
            i += 1;
        }
        Self {
            key_id,
            value,
            value_len: le.len() as u8,
        }
    }

    pub const fn bool(key_id: u32, v: bool) -> Self {
        Self::with_value(key_id, &[v as u8])
    }

    pub const fn u8(key_id: u32, v: u8) -> Self {
        Self::with_value(key_id, &[v])
    }

    pub const fn u16(key_id: u32, v: u16) -> Self {
        Self::with_value(key_id, &v.to_le_bytes())
    }

    pub const fn u32(key_id: u32, v: u32) -> Self {
        Self::with_value(key_id, &v.to_le_bytes())
    }

    pub const fn i32(key_id: u32, v: i32) -> Self {
        Self::with_value(key_id, &v.to_le_bytes())
    }

    pub const fn u64(key_id: u32, v: u64) -> Self {
        Self::with_value(key_id, &v.to_le_bytes())
    }

    pub const fn key(&self) -> KeyId {
        KeyId(self.key_id)
    }

    pub fn value(&self) -> &[u8] {
        &self.value[..usize::from(self.value_len).min(8)]
    }

    const fn has_valid_len(&self) -> bool {
        self.value_len >= 1 && self.value_len <= 8
    }
}

/// Marker for UBX-CFG-VALSET
pub struct CfgValSet;

impl UbxPacketMeta for CfgValSet {
    const CLASS: u8 = UBX_CLASS_CFG;
    const ID: u8 = UBX_CFG_ID_VALSET;
    const FIXED_PAYLOAD_LEN: Option<u16> = None;
}

/// Builds a UBX-CFG-VALSET frame. Any item whose value length is outside
/// `1..=8` aborts the build, nothing partial is produced.
#[derive(Debug, Clone, Copy)]
pub struct CfgValSetBuilder<'a> {
    /// Message version
    pub version: u8,
    /// The layers the configuration items are written to
    pub layers: CfgLayerSet,
    pub items: &'a [CfgItem],
}

impl<'a> CfgValSetBuilder<'a> {
    pub const fn new(layers: CfgLayerSet, items: &'a [CfgItem]) -> Self {
        Self {
            version: 0,
            layers,
            items,
        }
    }

    pub fn into_packet_bytes(self) -> Result<Frame, BuildError> {
        if self.items.len() > MAX_CFG_ITEMS {
            return Err(BuildError::TooManyItems {
                count: self.items.len(),
                max: MAX_CFG_ITEMS,
            });
        }
        if let Some((index, item)) = self
            .items
            .iter()
            .enumerate()
            .find(|(_, item)| !item.has_valid_len())
        {
            return Err(BuildError::InvalidValueLength {
                index,
                len: item.value_len,
            });
        }

        let mut writer = FrameWriter::new(CfgValSet::CLASS, CfgValSet::ID);
        writer.put(&[self.version, self.layers.bits(), 0, 0])?;
        for item in self.items {
            writer.put(&item.key_id.to_le_bytes())?;
            writer.put(item.value())?;
        }
        writer.finish()
    }
}

/// Marker for UBX-CFG-VALGET requests
pub struct CfgValGetRequest;

impl UbxPacketMeta for CfgValGetRequest {
    const CLASS: u8 = UBX_CLASS_CFG;
    const ID: u8 = UBX_CFG_ID_VALGET;
    const FIXED_PAYLOAD_LEN: Option<u16> = None;
}

/// Builds a UBX-CFG-VALGET poll.
/// This message returns a UBX-ACK-NAK
///  - if any key is unknown to the receiver FW
///  - if the layer field speciﬁes an invalid layer to get the value from
///  - if the keys array speciﬁes more than 64 key IDs.
#[derive(Debug, Clone, Copy)]
pub struct CfgValGetRequestBuilder<'a> {
    pub version: u8,
    pub layer: CfgLayerGet,
    /// Number of values to skip in the result set
    pub position: u16,
    pub keys: &'a [u32],
}

impl<'a> CfgValGetRequestBuilder<'a> {
    pub const fn new(layer: CfgLayerGet, keys: &'a [u32]) -> Self {
        Self {
            version: 0,
            layer,
            position: 0,
            keys,
        }
    }

    pub fn into_packet_bytes(self) -> Result<Frame, BuildError> {
        if self.keys.len() > MAX_CFG_ITEMS {
            return Err(BuildError::TooManyItems {
                count: self.keys.len(),
                max: MAX_CFG_ITEMS,
            });
        }
        let mut writer = FrameWriter::new(CfgValGetRequest::CLASS, CfgValGetRequest::ID);
        writer.put(&[self.version, self.layer as u8])?;
        writer.put(&self.position.to_le_bytes())?;
        for key in self.keys {
            writer.put(&key.to_le_bytes())?;
        }
        writer.finish()
    }
}

/// Payload of a UBX-CFG-VALGET response
#[derive(Debug, Clone, Copy)]
pub struct CfgValGetResponse<'a> {
    pub version: u8,
    pub layer: u8,
    pub position: u16,
    cfg_data: &'a [u8],
}

impl<'a> CfgValGetResponse<'a> {
    pub fn from_payload(payload: &'a [u8]) -> Option<Self> {
        match payload {
            [version, layer, p0, p1, cfg_data @ ..] => Some(Self {
                version: *version,
                layer: *layer,
                position: u16::from_le_bytes([*p0, *p1]),
                cfg_data,
            }),
            _ => None,
        }
    }

    pub fn iter(&self) -> CfgValIter<'a> {
        CfgValIter {
            data: self.cfg_data,
        }
    }
}

/// Walks `(key, value)` pairs, sizing each value from its key id.
/// Stops at the first key with a reserved size or a truncated value.
#[derive(Debug, Clone)]
pub struct CfgValIter<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for CfgValIter<'a> {
    type Item = (KeyId, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let key_bytes = self.data.get(..KeyId::SIZE)?;
        let key = KeyId(u32::from_le_bytes([
            key_bytes[0],
            key_bytes[1],
            key_bytes[2],
            key_bytes[3],
        ]));
        let size = key.value_size()?.to_usize();
        let value = self.data.get(KeyId::SIZE..KeyId::SIZE + size)?;
        self.data = &self.data[KeyId::SIZE + size..];
        Some((key, value))
    }
}
