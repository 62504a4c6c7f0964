use bitflags::bitflags;

use super::{Frame, FrameWriter, UbxPacketMeta, UBX_CFG_ID_CFG, UBX_CLASS_CFG};
use crate::error::BuildError;

bitflags! {
    /// Storage devices a CFG-CFG clear/save/load applies to
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CfgCfgDevices: u8 {
        const BBR = 0x01;
        const FLASH = 0x02;
        const EEPROM = 0x04;
        const SPI_FLASH = 0x10;
    }
}

/// Marker for UBX-CFG-CFG
pub struct CfgCfg;

impl UbxPacketMeta for CfgCfg {
    const CLASS: u8 = UBX_CLASS_CFG;
    const ID: u8 = UBX_CFG_ID_CFG;
    const FIXED_PAYLOAD_LEN: Option<u16> = Some(13);
}

/// Clear, save and load configuration sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfgCfgBuilder {
    pub clear_mask: u32,
    pub save_mask: u32,
    pub load_mask: u32,
    pub device_mask: CfgCfgDevices,
}

impl CfgCfgBuilder {
    /// All sections (ioPort, msgConf, infMsg, navConf, rxmConf)
    pub const ALL_SECTIONS: u32 = 0x0000_001f;

    /// Clears the permanent configuration and reloads the defaults.
    pub const fn factory_reset() -> Self {
        Self {
            clear_mask: Self::ALL_SECTIONS,
            save_mask: 0,
            load_mask: Self::ALL_SECTIONS,
            device_mask: CfgCfgDevices::all(),
        }
    }

    pub fn into_packet_bytes(self) -> Result<Frame, BuildError> {
        let mut writer = FrameWriter::new(CfgCfg::CLASS, CfgCfg::ID);
        writer.put(&self.clear_mask.to_le_bytes())?;
        writer.put(&self.save_mask.to_le_bytes())?;
        writer.put(&self.load_mask.to_le_bytes())?;
        writer.put(&[self.device_mask.bits()])?;
        writer.finish()
    }
}
