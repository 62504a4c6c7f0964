mod ack;
mod cfg_cfg;
mod cfg_val;
mod nav_hp_pos_llh;
mod nav_rel_pos_ned;

pub use ack::{UbxAck, ACK_ID_ACK, ACK_ID_NAK};
pub use cfg_cfg::{CfgCfg, CfgCfgBuilder, CfgCfgDevices};
pub use cfg_val::{
    CfgItem, CfgLayerGet, CfgLayerSet, CfgValGetRequest, CfgValGetRequestBuilder,
    CfgValGetResponse, CfgValIter, CfgValSet, CfgValSetBuilder, KeyId, StorageSize,
    MAX_CFG_ITEMS,
};
pub use nav_hp_pos_llh::{NavHpPosLlh, NavHpPosLlhFlags};
pub use nav_rel_pos_ned::{CarrierPhaseRangeSolutionStatus, NavRelPosNed, NavRelPosNedFlags};

use crate::{
    constants::{UBX_CHECKSUM_LEN, UBX_HEADER_LEN, UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2},
    error::BuildError,
    parser::checksum::UbxChecksumCalc,
};

pub const UBX_CLASS_NAV: u8 = 0x01;
pub const UBX_CLASS_ACK: u8 = 0x05;
pub const UBX_CLASS_CFG: u8 = 0x06;

pub const UBX_CFG_ID_CFG: u8 = 0x09;
pub const UBX_CFG_ID_VALSET: u8 = 0x8a;
pub const UBX_CFG_ID_VALGET: u8 = 0x8b;

/// Largest payload produced by the command builders: VALSET with
/// `MAX_CFG_ITEMS` eight-byte values.
pub const MAX_COMMAND_PAYLOAD_LEN: usize = 4 + (4 + 8) * MAX_CFG_ITEMS;
pub const MAX_COMMAND_FRAME_LEN: usize = UBX_HEADER_LEN + MAX_COMMAND_PAYLOAD_LEN + UBX_CHECKSUM_LEN;

/// A complete UBX frame ready to be handed to the transport.
pub type Frame = heapless::Vec<u8, MAX_COMMAND_FRAME_LEN>;

/// Information about concrete UBX protocol's packet
pub trait UbxPacketMeta {
    const CLASS: u8;
    const ID: u8;
    const FIXED_PAYLOAD_LEN: Option<u16>;
}

/// Incrementally writes `sync, class, id, length, payload, checksum`.
pub(crate) struct FrameWriter {
    frame: Frame,
}

impl FrameWriter {
    pub(crate) fn new(class: u8, id: u8) -> Self {
        let mut frame = Frame::new();
        // header always fits in an empty frame
        let _ = frame.extend_from_slice(&[UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2, class, id, 0, 0]);
        Self { frame }
    }

    pub(crate) fn put(&mut self, bytes: &[u8]) -> Result<(), BuildError> {
        self.frame
            .extend_from_slice(bytes)
            .map_err(|_| BuildError::FrameTooLong {
                max: MAX_COMMAND_FRAME_LEN,
            })
    }

    pub(crate) fn finish(mut self) -> Result<Frame, BuildError> {
        let payload_len = (self.frame.len() - UBX_HEADER_LEN) as u16;
        self.frame[4..6].copy_from_slice(&payload_len.to_le_bytes());

        let mut calc = UbxChecksumCalc::new();
        calc.update(&self.frame[2..]);
        let (ck_a, ck_b) = calc.result();
        self.put(&[ck_a, ck_b])?;
        Ok(self.frame)
    }
}

/// Wraps an arbitrary payload into a UBX frame.
pub fn ubx_frame(class: u8, id: u8, payload: &[u8]) -> Result<Frame, BuildError> {
    let mut writer = FrameWriter::new(class, id);
    writer.put(payload)?;
    writer.finish()
}
