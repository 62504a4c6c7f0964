//! Unicore binary messages: `AA 44 B5`, 24 byte header, payload, CRC32

use crc::Digest;

use crate::{
    constants::{
        UNICORE_BIN_CRC_LEN, UNICORE_BIN_HEADER_LEN, UNICORE_BIN_SYNC_CHAR_1,
        UNICORE_BIN_SYNC_CHAR_2, UNICORE_BIN_SYNC_CHAR_3,
    },
    parser::checksum::unicore_crc_digest,
    unicore_packets::UnicoreBinHeader,
};

pub(crate) enum UnicoreBinStep {
    Continue,
    Complete { header: UnicoreBinHeader, valid: bool },
}

pub(crate) struct UnicoreBinParser {
    /// Frame bytes seen so far, sync included
    pos: usize,
    header_bytes: [u8; UNICORE_BIN_HEADER_LEN],
    header: Option<UnicoreBinHeader>,
    digest: Digest<'static, u32>,
    received_crc: [u8; UNICORE_BIN_CRC_LEN],
}

impl UnicoreBinParser {
    /// The three sync bytes have already been consumed.
    pub(crate) fn new() -> Self {
        let sync = [
            UNICORE_BIN_SYNC_CHAR_1,
            UNICORE_BIN_SYNC_CHAR_2,
            UNICORE_BIN_SYNC_CHAR_3,
        ];
        let mut digest = unicore_crc_digest();
        digest.update(&sync);
        let mut header_bytes = [0; UNICORE_BIN_HEADER_LEN];
        header_bytes[..sync.len()].copy_from_slice(&sync);
        Self {
            pos: sync.len(),
            header_bytes,
            header: None,
            digest,
            received_crc: [0; UNICORE_BIN_CRC_LEN],
        }
    }

    pub(crate) fn step(&mut self, byte: u8) -> UnicoreBinStep {
        let pos = self.pos;
        self.pos += 1;

        let Some(header) = self.header else {
            self.digest.update(&[byte]);
            self.header_bytes[pos] = byte;
            if self.pos == UNICORE_BIN_HEADER_LEN {
                self.header = UnicoreBinHeader::from_bytes(&self.header_bytes);
                if let Some(h) = self.header {
                    log::trace!("Unicore binary id {} len {}", h.message_id, h.message_len);
                }
            }
            return UnicoreBinStep::Continue;
        };

        let crc_start = UNICORE_BIN_HEADER_LEN + usize::from(header.message_len);
        if pos < crc_start {
            self.digest.update(&[byte]);
            return UnicoreBinStep::Continue;
        }
        self.received_crc[pos - crc_start] = byte;
        if pos - crc_start + 1 < UNICORE_BIN_CRC_LEN {
            return UnicoreBinStep::Continue;
        }

        let expected = u32::from_le_bytes(self.received_crc);
        let computed = self.digest.clone().finalize();
        if expected != computed {
            log::debug!(
                "Unicore binary id {} CRC mismatch: expected {:08x}, computed {:08x}",
                header.message_id,
                expected,
                computed
            );
        }
        UnicoreBinStep::Complete {
            header,
            valid: expected == computed,
        }
    }
}
