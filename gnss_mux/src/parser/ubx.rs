//! UBX frame state machine, fed the bytes that follow `B5 62`

use crate::{
    constants::{UBX_HEADER_LEN, UBX_SYNC_SIZE},
    parser::checksum::UbxChecksumCalc,
};

pub(crate) enum UbxStep {
    Continue,
    Complete { class: u8, id: u8, valid: bool },
}

#[derive(Debug, Default)]
pub(crate) struct UbxParser {
    /// Bytes seen after the sync pair
    pos: usize,
    class: u8,
    id: u8,
    len: u16,
    ck_a: u8,
    checksum: UbxChecksumCalc,
}

impl UbxParser {
    pub(crate) fn step(&mut self, byte: u8) -> UbxStep {
        const LEN_LO: usize = 2;
        const LEN_HI: usize = 3;
        const PAYLOAD: usize = UBX_HEADER_LEN - UBX_SYNC_SIZE;

        let pos = self.pos;
        self.pos += 1;
        let ck_pos = PAYLOAD + usize::from(self.len);

        match pos {
            0 => self.class = byte,
            1 => self.id = byte,
            LEN_LO => self.len = u16::from(byte),
            LEN_HI => self.len |= u16::from(byte) << 8,
            _ if pos < ck_pos => {},
            _ if pos == ck_pos => {
                self.ck_a = byte;
                return UbxStep::Continue;
            },
            _ => {
                let valid = self.checksum.is_valid(self.ck_a, byte);
                if !valid {
                    let (a, b) = self.checksum.result();
                    log::debug!(
                        "UBX {:02x}:{:02x} checksum mismatch: expected {:02x}{:02x}, computed {:02x}{:02x}",
                        self.class,
                        self.id,
                        self.ck_a,
                        byte,
                        a,
                        b
                    );
                }
                return UbxStep::Complete {
                    class: self.class,
                    id: self.id,
                    valid,
                };
            },
        }
        self.checksum.update_byte(byte);
        UbxStep::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ubx_packets::ubx_frame;

    fn run(frame: &[u8]) -> Option<(usize, u8, u8, bool)> {
        let mut parser = UbxParser::default();
        for (i, b) in frame[2..].iter().enumerate() {
            if let UbxStep::Complete { class, id, valid } = parser.step(*b) {
                return Some((i + 3, class, id, valid));
            }
        }
        None
    }

    #[test]
    fn ack_frame() {
        let frame = [0xb5, 0x62, 0x05, 0x01, 0x02, 0x00, 0x06, 0x8a, 0x98, 0xc1];
        assert_eq!(run(&frame), Some((frame.len(), 0x05, 0x01, true)));
    }

    #[test]
    fn bad_checksum() {
        let frame = [0xb5, 0x62, 0x05, 0x01, 0x02, 0x00, 0x06, 0x8a, 0x98, 0xc2];
        assert_eq!(run(&frame), Some((frame.len(), 0x05, 0x01, false)));
    }

    #[test]
    fn zero_length_payload() {
        let frame = ubx_frame(0x0a, 0x04, &[]).unwrap();
        assert_eq!(frame.len(), 8);
        assert_eq!(run(&frame), Some((8, 0x0a, 0x04, true)));
    }
}
