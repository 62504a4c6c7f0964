//! RTCM3 framing: `D3`, 6 reserved bits + 10 bit length, payload, CRC24Q.
//!
//! The CRC is carried through untouched for forwarding, it is not checked.

use crate::constants::{RTCM_CRC_SIZE, RTCM_HEADER_SIZE, RTCM_LENGTH_MASK};

#[derive(Debug)]
pub(crate) struct RtcmParser {
    /// Frame bytes seen so far, preamble included
    pos: usize,
    len: u16,
    message_type: u16,
}

impl Default for RtcmParser {
    fn default() -> Self {
        Self {
            pos: 1,
            len: 0,
            message_type: 0,
        }
    }
}

impl RtcmParser {
    /// Returns the 12 bit message type once the whole frame went through.
    pub(crate) fn step(&mut self, byte: u8) -> Option<u16> {
        let pos = self.pos;
        self.pos += 1;
        match pos {
            1 => self.len = u16::from(byte) << 8,
            2 => self.len = (self.len | u16::from(byte)) & RTCM_LENGTH_MASK,
            3 => self.message_type = u16::from(byte) << 4,
            4 => self.message_type |= u16::from(byte >> 4),
            _ => {},
        }
        (self.pos == self.total_len()).then_some(self.message_type)
    }

    /// `3 + payload + 3`, meaningful once the length bytes are in.
    pub(crate) fn total_len(&self) -> usize {
        RTCM_HEADER_SIZE + usize::from(self.len) + RTCM_CRC_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_and_length() {
        // 1005, 19 byte payload
        let mut frame = vec![0xd3, 0x00, 0x13, 0x3e, 0xd0];
        frame.resize(3 + 19 + 3, 0);
        let mut parser = RtcmParser::default();
        let mut fired = None;
        for (i, b) in frame[1..].iter().enumerate() {
            if let Some(t) = parser.step(*b) {
                assert!(fired.is_none());
                fired = Some((i + 2, t));
            }
        }
        assert_eq!(fired, Some((25, 1005)));
        assert_eq!(parser.total_len(), 25);
    }

    #[test]
    fn reserved_bits_are_masked() {
        let mut parser = RtcmParser::default();
        parser.step(0xff);
        parser.step(0x02);
        assert_eq!(parser.total_len(), 3 + 0x302 + 3);
    }
}
