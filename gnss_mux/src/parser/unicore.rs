//! Unicore ASCII command echo, `$command,<cmd>,response: OK*XX`

use crate::{
    constants::{
        NMEA_CHECKSUM_DELIMITER, NMEA_END_CHAR_1, NMEA_TERM_DELIMITER, UNICORE_TERM_LEN,
        UNICORE_VALUE_DELIMITER,
    },
    parser::{checksum::XorChecksum, term::Term},
    unicore_packets::UnicoreResponse,
};

pub(crate) enum UnicoreStep {
    Continue,
    Accepted(UnicoreResponse),
    Rejected,
}

#[derive(Debug, Default)]
pub(crate) struct UnicoreParser {
    term: Term<UNICORE_TERM_LEN>,
    term_num: u8,
    crc: XorChecksum,
    star: bool,
    /// Bytes after a `:` belong to the term but not to the checksum.
    colon: bool,
    response: UnicoreResponse,
}

impl UnicoreParser {
    /// Continues a line whose `command` term was read by the NMEA parser.
    pub(crate) fn resume(crc: XorChecksum) -> Self {
        Self {
            term_num: 1,
            crc,
            ..Self::default()
        }
    }

    pub(crate) fn step(&mut self, byte: u8) -> UnicoreStep {
        match byte {
            NMEA_TERM_DELIMITER => {
                self.close_term();
                if !self.star && !self.colon {
                    self.crc.update_byte(byte);
                }
                self.next_term();
            },
            UNICORE_VALUE_DELIMITER => {
                if !self.star && !self.colon {
                    self.crc.update_byte(byte);
                }
                self.colon = true;
                self.term.push(byte);
            },
            NMEA_CHECKSUM_DELIMITER => {
                self.close_term();
                self.star = true;
                self.next_term();
            },
            NMEA_END_CHAR_1 => {
                return if self.star && self.crc.matches(self.term.as_bytes()) {
                    UnicoreStep::Accepted(self.response)
                } else {
                    log::debug!(
                        "Unicore checksum mismatch: computed {:02X}, received {:?}",
                        self.crc.value(),
                        self.term.as_bytes()
                    );
                    UnicoreStep::Rejected
                };
            },
            _ => {
                if !self.star && !self.colon {
                    self.crc.update_byte(byte);
                }
                self.term.push(byte);
            },
        }
        UnicoreStep::Continue
    }

    fn next_term(&mut self) {
        self.term_num = self.term_num.saturating_add(1);
        self.colon = false;
        self.term.clear();
    }

    // term 1 is the echoed command line
    fn close_term(&mut self) {
        if self.star || self.term_num < 2 {
            return;
        }
        match UnicoreResponse::classify(self.term.as_bytes()) {
            UnicoreResponse::None => {},
            code => self.response = code,
        }
    }
}
