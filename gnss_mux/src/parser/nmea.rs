//! NMEA-0183 sentence framing and field extraction

use crate::{
    constants::{
        GGA_RAW_LEN, NMEA_CHECKSUM_DELIMITER, NMEA_END_CHAR_1, NMEA_END_CHAR_2, NMEA_SYNC_CHAR,
        NMEA_TERM_DELIMITER, NMEA_TERM_LEN, UNICORE_COMMAND_TERM,
    },
    nmea_sentences::{nmea_degrees, Gga, GpsFix, NmeaSentence, Rmc, Ths, ThsMode},
    parser::{
        buffer::FixedBuffer,
        checksum::XorChecksum,
        term::{parse_fixed_digits, Term},
        Records,
    },
};

pub(crate) enum NmeaStep {
    Continue,
    /// First term was `command`: the line is a Unicore echo, the XOR so far
    /// (delimiter included) carries over.
    UnicoreEcho(XorChecksum),
    Accepted(NmeaSentence),
    Rejected,
}

/// Records are staged while the sentence is read and only become visible
/// through [`NmeaParser::commit`] once the checksum matched. A fresh parser
/// is created for every `$`.
#[derive(Debug, Default)]
pub(crate) struct NmeaParser {
    term: Term<NMEA_TERM_LEN>,
    term_num: u8,
    crc: XorChecksum,
    star: bool,
    sentence: Option<NmeaSentence>,
    gga: Gga,
    rmc: Rmc,
    ths: Ths,
    raw_gga: FixedBuffer<GGA_RAW_LEN>,
}

impl NmeaParser {
    pub(crate) fn step(&mut self, byte: u8) -> NmeaStep {
        if self.sentence == Some(NmeaSentence::Gga) && byte != NMEA_END_CHAR_1 {
            let _ = self.raw_gga.push(byte);
        }

        match byte {
            NMEA_TERM_DELIMITER => {
                if self.term_num == 0 && self.term.as_bytes() == UNICORE_COMMAND_TERM {
                    self.crc.update_byte(byte);
                    return NmeaStep::UnicoreEcho(self.crc);
                }
                self.close_term();
                if !self.star {
                    self.crc.update_byte(byte);
                }
                self.next_term();
            },
            NMEA_CHECKSUM_DELIMITER => {
                self.close_term();
                self.star = true;
                self.next_term();
            },
            NMEA_END_CHAR_1 => {
                return if self.star && self.crc.matches(self.term.as_bytes()) {
                    NmeaStep::Accepted(self.sentence.unwrap_or(NmeaSentence::Other))
                } else {
                    log::debug!(
                        "NMEA checksum mismatch: computed {:02X}, received {:?}",
                        self.crc.value(),
                        self.term.as_bytes()
                    );
                    NmeaStep::Rejected
                };
            },
            _ => {
                if !self.star {
                    self.crc.update_byte(byte);
                }
                self.term.push(byte);
            },
        }
        NmeaStep::Continue
    }

    /// Publishes the staged record of an accepted sentence.
    pub(crate) fn commit(&mut self, records: &mut Records) {
        match self.sentence {
            Some(NmeaSentence::Gga) => {
                records.gga = Some(self.gga);
                let _ = self.raw_gga.push(NMEA_END_CHAR_1);
                let _ = self.raw_gga.push(NMEA_END_CHAR_2);
                records.raw_gga = self.raw_gga;
            },
            Some(NmeaSentence::Rmc) => records.rmc = Some(self.rmc),
            Some(NmeaSentence::Ths) => records.ths = Some(self.ths),
            Some(NmeaSentence::Other) | None => {},
        }
    }

    fn next_term(&mut self) {
        self.term_num = self.term_num.saturating_add(1);
        self.term.clear();
    }

    fn close_term(&mut self) {
        if self.star {
            return;
        }
        if self.term_num == 0 {
            let sentence = NmeaSentence::from_address(self.term.as_bytes());
            if sentence == NmeaSentence::Gga {
                self.raw_gga.clear();
                let _ = self.raw_gga.push(NMEA_SYNC_CHAR);
                self.raw_gga.extend_from_slice(self.term.as_bytes());
                let _ = self.raw_gga.push(NMEA_TERM_DELIMITER);
            }
            log::trace!("NMEA sentence {:?}", sentence);
            self.sentence = Some(sentence);
            return;
        }
        match self.sentence {
            Some(NmeaSentence::Gga) => self.gga_term(),
            Some(NmeaSentence::Rmc) => self.rmc_term(),
            Some(NmeaSentence::Ths) => self.ths_term(),
            Some(NmeaSentence::Other) | None => {},
        }
    }

    fn gga_term(&mut self) {
        let t = &self.term;
        let gga = &mut self.gga;
        match self.term_num {
            1 => {
                if let Some((h, m, s)) = hms(t.as_bytes()) {
                    gga.hour = h;
                    gga.min = m;
                    gga.sec = s;
                }
            },
            2 => gga.lat = nmea_degrees(t.double()),
            3 => gga.ns = t.character(),
            4 => gga.lon = nmea_degrees(t.double()),
            5 => gga.ew = t.character(),
            6 => gga.fix = GpsFix::from(t.number()),
            7 => gga.sat_num = t.number().clamp(0, i32::from(u8::MAX)) as u8,
            8 => gga.hdop = t.float(),
            9 => gga.alt = t.float(),
            11 => gga.geo_sep = t.float(),
            _ => {},
        }
    }

    fn rmc_term(&mut self) {
        let t = &self.term;
        let rmc = &mut self.rmc;
        match self.term_num {
            1 => {
                if let Some((h, m, s)) = hms(t.as_bytes()) {
                    rmc.hour = h;
                    rmc.min = m;
                    rmc.sec = s;
                }
            },
            2 => rmc.valid = t.character() == Some('A'),
            3 => rmc.lat = nmea_degrees(t.double()),
            4 => rmc.ns = t.character(),
            5 => rmc.lon = nmea_degrees(t.double()),
            6 => rmc.ew = t.character(),
            7 => rmc.speed_knots = t.float(),
            8 => rmc.course = t.float(),
            9 => {
                if let Some((d, m, y)) = hms(t.as_bytes()) {
                    rmc.day = d;
                    rmc.month = m;
                    rmc.year = y;
                }
            },
            12 => rmc.mode = t.character(),
            _ => {},
        }
    }

    fn ths_term(&mut self) {
        match self.term_num {
            1 => self.ths.heading = self.term.double(),
            2 => self.ths.mode = self.term.character().and_then(ThsMode::from_char),
            _ => {},
        }
    }
}

/// Three two-digit groups, `hhmmss[.ss]` or `ddmmyy`.
fn hms(term: &[u8]) -> Option<(u8, u8, u8)> {
    let a = parse_fixed_digits(term, 0, 2)?;
    let b = parse_fixed_digits(term, 2, 2)?;
    let c = parse_fixed_digits(term, 4, 2)?;
    Some((a as u8, b as u8, c as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(parser: &mut NmeaParser, sentence: &[u8]) -> NmeaStep {
        assert_eq!(sentence[0], b'$');
        *parser = NmeaParser::default();
        for b in &sentence[1..] {
            match parser.step(*b) {
                NmeaStep::Continue => {},
                other => return other,
            }
        }
        NmeaStep::Continue
    }

    #[test]
    fn gga_fields() {
        let mut parser = NmeaParser::default();
        let mut records = Records::default();
        let step = run(
            &mut parser,
            b"$GPGGA,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,*5B\r",
        );
        assert!(matches!(step, NmeaStep::Accepted(NmeaSentence::Gga)));
        parser.commit(&mut records);
        let gga = records.gga.unwrap();
        assert_eq!((gga.hour, gga.min, gga.sec), (9, 27, 25));
        assert_eq!(gga.fix, GpsFix::Gps);
        assert_eq!(gga.sat_num, 8);
        assert!((gga.lat - 47.285_233).abs() < 1e-6);
        assert!((gga.lon - 8.565_265).abs() < 1e-6);
        assert!((gga.hdop - 1.01).abs() < 1e-6);
        assert!((gga.alt - 499.6).abs() < 1e-4);
        assert!((gga.geo_sep - 48.0).abs() < 1e-6);
        assert_eq!(
            records.raw_gga.as_slice(),
            &b"$GPGGA,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,*5B\r\n"[..]
        );
    }

    #[test]
    fn rmc_fields() {
        let mut parser = NmeaParser::default();
        let mut records = Records::default();
        let step = run(
            &mut parser,
            b"$GNRMC,083559.00,A,4717.11437,N,00833.91522,E,0.004,77.52,091202,,,A*49\r",
        );
        assert!(matches!(step, NmeaStep::Accepted(NmeaSentence::Rmc)));
        parser.commit(&mut records);
        let rmc = records.rmc.unwrap();
        assert!(rmc.valid);
        assert_eq!((rmc.hour, rmc.min, rmc.sec), (8, 35, 59));
        assert_eq!((rmc.day, rmc.month, rmc.year), (9, 12, 2));
        assert!((rmc.course - 77.52).abs() < 1e-4);
        assert_eq!(rmc.mode, Some('A'));
        assert_eq!(rmc.datetime().unwrap().to_string(), "2002-12-09 08:35:59");
    }

    #[test]
    fn ths_fields() {
        let mut parser = NmeaParser::default();
        let mut records = Records::default();
        let step = run(&mut parser, b"$GPTHS,77.52,A*30\r");
        assert!(matches!(step, NmeaStep::Accepted(NmeaSentence::Ths)));
        parser.commit(&mut records);
        let ths = records.ths.unwrap();
        assert!((ths.heading - 77.52).abs() < 1e-9);
        assert_eq!(ths.mode, Some(ThsMode::Autonomous));
    }

    #[test]
    fn bad_checksum_stages_nothing() {
        let mut parser = NmeaParser::default();
        let step = run(&mut parser, b"$GPTHS,77.52,A*31\r");
        assert!(matches!(step, NmeaStep::Rejected));
        let step = run(&mut parser, b"$GPTHS,77.52,A\r");
        assert!(matches!(step, NmeaStep::Rejected));
    }

    #[test]
    fn command_term_hands_off() {
        let mut parser = NmeaParser::default();
        match run(&mut parser, b"$command,") {
            NmeaStep::UnicoreEcho(crc) => assert_eq!(crc.value(), crate::nmea_checksum(b"command,")),
            _ => panic!("expected hand-off"),
        }
    }
}
