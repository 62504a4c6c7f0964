use crc::{Algorithm, Crc, Digest};

/// UBX [Fletcher-16 checksum](https://en.wikipedia.org/wiki/Fletcher%27s_checksum) calculator supporting both streaming and single-shot validation
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct UbxChecksumCalc {
    ck_a: u8,
    ck_b: u8,
}

impl UbxChecksumCalc {
    pub(crate) const fn new() -> Self {
        Self { ck_a: 0, ck_b: 0 }
    }

    /// Update checksum with new bytes
    pub(crate) const fn update(&mut self, bytes: &[u8]) {
        let mut i = 0;
        while i < bytes.len() {
            self.update_byte(bytes[i]);
            i += 1;
        }
    }

    /// Update checksum with a single byte
    pub(crate) const fn update_byte(&mut self, byte: u8) {
        self.ck_a = self.ck_a.wrapping_add(byte);
        self.ck_b = self.ck_b.wrapping_add(self.ck_a);
    }

    /// Get the current checksum result
    pub(crate) const fn result(self) -> (u8, u8) {
        (self.ck_a, self.ck_b)
    }

    pub(crate) const fn is_valid(&self, received_ck_a: u8, received_ck_b: u8) -> bool {
        self.ck_a == received_ck_a && self.ck_b == received_ck_b
    }
}

/// Computes the UBX checksum pair over `class, id, length, payload`.
pub const fn ubx_checksum(data: &[u8]) -> (u8, u8) {
    let mut calc = UbxChecksumCalc::new();
    calc.update(data);
    calc.result()
}

/// Running XOR used by NMEA-0183 and Unicore ASCII sentences.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct XorChecksum(u8);

impl XorChecksum {
    pub(crate) const fn new() -> Self {
        Self(0)
    }

    pub(crate) const fn update_byte(&mut self, byte: u8) {
        self.0 ^= byte;
    }

    pub(crate) const fn value(self) -> u8 {
        self.0
    }

    /// Compares against the two hex digits that follow the `*`.
    pub(crate) fn matches(self, digits: &[u8]) -> bool {
        match digits {
            [hi, lo, ..] => match (hex_digit(*hi), hex_digit(*lo)) {
                (Some(hi), Some(lo)) => (hi << 4 | lo) == self.0,
                _ => false,
            },
            _ => false,
        }
    }
}

/// XOR over a byte string, as sent between `$` and `*`.
pub const fn nmea_checksum(data: &[u8]) -> u8 {
    let mut calc = XorChecksum::new();
    let mut i = 0;
    while i < data.len() {
        calc.update_byte(data[i]);
        i += 1;
    }
    calc.value()
}

const fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// CRC-32 used by Unicore binary messages: reflected 0x04C11DB7, zero init, no final xor.
pub const CRC_32_UNICORE: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04c1_1db7,
    init: 0x0000_0000,
    refin: true,
    refout: true,
    xorout: 0x0000_0000,
    check: 0x2dfd_2d88,
    residue: 0x0000_0000,
};

pub(crate) static UNICORE_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_UNICORE);

pub(crate) fn unicore_crc_digest() -> Digest<'static, u32> {
    UNICORE_CRC.digest()
}

/// Single-shot Unicore CRC-32 over a header and payload.
pub fn unicore_crc32(data: &[u8]) -> u32 {
    UNICORE_CRC.checksum(data)
}
