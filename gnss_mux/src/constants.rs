pub const UBX_SYNC_CHAR_1: u8 = 0xb5;
pub const UBX_SYNC_CHAR_2: u8 = 0x62;
pub(crate) const UBX_SYNC_SIZE: usize = 2;
pub(crate) const UBX_CLASS_LEN: usize = 1;
pub(crate) const UBX_ID_LEN: usize = 1;
pub(crate) const UBX_PAYLOAD_SIZE_LEN: usize = 2;
pub(crate) const UBX_HEADER_LEN: usize =
    UBX_SYNC_SIZE + UBX_CLASS_LEN + UBX_ID_LEN + UBX_PAYLOAD_SIZE_LEN;
pub(crate) const UBX_CHECKSUM_LEN: usize = 2;

pub const NMEA_SYNC_CHAR: u8 = b'$';
pub const NMEA_END_CHAR_1: u8 = b'\r';
pub const NMEA_END_CHAR_2: u8 = b'\n';
pub(crate) const NMEA_TERM_DELIMITER: u8 = b',';
pub(crate) const NMEA_CHECKSUM_DELIMITER: u8 = b'*';
/// Capacity of a single NMEA term (text between two delimiters).
pub const NMEA_TERM_LEN: usize = 20;
/// First term of a Unicore command echo sharing the NMEA lead-in.
pub(crate) const UNICORE_COMMAND_TERM: &[u8] = b"command";

pub(crate) const UNICORE_VALUE_DELIMITER: u8 = b':';
/// Capacity of a single Unicore ASCII term.
pub const UNICORE_TERM_LEN: usize = 32;

pub const UNICORE_BIN_SYNC_CHAR_1: u8 = 0xaa;
pub const UNICORE_BIN_SYNC_CHAR_2: u8 = 0x44;
pub const UNICORE_BIN_SYNC_CHAR_3: u8 = 0xb5;
pub const UNICORE_BIN_HEADER_LEN: usize = 24;
pub(crate) const UNICORE_BIN_CRC_LEN: usize = 4;

pub const RTCM_SYNC_CHAR: u8 = 0xd3;
pub(crate) const RTCM_HEADER_SIZE: usize = 3; // sync char (1) + length field (2)
pub(crate) const RTCM_CRC_SIZE: usize = 3;
pub(crate) const RTCM_LENGTH_MASK: u16 = 0x03ff; // 10 bits for length (6 bits reserved)

/// Scratch buffer shared by every protocol, large enough for the longest RTCM3 frame.
pub const PAYLOAD_BUFFER_LEN: usize = RTCM_HEADER_SIZE + RTCM_LENGTH_MASK as usize + RTCM_CRC_SIZE;

/// Capacity of the raw GGA sentence kept for forwarding (NTRIP casters expect it verbatim).
pub const GGA_RAW_LEN: usize = 120;
