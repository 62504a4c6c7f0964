//! Byte-driven demultiplexer for the receiver stream.
//!
//! One [`Parser`] owns a single scratch buffer and at most one live
//! protocol state machine. While idle it looks at the incoming bytes for a
//! frame start (`$`, `B5 62`, `AA 44 B5` or `D3`), then routes every byte to
//! that protocol until the frame completes, valid or not.

pub(crate) mod buffer;
pub(crate) mod checksum;
mod nmea;
mod rtcm;
pub(crate) mod term;
mod ubx;
mod unicore;
mod unicore_bin;

use crate::{
    bytes::u16_le,
    constants::{
        GGA_RAW_LEN, NMEA_SYNC_CHAR, PAYLOAD_BUFFER_LEN, RTCM_CRC_SIZE, RTCM_HEADER_SIZE,
        RTCM_SYNC_CHAR, UBX_CHECKSUM_LEN, UBX_HEADER_LEN, UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2,
        UNICORE_BIN_HEADER_LEN, UNICORE_BIN_SYNC_CHAR_1,
        UNICORE_BIN_SYNC_CHAR_2, UNICORE_BIN_SYNC_CHAR_3,
    },
    nmea_sentences::{Gga, GpsFix, NmeaSentence, Rmc, Ths},
    ubx_packets::{
        CfgValGetRequest, CfgValGetResponse, NavHpPosLlh, NavRelPosNed, UbxAck, UbxPacketMeta,
        UBX_CLASS_ACK,
    },
    unicore_packets::{BestNav, UnicoreBinHeader, UnicoreResponse, UNICORE_MSG_BESTNAV},
};

use buffer::FixedBuffer;
use nmea::{NmeaParser, NmeaStep};
use rtcm::RtcmParser;
use ubx::{UbxParser, UbxStep};
use unicore::{UnicoreParser, UnicoreStep};
use unicore_bin::{UnicoreBinParser, UnicoreBinStep};

/// Wire format owning the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Protocol {
    Nmea,
    Ubx,
    /// Unicore ASCII command echo
    Unicore,
    UnicoreBinary,
    Rtcm,
}

/// What a completed frame carried, keyed by protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    Nmea(NmeaSentence),
    Ubx { class: u8, id: u8 },
    Unicore(UnicoreResponse),
    UnicoreBinary { message_id: u16 },
    Rtcm { message_type: u16 },
}

impl Message {
    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Nmea(_) => Protocol::Nmea,
            Self::Ubx { .. } => Protocol::Ubx,
            Self::Unicore(_) => Protocol::Unicore,
            Self::UnicoreBinary { .. } => Protocol::UnicoreBinary,
            Self::Rtcm { .. } => Protocol::Rtcm,
        }
    }
}

/// Most recent record of every decoded message kind, overwritten in place.
#[derive(Debug, Default, Clone)]
pub struct Records {
    pub gga: Option<Gga>,
    pub rmc: Option<Rmc>,
    pub ths: Option<Ths>,
    pub hp_pos_llh: Option<NavHpPosLlh>,
    pub rel_pos_ned: Option<NavRelPosNed>,
    pub ack: Option<UbxAck>,
    pub unicore_response: UnicoreResponse,
    pub unicore_header: Option<UnicoreBinHeader>,
    pub best_nav: Option<BestNav>,
    pub(crate) raw_gga: FixedBuffer<GGA_RAW_LEN>,
}

impl Records {
    /// Raw text of the last accepted GGA sentence, CR LF included, as long
    /// as it reported a fix.
    pub fn last_gga(&self) -> Option<&[u8]> {
        match self.gga {
            Some(gga) if gga.fix != GpsFix::Invalid && !self.raw_gga.is_empty() => {
                Some(self.raw_gga.as_slice())
            },
            _ => None,
        }
    }
}

/// A frame that completed with a valid checksum
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    pub message: Message,
    /// The whole frame as received, sync bytes included. Frames longer than
    /// the scratch buffer are truncated.
    pub frame: &'a [u8],
    pub records: &'a Records,
}

impl<'a> Event<'a> {
    pub fn protocol(&self) -> Protocol {
        self.message.protocol()
    }

    /// Message body without framing: UBX and Unicore binary payload, RTCM
    /// message body, or the full sentence for text protocols.
    pub fn payload(&self) -> Option<&'a [u8]> {
        match self.message {
            Message::Ubx { .. } => ubx_payload(self.frame),
            Message::UnicoreBinary { .. } => {
                let len = usize::from(u16_le(self.frame.get(..UNICORE_BIN_HEADER_LEN)?, 6));
                self.frame
                    .get(UNICORE_BIN_HEADER_LEN..UNICORE_BIN_HEADER_LEN + len)
            },
            Message::Rtcm { .. } => self
                .frame
                .get(RTCM_HEADER_SIZE..self.frame.len().checked_sub(RTCM_CRC_SIZE)?),
            Message::Nmea(_) | Message::Unicore(_) => Some(self.frame),
        }
    }

    /// The ACK or NAK carried by a UBX-ACK frame
    pub fn ack(&self) -> Option<UbxAck> {
        match self.message {
            Message::Ubx { class, id } => UbxAck::from_payload(class, id, ubx_payload(self.frame)?),
            _ => None,
        }
    }

    /// Key/value pairs of a UBX-CFG-VALGET reply
    pub fn cfg_val_get(&self) -> Option<CfgValGetResponse<'a>> {
        match self.message {
            Message::Ubx { class, id }
                if class == CfgValGetRequest::CLASS && id == CfgValGetRequest::ID =>
            {
                CfgValGetResponse::from_payload(ubx_payload(self.frame)?)
            },
            _ => None,
        }
    }
}

/// Receives every completed frame synchronously from [`Parser::feed`].
pub trait EventHandler {
    fn handle(&mut self, event: &Event<'_>);
}

impl<F> EventHandler for F
where
    F: FnMut(&Event<'_>),
{
    fn handle(&mut self, event: &Event<'_>) {
        self(event)
    }
}

/// UBX payload, `None` when the frame was truncated.
fn ubx_payload(frame: &[u8]) -> Option<&[u8]> {
    let len = usize::from(u16_le(frame.get(..UBX_HEADER_LEN)?, 4));
    if frame.len() != UBX_HEADER_LEN + len + UBX_CHECKSUM_LEN {
        return None;
    }
    frame.get(UBX_HEADER_LEN..UBX_HEADER_LEN + len)
}

/// Sync bytes seen while idle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preamble {
    None,
    Ubx1,
    Unicore1,
    Unicore2,
}

enum State {
    Idle(Preamble),
    Nmea(NmeaParser),
    Ubx(UbxParser),
    Unicore(UnicoreParser),
    UnicoreBin(UnicoreBinParser),
    Rtcm(RtcmParser),
}

enum FrameStatus {
    InProgress,
    /// Frame is over, `None` when it failed its checksum
    Complete(Option<Message>),
}

/// Streaming parser for interleaved NMEA, UBX, Unicore and RTCM3 frames
pub struct Parser {
    state: State,
    payload: FixedBuffer<PAYLOAD_BUFFER_LEN>,
    records: Records,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Parser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Parser")
            .field("protocol", &self.protocol())
            .field("buffered", &self.payload.len())
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::Idle(Preamble::None),
            payload: FixedBuffer::new(),
            records: Records::default(),
        }
    }

    /// Protocol of the frame being read, `None` while waiting for a frame start.
    pub fn protocol(&self) -> Option<Protocol> {
        match self.state {
            State::Idle(_) => None,
            State::Nmea(_) => Some(Protocol::Nmea),
            State::Ubx(_) => Some(Protocol::Ubx),
            State::Unicore(_) => Some(Protocol::Unicore),
            State::UnicoreBin(_) => Some(Protocol::UnicoreBinary),
            State::Rtcm(_) => Some(Protocol::Rtcm),
        }
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Bytes of the frame in progress
    pub fn buffered(&self) -> &[u8] {
        self.payload.as_slice()
    }

    /// Consumes `bytes`, calling `handler` for every frame completing with a
    /// valid checksum. Any chunking of the stream gives the same events.
    /// Returns the number of events fired.
    pub fn feed<H>(&mut self, bytes: &[u8], handler: &mut H) -> usize
    where
        H: EventHandler + ?Sized,
    {
        let mut events = 0;
        for &byte in bytes {
            let FrameStatus::Complete(message) = self.consume(byte) else {
                continue;
            };
            if let Some(message) = message {
                events += 1;
                handler.handle(&Event {
                    message,
                    frame: self.payload.as_slice(),
                    records: &self.records,
                });
            }
            self.payload.clear();
        }
        events
    }

    fn consume(&mut self, byte: u8) -> FrameStatus {
        let Self {
            state,
            payload,
            records,
        } = self;

        if let State::Idle(sync) = *state {
            *state = idle(sync, byte, payload);
            return FrameStatus::InProgress;
        }
        let _ = payload.push(byte);

        let message = match state {
            State::Idle(_) => return FrameStatus::InProgress,
            State::Nmea(nmea) => match nmea.step(byte) {
                NmeaStep::Continue => return FrameStatus::InProgress,
                NmeaStep::UnicoreEcho(crc) => {
                    log::trace!("NMEA lead-in is a Unicore command echo");
                    *state = State::Unicore(UnicoreParser::resume(crc));
                    return FrameStatus::InProgress;
                },
                NmeaStep::Accepted(sentence) => {
                    nmea.commit(records);
                    Some(Message::Nmea(sentence))
                },
                NmeaStep::Rejected => None,
            },
            State::Unicore(unicore) => match unicore.step(byte) {
                UnicoreStep::Continue => return FrameStatus::InProgress,
                UnicoreStep::Accepted(response) => {
                    records.unicore_response = response;
                    Some(Message::Unicore(response))
                },
                UnicoreStep::Rejected => None,
            },
            State::Ubx(ubx) => match ubx.step(byte) {
                UbxStep::Continue => return FrameStatus::InProgress,
                UbxStep::Complete { class, id, valid } => valid.then(|| {
                    decode_ubx(class, id, payload.as_slice(), records);
                    Message::Ubx { class, id }
                }),
            },
            State::UnicoreBin(bin) => match bin.step(byte) {
                UnicoreBinStep::Continue => return FrameStatus::InProgress,
                UnicoreBinStep::Complete { header, valid } => valid.then(|| {
                    decode_unicore_bin(header, payload.as_slice(), records);
                    Message::UnicoreBinary {
                        message_id: header.message_id,
                    }
                }),
            },
            State::Rtcm(rtcm) => match rtcm.step(byte) {
                None => return FrameStatus::InProgress,
                Some(message_type) => {
                    if payload.is_full() && rtcm.total_len() > payload.len() {
                        log::debug!("RTCM {} frame truncated", message_type);
                    }
                    Some(Message::Rtcm { message_type })
                },
            },
        };

        *state = State::Idle(Preamble::None);
        FrameStatus::Complete(message)
    }
}

/// Continues a pending sync sequence or looks for a new frame start.
fn idle(sync: Preamble, byte: u8, payload: &mut FixedBuffer<PAYLOAD_BUFFER_LEN>) -> State {
    match (sync, byte) {
        (Preamble::Ubx1, UBX_SYNC_CHAR_2) => {
            payload.extend_from_slice(&[UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2]);
            log::trace!("UBX frame start");
            State::Ubx(UbxParser::default())
        },
        (Preamble::Unicore1, UNICORE_BIN_SYNC_CHAR_2) => State::Idle(Preamble::Unicore2),
        (Preamble::Unicore2, UNICORE_BIN_SYNC_CHAR_3) => {
            payload.extend_from_slice(&[
                UNICORE_BIN_SYNC_CHAR_1,
                UNICORE_BIN_SYNC_CHAR_2,
                UNICORE_BIN_SYNC_CHAR_3,
            ]);
            log::trace!("Unicore binary frame start");
            State::UnicoreBin(UnicoreBinParser::new())
        },
        // a broken sync sequence may still be the start of another protocol
        _ => start(byte, payload),
    }
}

fn start(byte: u8, payload: &mut FixedBuffer<PAYLOAD_BUFFER_LEN>) -> State {
    match byte {
        NMEA_SYNC_CHAR => {
            let _ = payload.push(byte);
            State::Nmea(NmeaParser::default())
        },
        UBX_SYNC_CHAR_1 => State::Idle(Preamble::Ubx1),
        UNICORE_BIN_SYNC_CHAR_1 => State::Idle(Preamble::Unicore1),
        RTCM_SYNC_CHAR => {
            let _ = payload.push(byte);
            log::trace!("RTCM frame start");
            State::Rtcm(RtcmParser::default())
        },
        _ => State::Idle(Preamble::None),
    }
}

fn decode_ubx(class: u8, id: u8, frame: &[u8], records: &mut Records) {
    let Some(payload) = ubx_payload(frame) else {
        log::debug!("UBX {:02x}:{:02x} truncated, not decoded", class, id);
        return;
    };
    match (class, id) {
        (NavHpPosLlh::CLASS, NavHpPosLlh::ID) => {
            if let Some(p) = NavHpPosLlh::from_payload(payload) {
                records.hp_pos_llh = Some(p);
            }
        },
        (NavRelPosNed::CLASS, NavRelPosNed::ID) => {
            if let Some(p) = NavRelPosNed::from_payload(payload) {
                records.rel_pos_ned = Some(p);
            }
        },
        (UBX_CLASS_ACK, _) => {
            if let Some(ack) = UbxAck::from_payload(class, id, payload) {
                records.ack = Some(ack);
            }
        },
        _ => log::debug!("UBX {:02x}:{:02x} not decoded", class, id),
    }
}

fn decode_unicore_bin(header: UnicoreBinHeader, frame: &[u8], records: &mut Records) {
    records.unicore_header = Some(header);
    if header.message_id != UNICORE_MSG_BESTNAV {
        log::debug!("Unicore binary id {} not decoded", header.message_id);
        return;
    }
    let body = frame.get(
        UNICORE_BIN_HEADER_LEN..UNICORE_BIN_HEADER_LEN + usize::from(header.message_len),
    );
    if let Some(nav) = body.and_then(BestNav::from_payload) {
        records.best_nav = Some(nav);
    }
}
