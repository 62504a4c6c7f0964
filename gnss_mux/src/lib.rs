//! # gnss_mux
//!
//! Streaming parser for a single serial link carrying several GNSS receiver protocols at once:
//! NMEA-0183 sentences, UBX frames, Unicore ASCII command echoes, Unicore binary messages and RTCM3
//! correction frames. On top of the parser sits a UBX command engine (VALSET, VALGET, CFG-CFG)
//! that tracks one request at a time against ACK/NAK frames, and a multi-step init sequence with retry.
//!
//! Parsing Frames
//! ==============
//!
//! Bytes go into a `Parser` through `feed()`, in chunks of any size. Every frame completing with a valid
//! checksum is reported to the handler, and the decoded records are kept in the parser:
//! ```
//! use gnss_mux::{Event, Message, NmeaSentence, Parser};
//!
//! let mut parser = Parser::new();
//! let data = b"$GPGGA,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,*5B\r\n";
//! let mut sentences = 0;
//! parser.feed(data, &mut |event: &Event<'_>| {
//!     if event.message == Message::Nmea(NmeaSentence::Gga) {
//!         sentences += 1;
//!     }
//! });
//! assert_eq!(sentences, 1);
//! assert_eq!(parser.records().gga.unwrap().sat_num, 8);
//! ```
//!
//! Constructing Commands
//! =====================
//!
//! Commands are built with the `Builder` structs, for example:
//! ```
//! use gnss_mux::{CfgItem, CfgLayerSet, CfgValSetBuilder};
//!
//! let items = [CfgItem::u8(0x2005_0035, 1), CfgItem::bool(0x1011_0025, true)];
//! let frame = CfgValSetBuilder::new(CfgLayerSet::RAM | CfgLayerSet::FLASH, &items)
//!     .into_packet_bytes()
//!     .unwrap();
//! assert_eq!(&frame[..4], &[0xb5, 0x62, 0x06, 0x8a]);
//! ```
//!
//! Talking to a Receiver
//! =====================
//!
//! With the `alloc` feature, a `Session` binds the parser and the command engine to a `Transport`
//! and a `Clock`, see its documentation for the blocking, callback and init sequence variants.
//!
//! no_std Support
//! ==============
//!
//! The parser and the command builders work without `std` and without an allocator: all buffers have a
//! capacity fixed at compile time. Frames exceeding it are truncated but still framed and checked.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;
extern crate core;
#[cfg(feature = "serde")]
extern crate serde;

pub use crate::{
    constants::*,
    error::{BuildError, CommandError, InitError, InitFailure, InitStartError},
    nmea_sentences::*,
    parser::{
        buffer::FixedBuffer,
        checksum::{nmea_checksum, ubx_checksum, unicore_crc32, CRC_32_UNICORE},
        term::{parse_char, parse_number, parse_real},
        Event, EventHandler, Message, Parser, Protocol, Records,
    },
    types::{Position, Velocity},
    ubx_packets::*,
    unicore_packets::*,
};

#[cfg(feature = "alloc")]
pub use crate::{
    command::{AckCallback, CommandHandler, CommandState},
    init::{InitCallback, InitConfig, InitJob, InitSequence, InitState},
    session::{Session, SessionConfig},
};

pub use crate::transport::{Clock, Transport};

#[cfg(feature = "std")]
pub use crate::transport::StdClock;

mod bytes;
#[cfg(feature = "alloc")]
mod command;
mod constants;
mod error;
#[cfg(feature = "alloc")]
mod init;
mod nmea_sentences;
mod parser;
#[cfg(feature = "alloc")]
mod session;
mod transport;
mod types;
mod ubx_packets;
mod unicore_packets;
