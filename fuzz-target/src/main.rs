#[macro_use]
extern crate afl;

use gnss_mux::{Event, Message, Parser, PAYLOAD_BUFFER_LEN};

fn parse(chunksize: usize, data: &[u8]) {
    let mut parser = Parser::new();
    for chunk in data.chunks(chunksize) {
        parser.feed(chunk, &mut |event: &Event<'_>| {
            assert!(event.frame.len() <= PAYLOAD_BUFFER_LEN);
            // decoding whatever arrived must not panic either
            let _ = event.payload();
            let _ = event.ack();
            if let Some(resp) = event.cfg_val_get() {
                resp.iter().for_each(drop);
            }
        });
    }

    // Flush whatever the noise left pending: an NMEA line end ends any text
    // frame, RTCM and binary frames are bounded by their length.
    let mut flush = vec![b'\r', b'\n'];
    flush.resize(2 + PAYLOAD_BUFFER_LEN + 70_000, 0);
    parser.feed(&flush, &mut |_: &Event<'_>| {});

    let ack_ack = [0xb5, 0x62, 0x05, 0x01, 0x02, 0x00, 0x06, 0x8a, 0x98, 0xc1];
    let mut acks = 0;
    parser.feed(&ack_ack, &mut |event: &Event<'_>| {
        if event.message == (Message::Ubx { class: 0x05, id: 0x01 }) {
            acks += 1;
        }
    });
    assert_eq!(acks, 1);
}

fn main() {
    fuzz!(|data: &[u8]| {
        if data.len() > 1 {
            let chunksize = data[0] as usize;
            if chunksize != 0 {
                parse(chunksize, &data[1..]);
            }
        }
    });
}
