use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use gnss_mux::{
    ubx_frame, CfgCfgBuilder, CfgItem, CfgLayerGet, CfgLayerSet, CfgValGetRequestBuilder,
    CfgValGetResponse, CfgValSetBuilder, Clock, CommandError, CommandState, Event, InitConfig,
    InitError, InitFailure, InitStartError, InitState, Message, Parser, Session, SessionConfig,
    Transport, ACK_ID_ACK, ACK_ID_NAK, UBX_CFG_ID_CFG, UBX_CFG_ID_VALSET, UBX_CLASS_ACK,
    UBX_CLASS_CFG,
};
use proptest::prelude::*;

/// Records outgoing frames, answers from a queue of incoming bytes.
#[derive(Debug, Default)]
struct Link {
    sent: Vec<Vec<u8>>,
    rx: VecDeque<u8>,
}

impl Transport for Link {
    type Error = std::io::Error;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

/// Shared millisecond counter, `delay_ms` moves it forward.
#[derive(Debug, Default, Clone)]
struct Ticks(Rc<Cell<u32>>);

impl Ticks {
    fn advance(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

impl Clock for Ticks {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms);
    }
}

fn ack(acked: bool, class: u8, id: u8) -> Vec<u8> {
    let ack_id = if acked { ACK_ID_ACK } else { ACK_ID_NAK };
    ubx_frame(UBX_CLASS_ACK, ack_id, &[class, id])
        .unwrap()
        .to_vec()
}

fn session_with(config: InitConfig) -> (Session<Link, Ticks>, Ticks) {
    let ticks = Ticks::default();
    let config = SessionConfig {
        init: config,
        ..SessionConfig::default()
    };
    (
        Session::with_config(Link::default(), ticks.clone(), config),
        ticks,
    )
}

fn answer(session: &mut Session<Link, Ticks>, acked: bool, id: u8) {
    let frame = ack(acked, UBX_CLASS_CFG, id);
    session.feed(&frame, &mut |_: &Event<'_>| {});
}

fn outcome() -> (
    Rc<RefCell<Option<Result<(), InitError>>>>,
    impl FnOnce(Result<(), InitError>) + 'static,
) {
    let slot = Rc::new(RefCell::new(None));
    let sink = slot.clone();
    (slot, move |r| *sink.borrow_mut() = Some(r))
}

fn arb_item() -> impl Strategy<Value = CfgItem> {
    let key = any::<u32>().prop_map(|k| k & 0x0fff_ffff);
    prop_oneof![
        (key.clone(), any::<bool>()).prop_map(|(k, v)| CfgItem::bool(0x1000_0000 | k, v)),
        (key.clone(), any::<u8>()).prop_map(|(k, v)| CfgItem::u8(0x2000_0000 | k, v)),
        (key.clone(), any::<u16>()).prop_map(|(k, v)| CfgItem::u16(0x3000_0000 | k, v)),
        (key.clone(), any::<u32>()).prop_map(|(k, v)| CfgItem::u32(0x4000_0000 | k, v)),
        (key, any::<u64>()).prop_map(|(k, v)| CfgItem::u64(0x5000_0000 | k, v)),
    ]
}

proptest! {
    #[test]
    fn test_valset_frames_parse_back(items in proptest::collection::vec(arb_item(), 1..=64)) {
        let frame = CfgValSetBuilder::new(CfgLayerSet::RAM, &items)
            .into_packet_bytes()
            .unwrap();
        let expected_len: usize = items.iter().map(|i| 4 + i.value().len()).sum();
        prop_assert_eq!(frame.len(), 6 + 4 + expected_len + 2);

        let mut parser = Parser::default();
        let mut seen = vec![];
        let mut decoded = vec![];
        parser.feed(&frame, &mut |event: &Event<'_>| {
            seen.push((event.message, event.payload().map(<[u8]>::len)));
            // VALSET shares the key/value layout of a VALGET response
            if let Some(resp) = event.payload().and_then(CfgValGetResponse::from_payload) {
                decoded.extend(resp.iter().map(|(key, value)| (key.0, value.to_vec())));
            }
        });
        prop_assert_eq!(
            seen,
            vec![(
                Message::Ubx { class: UBX_CLASS_CFG, id: UBX_CFG_ID_VALSET },
                Some(4 + expected_len)
            )]
        );
        let expected: Vec<(u32, Vec<u8>)> =
            items.iter().map(|i| (i.key_id, i.value().to_vec())).collect();
        prop_assert_eq!(decoded, expected);
    }
}

#[test]
fn test_sync_valset_acked_after_delay() {
    let (mut session, ticks) = session_with(InitConfig::default());
    let items = [CfgItem::u8(0x2005_0035, 1)];

    // the answer shows up only once the first poll found nothing
    let reply = ack(true, UBX_CLASS_CFG, UBX_CFG_ID_VALSET);
    session
        .send_valset(CfgValSetBuilder::new(CfgLayerSet::RAM, &items))
        .unwrap();
    session.poll(&mut |_: &Event<'_>| {}).unwrap();
    ticks.advance(40);
    session.transport_mut().rx.extend(reply);
    assert!(session.wait_for_ack(1000, &mut |_: &Event<'_>| {}).unwrap());
    assert_eq!(session.command_state(1000), CommandState::Ack);
    assert_eq!(session.transport().sent.len(), 1);
}

#[test]
fn test_sync_valset_times_out() {
    let (mut session, ticks) = session_with(InitConfig::default());
    let items = [CfgItem::bool(0x1011_0025, true)];
    let acked = session
        .send_valset_sync(
            CfgValSetBuilder::new(CfgLayerSet::RAM, &items),
            500,
            &mut |_: &Event<'_>| {},
        )
        .unwrap();
    assert!(!acked);
    assert!(ticks.now_ms() >= 500);
    assert_eq!(session.command_state(500), CommandState::Timeout);
}

#[test]
fn test_one_command_in_flight() {
    let (mut session, _) = session_with(InitConfig::default());
    let items = [CfgItem::u8(0x2005_0035, 1)];
    session
        .send_valset(CfgValSetBuilder::new(CfgLayerSet::RAM, &items))
        .unwrap();
    let keys = [0x2005_0035];
    let err = session
        .send_valget(CfgValGetRequestBuilder::new(CfgLayerGet::Ram, &keys), None)
        .unwrap_err();
    assert!(matches!(err, CommandError::Busy));
    assert_eq!(session.transport().sent.len(), 1);

    // an ACK for some other message leaves the pending one alone
    answer(&mut session, true, UBX_CFG_ID_CFG);
    assert_eq!(session.command_state(3000), CommandState::Waiting);

    answer(&mut session, false, UBX_CFG_ID_VALSET);
    assert_eq!(session.command_state(3000), CommandState::Nak);
    session
        .send_valget(CfgValGetRequestBuilder::new(CfgLayerGet::Ram, &keys), None)
        .unwrap();
    assert_eq!(session.transport().sent.len(), 2);
}

#[test]
fn test_callback_fires_once() {
    let (mut session, _) = session_with(InitConfig::default());
    let calls = Rc::new(RefCell::new(vec![]));
    let sink = calls.clone();
    session
        .send_cfg_cfg(
            CfgCfgBuilder::factory_reset(),
            Some(Box::new(move |acked: bool| sink.borrow_mut().push(acked))),
        )
        .unwrap();
    answer(&mut session, true, UBX_CFG_ID_CFG);
    answer(&mut session, true, UBX_CFG_ID_CFG);
    assert_eq!(*calls.borrow(), [true]);
}

#[test]
fn test_init_sequence_runs_every_step() {
    let (mut session, _) = session_with(InitConfig::default());
    let items = vec![
        CfgItem::u8(0x2005_0035, 1),
        CfgItem::u16(0x3005_0001, 1000),
        CfgItem::u32(0x4052_0001, 460_800),
    ];
    let (result, on_complete) = outcome();
    session
        .init_async_start(items, CfgLayerSet::RAM | CfgLayerSet::BBR, on_complete)
        .unwrap();

    for step in 0..3 {
        assert_eq!(session.init_async_state(), InitState::Running);
        assert_eq!(session.init_async_step(), step);
        answer(&mut session, true, UBX_CFG_ID_VALSET);
        session.init_async_process();
    }
    assert_eq!(session.init_async_state(), InitState::Done);
    assert_eq!(*result.borrow(), Some(Ok(())));
    assert_eq!(session.transport().sent.len(), 3);
    assert!(matches!(
        session.init_async_start(vec![], CfgLayerSet::RAM, |_| {}),
        Ok(())
    ));
}

#[test]
fn test_init_gives_up_after_max_retries() {
    let config = InitConfig {
        max_retries: 3,
        ..InitConfig::default()
    };
    let (mut session, _) = session_with(config);
    let items = vec![CfgItem::u8(0x2005_0035, 1), CfgItem::u8(0x2005_0036, 2)];
    let (result, on_complete) = outcome();
    session
        .init_async_start(items, CfgLayerSet::RAM, on_complete)
        .unwrap();

    answer(&mut session, true, UBX_CFG_ID_VALSET);
    session.init_async_process();
    for _ in 0..10 {
        answer(&mut session, false, UBX_CFG_ID_VALSET);
        session.init_async_process();
    }
    assert_eq!(session.init_async_state(), InitState::Error);
    assert_eq!(session.init_async_step(), 1);
    // one for step 0, three for step 1
    assert_eq!(session.transport().sent.len(), 4);
    assert_eq!(
        *result.borrow(),
        Some(Err(InitError {
            failed_step: 1,
            cause: InitFailure::Nak
        }))
    );
}

#[test]
fn test_init_retries_after_timeout() {
    let config = InitConfig {
        max_retries: 2,
        ack_timeout_ms: 100,
        ..InitConfig::default()
    };
    let (mut session, ticks) = session_with(config);
    let (result, on_complete) = outcome();
    session
        .init_async_start(vec![CfgItem::u8(0x2005_0035, 1)], CfgLayerSet::RAM, on_complete)
        .unwrap();

    ticks.advance(99);
    assert_eq!(session.init_async_process(), InitState::Running);
    assert_eq!(session.transport().sent.len(), 1);

    ticks.advance(1);
    assert_eq!(session.init_async_process(), InitState::Running);
    assert_eq!(session.transport().sent.len(), 2);

    ticks.advance(100);
    assert_eq!(session.init_async_process(), InitState::Error);
    assert_eq!(
        *result.borrow(),
        Some(Err(InitError {
            failed_step: 0,
            cause: InitFailure::Timeout
        }))
    );
}

#[test]
fn test_factory_reset() {
    let (mut session, _) = session_with(InitConfig::default());
    let (result, on_complete) = outcome();
    session.factory_reset(on_complete).unwrap();
    assert!(matches!(
        session.factory_reset(|_| {}),
        Err(InitStartError::AlreadyRunning)
    ));

    let sent = &session.transport().sent;
    assert_eq!(sent.len(), 1);
    assert_eq!(&sent[0][2..4], &[UBX_CLASS_CFG, UBX_CFG_ID_CFG]);

    answer(&mut session, true, UBX_CFG_ID_CFG);
    assert_eq!(session.init_async_process(), InitState::Done);
    assert_eq!(*result.borrow(), Some(Ok(())));
}

#[test]
fn test_cancel_drops_callback() {
    let (mut session, _) = session_with(InitConfig::default());
    let (result, on_complete) = outcome();
    session.factory_reset(on_complete).unwrap();
    session.init_async_cancel();
    assert_eq!(session.init_async_state(), InitState::Idle);

    answer(&mut session, true, UBX_CFG_ID_CFG);
    session.init_async_process();
    assert_eq!(session.init_async_state(), InitState::Idle);
    assert!(result.borrow().is_none());
}

#[test]
fn test_user_commands_wait_for_init() {
    let config = InitConfig {
        max_retries: 2,
        ack_timeout_ms: 100,
        ..InitConfig::default()
    };
    let (mut session, ticks) = session_with(config);
    let items = vec![CfgItem::u8(0x2005_0035, 1), CfgItem::u8(0x2005_0036, 2)];
    let (result, on_complete) = outcome();
    session
        .init_async_start(items, CfgLayerSet::RAM, on_complete)
        .unwrap();

    // step 0 acknowledged, the slot is free until the next process call
    answer(&mut session, true, UBX_CFG_ID_VALSET);
    assert_eq!(session.command_state(100), CommandState::Ack);
    let user = [CfgItem::u8(0x2091_0001, 1)];
    assert!(matches!(
        session.send_valset(CfgValSetBuilder::new(CfgLayerSet::RAM, &user)),
        Err(CommandError::Busy)
    ));
    assert!(matches!(
        session.send_cfg_cfg(CfgCfgBuilder::factory_reset(), None),
        Err(CommandError::Busy)
    ));
    assert_eq!(session.transport().sent.len(), 1);

    // no user request timed out behind the sequence's back
    ticks.advance(500);
    assert_eq!(session.init_async_process(), InitState::Running);
    assert_eq!(session.init_async_step(), 1);
    assert_eq!(session.transport().sent.len(), 2);
    answer(&mut session, true, UBX_CFG_ID_VALSET);
    assert_eq!(session.init_async_process(), InitState::Done);
    assert_eq!(*result.borrow(), Some(Ok(())));

    session
        .send_valset(CfgValSetBuilder::new(CfgLayerSet::RAM, &user))
        .unwrap();
    assert_eq!(session.transport().sent.len(), 3);
}

#[test]
fn test_restart_right_after_cancel() {
    let (mut session, _) = session_with(InitConfig::default());
    let (first, on_complete) = outcome();
    session
        .init_async_start(vec![CfgItem::u8(0x2005_0035, 1)], CfgLayerSet::RAM, on_complete)
        .unwrap();
    session.init_async_cancel();
    assert_eq!(session.command_state(3000), CommandState::Idle);

    let (second, on_complete) = outcome();
    session.factory_reset(on_complete).unwrap();
    assert_eq!(session.transport().sent.len(), 2);
    answer(&mut session, true, UBX_CFG_ID_CFG);
    assert_eq!(session.init_async_process(), InitState::Done);
    assert!(first.borrow().is_none());
    assert_eq!(*second.borrow(), Some(Ok(())));
}
