//! One receiver: parser, command engine and init sequence bound to a
//! transport and a clock.

use alloc::{boxed::Box, vec::Vec};

use crate::{
    command::{AckCallback, AckRouting, CommandHandler, CommandState, Notify},
    error::{CommandError, InitError, InitStartError},
    init::{InitConfig, InitJob, InitSequence, InitState},
    parser::{Event, EventHandler, Parser, Records},
    transport::{Clock, Transport},
    ubx_packets::{CfgCfgBuilder, CfgItem, CfgLayerSet, CfgValGetRequestBuilder, CfgValSetBuilder},
};

/// Read chunk used by [`Session::poll`]
const RECV_CHUNK_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    pub init: InitConfig,
    /// Pause between transport polls while a blocking send waits for its ACK
    pub sync_poll_interval_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            init: InitConfig::default(),
            sync_poll_interval_ms: 10,
        }
    }
}

/// A receiver session.
///
/// Incoming bytes go through [`Session::feed`] (or [`Session::poll`], which
/// reads the transport first). ACK/NAK frames resolve the pending command
/// before the event reaches the caller's handler.
#[derive(Debug)]
pub struct Session<T: Transport, C: Clock> {
    parser: Parser,
    command: CommandHandler,
    init: InitSequence,
    transport: T,
    clock: C,
    config: SessionConfig,
}

impl<T: Transport, C: Clock> Session<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        Self::with_config(transport, clock, SessionConfig::default())
    }

    pub fn with_config(transport: T, clock: C, config: SessionConfig) -> Self {
        Self {
            parser: Parser::new(),
            command: CommandHandler::new(),
            init: InitSequence::new(config.init),
            transport,
            clock,
            config,
        }
    }

    pub fn records(&self) -> &Records {
        self.parser.records()
    }

    /// Raw text of the last GGA with a fix, for forwarding to a caster
    pub fn last_gga(&self) -> Option<&[u8]> {
        self.parser.records().last_gga()
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn into_inner(self) -> (T, C) {
        (self.transport, self.clock)
    }

    /// Parses `bytes`, routing ACK/NAK frames to the pending command first.
    pub fn feed<H>(&mut self, bytes: &[u8], handler: &mut H) -> usize
    where
        H: EventHandler + ?Sized,
    {
        let Self {
            parser,
            command,
            init,
            ..
        } = self;
        parser.feed(bytes, &mut |event: &Event<'_>| {
            if let Some(ack) = event.ack() {
                match command.on_ack(ack) {
                    AckRouting::Init { acked } => init.on_ack(acked),
                    AckRouting::Matched { .. } | AckRouting::Unmatched => {},
                }
            }
            handler.handle(event);
        })
    }

    /// Reads once from the transport and feeds what arrived.
    pub fn poll<H>(&mut self, handler: &mut H) -> Result<usize, T::Error>
    where
        H: EventHandler + ?Sized,
    {
        let mut buf = [0u8; RECV_CHUNK_LEN];
        let n = self.transport.recv(&mut buf)?;
        Ok(self.feed(&buf[..n], handler))
    }

    /// State of the last command, turning into `Timeout` once `timeout_ms`
    /// elapsed without an answer.
    pub fn command_state(&mut self, timeout_ms: u32) -> CommandState {
        self.command.poll_state(self.clock.now_ms(), timeout_ms)
    }

    /// User requests share the command slot with the init sequence, which
    /// owns it until it leaves `Running`.
    fn send(&mut self, frame: &[u8], notify: Notify) -> Result<(), CommandError<T::Error>> {
        if self.init.state() == InitState::Running {
            return Err(CommandError::Busy);
        }
        let now = self.clock.now_ms();
        self.command.send(&mut self.transport, frame, now, notify)
    }

    /// Sends a VALSET without waiting, see [`Session::command_state`].
    /// Fails with [`CommandError::Busy`] while a command or the init
    /// sequence is in flight.
    pub fn send_valset(
        &mut self,
        builder: CfgValSetBuilder<'_>,
    ) -> Result<(), CommandError<T::Error>> {
        let frame = builder.into_packet_bytes()?;
        self.send(&frame, Notify::None)
    }

    /// Sends a VALSET, `on_ack` fires once with the outcome.
    pub fn send_valset_cb<F>(
        &mut self,
        builder: CfgValSetBuilder<'_>,
        on_ack: F,
    ) -> Result<(), CommandError<T::Error>>
    where
        F: FnOnce(bool) + 'static,
    {
        let frame = builder.into_packet_bytes()?;
        self.send(&frame, Notify::Callback(Box::new(on_ack)))
    }

    /// Sends a VALSET and polls the transport until it is acknowledged,
    /// rejected or `timeout_ms` elapsed. Frames arriving meanwhile go to `handler`.
    pub fn send_valset_sync<H>(
        &mut self,
        builder: CfgValSetBuilder<'_>,
        timeout_ms: u32,
        handler: &mut H,
    ) -> Result<bool, CommandError<T::Error>>
    where
        H: EventHandler + ?Sized,
    {
        self.send_valset(builder)?;
        self.wait_for_ack(timeout_ms, handler)
    }

    /// Blocks until the pending command resolves, `Ok(true)` on ACK.
    pub fn wait_for_ack<H>(
        &mut self,
        timeout_ms: u32,
        handler: &mut H,
    ) -> Result<bool, CommandError<T::Error>>
    where
        H: EventHandler + ?Sized,
    {
        loop {
            self.poll(handler).map_err(CommandError::Transport)?;
            match self.command_state(timeout_ms) {
                CommandState::Waiting => self.clock.delay_ms(self.config.sync_poll_interval_ms),
                CommandState::Ack => return Ok(true),
                CommandState::Nak | CommandState::Timeout | CommandState::Idle => {
                    return Ok(false)
                },
            }
        }
    }

    /// Polls configuration values; the reply arrives as a CFG-VALGET event
    /// followed by an ACK.
    pub fn send_valget(
        &mut self,
        builder: CfgValGetRequestBuilder<'_>,
        on_ack: Option<AckCallback>,
    ) -> Result<(), CommandError<T::Error>> {
        let frame = builder.into_packet_bytes()?;
        self.send(&frame, on_ack.map_or(Notify::None, Notify::Callback))
    }

    pub fn send_cfg_cfg(
        &mut self,
        builder: CfgCfgBuilder,
        on_ack: Option<AckCallback>,
    ) -> Result<(), CommandError<T::Error>> {
        let frame = builder.into_packet_bytes()?;
        self.send(&frame, on_ack.map_or(Notify::None, Notify::Callback))
    }

    /// Starts writing `items` one VALSET at a time. Keep calling
    /// [`Session::init_async_process`] until the state leaves `Running`.
    pub fn init_async_start<F>(
        &mut self,
        items: Vec<CfgItem>,
        layers: CfgLayerSet,
        on_complete: F,
    ) -> Result<(), InitStartError<T::Error>>
    where
        F: FnOnce(Result<(), InitError>) + 'static,
    {
        self.start_job(InitJob::Items { layers, items }, Box::new(on_complete))
    }

    /// Clears the receiver configuration through the init sequence, with the
    /// same retry policy.
    pub fn factory_reset<F>(&mut self, on_complete: F) -> Result<(), InitStartError<T::Error>>
    where
        F: FnOnce(Result<(), InitError>) + 'static,
    {
        self.start_job(InitJob::FactoryReset, Box::new(on_complete))
    }

    fn start_job(
        &mut self,
        job: InitJob,
        on_complete: crate::init::InitCallback,
    ) -> Result<(), InitStartError<T::Error>> {
        let now = self.clock.now_ms();
        self.init
            .start(job, on_complete, &mut self.command, &mut self.transport, now)
    }

    /// Pumps the init sequence: handles timeouts and sends the next or the
    /// retried step. Never blocks.
    pub fn init_async_process(&mut self) -> InitState {
        let now = self.clock.now_ms();
        self.init
            .process(&mut self.command, &mut self.transport, now);
        self.init.state()
    }

    pub fn init_async_state(&self) -> InitState {
        self.init.state()
    }

    /// Index of the step in flight, or of the failed step
    pub fn init_async_step(&self) -> usize {
        self.init.current_step()
    }

    pub fn init_async_cancel(&mut self) {
        self.init.cancel(&mut self.command);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        error::{InitFailure, InitError},
        transport::mock::{ManualClock, MockTransport},
        ubx_packets::{ubx_frame, UBX_CLASS_ACK, ACK_ID_ACK, ACK_ID_NAK},
    };

    fn ack_frame(acked: bool, class: u8, id: u8) -> Vec<u8> {
        let ack_id = if acked { ACK_ID_ACK } else { ACK_ID_NAK };
        ubx_frame(UBX_CLASS_ACK, ack_id, &[class, id]).unwrap().to_vec()
    }

    fn session() -> Session<MockTransport, ManualClock> {
        Session::new(MockTransport::default(), ManualClock::default())
    }

    #[test]
    fn sync_valset_acked() {
        let mut s = session();
        s.transport_mut().rx.extend(ack_frame(true, 0x06, 0x8a));
        let items = [CfgItem::u8(0x2005_0035, 1)];
        let mut events = 0;
        let acked = s
            .send_valset_sync(
                CfgValSetBuilder::new(CfgLayerSet::RAM, &items),
                1000,
                &mut |_: &Event<'_>| events += 1,
            )
            .unwrap();
        assert!(acked);
        assert_eq!(events, 1);
        assert_eq!(s.transport().sent.len(), 1);
    }

    #[test]
    fn sync_valset_times_out() {
        let mut s = session();
        let items = [CfgItem::u8(0x2005_0035, 1)];
        let acked = s
            .send_valset_sync(
                CfgValSetBuilder::new(CfgLayerSet::RAM, &items),
                100,
                &mut |_: &Event<'_>| {},
            )
            .unwrap();
        assert!(!acked);
        assert_eq!(s.command_state(100), CommandState::Timeout);
        assert!(s.clock().now_ms() >= 100);
    }

    #[test]
    fn busy_send_does_not_transmit() {
        let mut s = session();
        let items = [CfgItem::u8(0x2005_0035, 1)];
        s.send_valset(CfgValSetBuilder::new(CfgLayerSet::RAM, &items))
            .unwrap();
        assert_eq!(
            s.send_cfg_cfg(CfgCfgBuilder::factory_reset(), None),
            Err(CommandError::Busy)
        );
        assert_eq!(s.transport().sent.len(), 1);
        assert_eq!(s.command_state(3000), CommandState::Waiting);
    }

    #[test]
    fn callback_variant_resolved_by_feed() {
        let mut s = session();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let items = [CfgItem::bool(0x1011_0025, true)];
        s.send_valset_cb(CfgValSetBuilder::new(CfgLayerSet::RAM, &items), move |a| {
            *sink.borrow_mut() = Some(a)
        })
        .unwrap();
        s.feed(&ack_frame(false, 0x06, 0x8a), &mut |_: &Event<'_>| {});
        assert_eq!(*seen.borrow(), Some(false));
        assert_eq!(s.command_state(3000), CommandState::Nak);
    }

    #[test]
    fn factory_reset_runs_through_init() {
        let mut s = session();
        let outcome = Rc::new(RefCell::new(None));
        let sink = outcome.clone();
        s.factory_reset(move |r| *sink.borrow_mut() = Some(r)).unwrap();
        assert_eq!(s.init_async_state(), InitState::Running);
        assert_eq!(&s.transport().sent[0][2..4], &[0x06, 0x09]);

        // no answer: two retries, then failure
        for _ in 0..3 {
            s.clock().advance(3000);
            s.init_async_process();
        }
        assert_eq!(s.transport().sent.len(), 3);
        assert_eq!(s.init_async_state(), InitState::Error);
        assert_eq!(
            *outcome.borrow(),
            Some(Err(InitError {
                failed_step: 0,
                cause: InitFailure::Timeout,
            }))
        );
    }

    #[test]
    fn init_sequence_over_the_wire() {
        let mut s = session();
        let outcome = Rc::new(RefCell::new(None));
        let sink = outcome.clone();
        let items = vec![CfgItem::u8(0x2005_0035, 1), CfgItem::u16(0x3005_0001, 1000)];
        s.init_async_start(items, CfgLayerSet::RAM | CfgLayerSet::BBR, move |r| {
            *sink.borrow_mut() = Some(r)
        })
        .unwrap();
        assert_eq!(
            s.init_async_start(Vec::new(), CfgLayerSet::RAM, |_| {}),
            Err(InitStartError::AlreadyRunning)
        );

        while s.init_async_state() == InitState::Running {
            let ack = ack_frame(true, 0x06, 0x8a);
            s.feed(&ack, &mut |_: &Event<'_>| {});
            s.init_async_process();
        }
        assert_eq!(s.transport().sent.len(), 2);
        assert_eq!(*outcome.borrow(), Some(Ok(())));
        // layer byte of the second VALSET
        assert_eq!(s.transport().sent[1][7], 0x03);
    }
}
