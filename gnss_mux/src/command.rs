//! Single outstanding UBX request tracked against incoming ACK/NAK frames.

use alloc::boxed::Box;

use crate::{
    error::CommandError,
    transport::{elapsed_ms, Transport},
    ubx_packets::UbxAck,
};

/// Lifecycle of the last request
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandState {
    #[default]
    Idle,
    Waiting,
    Ack,
    Nak,
    Timeout,
}

/// Called once with `true` on ACK, `false` on NAK or timeout.
pub type AckCallback = Box<dyn FnOnce(bool)>;

/// Who is told when the pending request resolves
pub(crate) enum Notify {
    None,
    Callback(AckCallback),
    /// The init sequence, driven by the session
    Init,
}

impl core::fmt::Debug for Notify {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Notify::None => f.write_str("None"),
            Notify::Callback(_) => f.write_str("Callback"),
            Notify::Init => f.write_str("Init"),
        }
    }
}

/// Outcome of routing an ACK-class frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AckRouting {
    /// Not for the pending request, or nothing pending
    Unmatched,
    Matched { acked: bool },
    /// Matched a request sent on behalf of the init sequence
    Init { acked: bool },
}

#[derive(Debug)]
pub struct CommandHandler {
    state: CommandState,
    class: u8,
    id: u8,
    sent_at: u32,
    notify: Notify,
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHandler {
    pub const fn new() -> Self {
        Self {
            state: CommandState::Idle,
            class: 0,
            id: 0,
            sent_at: 0,
            notify: Notify::None,
        }
    }

    /// State without timeout evaluation
    pub fn state(&self) -> CommandState {
        self.state
    }

    /// Class and id of the request waiting for an answer
    pub fn pending(&self) -> Option<(u8, u8)> {
        (self.state == CommandState::Waiting).then_some((self.class, self.id))
    }

    /// State with lazy timeout: a request waiting `timeout_ms` or longer
    /// becomes [`CommandState::Timeout`] and its callback fires with `false`.
    pub fn poll_state(&mut self, now: u32, timeout_ms: u32) -> CommandState {
        if self.state == CommandState::Waiting && elapsed_ms(now, self.sent_at) >= timeout_ms {
            log::debug!(
                "UBX {:02x}:{:02x} timed out after {} ms",
                self.class,
                self.id,
                timeout_ms
            );
            self.state = CommandState::Timeout;
            if let Notify::Callback(cb) = core::mem::replace(&mut self.notify, Notify::None) {
                cb(false);
            }
        }
        self.state
    }

    /// Transmits `frame` and starts waiting for its ACK. Nothing is sent
    /// while another request is waiting.
    pub(crate) fn send<T: Transport>(
        &mut self,
        transport: &mut T,
        frame: &[u8],
        now: u32,
        notify: Notify,
    ) -> Result<(), CommandError<T::Error>> {
        if self.state == CommandState::Waiting {
            return Err(CommandError::Busy);
        }
        transport.send(frame).map_err(CommandError::Transport)?;

        self.class = frame.get(2).copied().unwrap_or_default();
        self.id = frame.get(3).copied().unwrap_or_default();
        self.sent_at = now;
        self.state = CommandState::Waiting;
        self.notify = notify;
        log::debug!("UBX {:02x}:{:02x} sent, waiting for ACK", self.class, self.id);
        Ok(())
    }

    /// Resolves the pending request if `ack` refers to it. The notification
    /// is consumed, a duplicate ACK finds nothing waiting.
    pub(crate) fn on_ack(&mut self, ack: UbxAck) -> AckRouting {
        if self.state != CommandState::Waiting || (ack.class, ack.msg_id) != (self.class, self.id)
        {
            return AckRouting::Unmatched;
        }
        log::debug!(
            "UBX {:02x}:{:02x} {}",
            ack.class,
            ack.msg_id,
            if ack.acked { "ACK" } else { "NAK" }
        );
        self.state = if ack.acked {
            CommandState::Ack
        } else {
            CommandState::Nak
        };
        match core::mem::replace(&mut self.notify, Notify::None) {
            Notify::None => AckRouting::Matched { acked: ack.acked },
            Notify::Callback(cb) => {
                cb(ack.acked);
                AckRouting::Matched { acked: ack.acked }
            },
            Notify::Init => AckRouting::Init { acked: ack.acked },
        }
    }

    /// Forgets a request sent for the init sequence, so the next send goes
    /// out at once and a late ACK for it is unmatched. User requests stay.
    pub(crate) fn abandon_init(&mut self) {
        if matches!(self.notify, Notify::Init) {
            log::debug!("UBX {:02x}:{:02x} abandoned", self.class, self.id);
            self.notify = Notify::None;
            self.state = CommandState::Idle;
        }
    }
}
