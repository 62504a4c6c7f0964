//! Multi-step receiver configuration with per-step retry.
//!
//! Each step is one frame sent through the [`CommandHandler`]. An ACK moves
//! to the next step. A NAK or a timeout resends the same step until
//! `max_retries` transmissions failed, then the sequence stops in
//! [`InitState::Error`] and reports the failing step.

use alloc::{boxed::Box, vec::Vec};

use crate::{
    command::{CommandHandler, CommandState, Notify},
    error::{BuildError, CommandError, InitError, InitFailure, InitStartError},
    transport::Transport,
    ubx_packets::{CfgCfgBuilder, CfgItem, CfgLayerSet, CfgValSetBuilder, Frame},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitState {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InitConfig {
    /// Total transmissions of one step before giving up, counting the
    /// first one. `0` behaves as `1`: every step is sent at least once.
    pub max_retries: u32,
    pub ack_timeout_ms: u32,
    /// Stop at the first NAK instead of retrying
    pub abort_on_nak: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            ack_timeout_ms: 3000,
            abort_on_nak: false,
        }
    }
}

/// Completion of an init sequence or factory reset
pub type InitCallback = Box<dyn FnOnce(Result<(), InitError>)>;

/// What the sequence sends
#[derive(Debug, Clone, PartialEq)]
pub enum InitJob {
    /// One VALSET per item, in order
    Items {
        layers: CfgLayerSet,
        items: Vec<CfgItem>,
    },
    /// A single CFG-CFG clearing and reloading every section
    FactoryReset,
}

impl InitJob {
    pub fn steps(&self) -> usize {
        match self {
            InitJob::Items { items, .. } => items.len(),
            InitJob::FactoryReset => 1,
        }
    }

    fn frame(&self, step: usize) -> Result<Frame, BuildError> {
        match self {
            InitJob::Items { layers, items } => {
                let item = items.get(step..=step).unwrap_or_default();
                CfgValSetBuilder::new(*layers, item).into_packet_bytes()
            },
            InitJob::FactoryReset => CfgCfgBuilder::factory_reset().into_packet_bytes(),
        }
    }

    fn validate(&self) -> Result<(), BuildError> {
        (0..self.steps()).try_for_each(|step| {
            self.frame(step).map(|_| ()).map_err(|e| match e {
                BuildError::InvalidValueLength { len, .. } => {
                    BuildError::InvalidValueLength { index: step, len }
                },
                other => other,
            })
        })
    }
}

pub struct InitSequence {
    state: InitState,
    step: usize,
    retries: u32,
    config: InitConfig,
    job: InitJob,
    on_complete: Option<InitCallback>,
}

impl core::fmt::Debug for InitSequence {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InitSequence")
            .field("state", &self.state)
            .field("step", &self.step)
            .field("retries", &self.retries)
            .field("config", &self.config)
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

impl InitSequence {
    pub fn new(config: InitConfig) -> Self {
        Self {
            state: InitState::Idle,
            step: 0,
            retries: 0,
            config,
            job: InitJob::Items {
                layers: CfgLayerSet::RAM,
                items: Vec::new(),
            },
            on_complete: None,
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    /// Index of the step being sent, or the failed one after an error
    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn config(&self) -> &InitConfig {
        &self.config
    }

    /// Starts `job` and transmits its first step. An empty job completes
    /// at once. Nothing changes if the first transmission fails.
    pub(crate) fn start<T: Transport>(
        &mut self,
        job: InitJob,
        on_complete: InitCallback,
        command: &mut CommandHandler,
        transport: &mut T,
        now: u32,
    ) -> Result<(), InitStartError<T::Error>> {
        if self.state == InitState::Running {
            return Err(InitStartError::AlreadyRunning);
        }
        job.validate().map_err(CommandError::<T::Error>::Build)?;

        if job.steps() == 0 {
            self.reset(job);
            self.state = InitState::Done;
            on_complete(Ok(()));
            return Ok(());
        }

        let frame = job.frame(0).map_err(CommandError::<T::Error>::Build)?;
        command.send(transport, &frame, now, Notify::Init)?;
        log::debug!("Init sequence started, {} steps", job.steps());
        self.reset(job);
        self.state = InitState::Running;
        self.on_complete = Some(on_complete);
        Ok(())
    }

    /// ACK or NAK for the step in flight
    pub(crate) fn on_ack(&mut self, acked: bool) {
        if self.state != InitState::Running {
            return;
        }
        if acked {
            self.retries = 0;
            self.step += 1;
            if self.step >= self.job.steps() {
                log::debug!("Init sequence done");
                self.state = InitState::Done;
                if let Some(cb) = self.on_complete.take() {
                    cb(Ok(()));
                }
            }
            return;
        }
        self.retries += 1;
        log::warn!(
            "Init step {} rejected ({}/{})",
            self.step,
            self.retries,
            self.config.max_retries
        );
        if self.config.abort_on_nak || self.retries >= self.config.max_retries {
            self.fail(InitFailure::Nak);
        }
    }

    /// Advances the sequence from the command state. Does nothing unless
    /// running with no request in flight.
    pub(crate) fn process<T: Transport>(
        &mut self,
        command: &mut CommandHandler,
        transport: &mut T,
        now: u32,
    ) {
        if self.state != InitState::Running {
            return;
        }
        match command.poll_state(now, self.config.ack_timeout_ms) {
            CommandState::Waiting => return,
            CommandState::Timeout => {
                self.retries += 1;
                log::warn!(
                    "Init step {} timed out ({}/{})",
                    self.step,
                    self.retries,
                    self.config.max_retries
                );
                if self.retries >= self.config.max_retries {
                    self.fail(InitFailure::Timeout);
                    return;
                }
            },
            CommandState::Idle | CommandState::Ack | CommandState::Nak => {},
        }
        self.send_step(command, transport, now);
    }

    /// Back to idle at step 0, the completion callback is dropped and the
    /// step in flight stops waiting for its ACK.
    pub(crate) fn cancel(&mut self, command: &mut CommandHandler) {
        command.abandon_init();
        self.state = InitState::Idle;
        self.step = 0;
        self.retries = 0;
        self.on_complete = None;
    }

    fn send_step<T: Transport>(
        &mut self,
        command: &mut CommandHandler,
        transport: &mut T,
        now: u32,
    ) {
        let sent = self
            .job
            .frame(self.step)
            .map_err(CommandError::Build)
            .and_then(|frame| command.send(transport, &frame, now, Notify::Init));
        if sent.is_err() {
            self.fail(InitFailure::Transmit);
        }
    }

    fn reset(&mut self, job: InitJob) {
        self.job = job;
        self.step = 0;
        self.retries = 0;
    }

    fn fail(&mut self, cause: InitFailure) {
        let err = InitError {
            failed_step: self.step,
            cause,
        };
        log::warn!("{}", err);
        self.state = InitState::Error;
        if let Some(cb) = self.on_complete.take() {
            cb(Err(err));
        }
    }
}
