use core::fmt;

/// Error returned when a UBX command frame cannot be assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// A configuration item carries a value outside of `1..=8` bytes.
    InvalidValueLength { index: usize, len: u8 },
    /// More configuration items or keys than fit in a single frame.
    TooManyItems { count: usize, max: usize },
    /// The encoded frame does not fit the transmit buffer.
    FrameTooLong { max: usize },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::InvalidValueLength { index, len } => write!(
                f,
                "Invalid value length {} for configuration item {}, expect 1..=8",
                len, index
            ),
            BuildError::TooManyItems { count, max } => {
                write!(f, "Too many configuration items: {}, max {}", count, max)
            },
            BuildError::FrameTooLong { max } => {
                write!(f, "Frame does not fit in {} bytes", max)
            },
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BuildError {}

/// Error returned by the command send primitives. None of the variants
/// except `Transport` ever reach the wire.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandError<E> {
    /// Another request is still waiting for its ACK/NAK.
    Busy,
    Build(BuildError),
    Transport(E),
}

impl<E> From<BuildError> for CommandError<E> {
    fn from(e: BuildError) -> Self {
        CommandError::Build(e)
    }
}

impl<E: fmt::Display> fmt::Display for CommandError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Busy => f.write_str("A command is already waiting for acknowledgment"),
            CommandError::Build(e) => write!(f, "Unable to build command: {}", e),
            CommandError::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for CommandError<E> {}

/// Why a step of an init sequence was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitFailure {
    /// The receiver rejected the step.
    Nak,
    /// No ACK/NAK arrived in time.
    Timeout,
    /// The step could not be built or handed to the transport.
    Transmit,
}

/// Terminal failure of an init sequence, delivered to its completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitError {
    pub failed_step: usize,
    pub cause: InitFailure,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cause = match self.cause {
            InitFailure::Nak => "rejected (NAK)",
            InitFailure::Timeout => "timed out",
            InitFailure::Transmit => "could not be transmitted",
        };
        write!(f, "Init step {} {}", self.failed_step, cause)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InitError {}

/// Error returned when an init sequence (or a factory reset) cannot be started.
#[derive(Debug, PartialEq, Eq)]
pub enum InitStartError<E> {
    AlreadyRunning,
    Command(CommandError<E>),
}

impl<E> From<CommandError<E>> for InitStartError<E> {
    fn from(e: CommandError<E>) -> Self {
        InitStartError::Command(e)
    }
}

impl<E: fmt::Display> fmt::Display for InitStartError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStartError::AlreadyRunning => f.write_str("Init sequence already running"),
            InitStartError::Command(e) => write!(f, "Init sequence not started: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for InitStartError<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_display() {
        let err = BuildError::InvalidValueLength { index: 2, len: 9 };
        assert_eq!(
            format!("{}", err),
            "Invalid value length 9 for configuration item 2, expect 1..=8"
        );
    }

    #[test]
    fn init_error_display() {
        let err = InitError {
            failed_step: 4,
            cause: InitFailure::Timeout,
        };
        assert_eq!(format!("{}", err), "Init step 4 timed out");
    }

    #[test]
    fn command_error_wraps_build_error() {
        let err: CommandError<()> = BuildError::TooManyItems { count: 65, max: 64 }.into();
        assert_eq!(
            err,
            CommandError::Build(BuildError::TooManyItems { count: 65, max: 64 })
        );
    }
}
