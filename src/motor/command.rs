//! Commands and the channel carrying them to the control loop.
//!
//! Producers never block: the queue is unbounded and lock-free. Once the
//! channel is closed every send fails with `ChannelError::Closed`.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_queue::SegQueue;

use crate::error::{ChannelError, Result};

/// Longest pattern name a command can carry.
pub const MAX_PATTERN_NAME: usize = 16;

/// Step pattern identifier.
pub type PatternId = heapless::String<MAX_PATTERN_NAME>;

/// A request for the control loop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Signed target speed in rpm; the sign selects the direction.
    SetSpeed(f64),
    /// Invert the traversal direction of the step tables.
    SetReverse(bool),
    /// Switch to another step pattern.
    SetMicrostepResolution(PatternId),
}

/// Multi-producer, single-consumer FIFO of commands.
#[derive(Debug, Default)]
pub struct CommandChannel {
    queue: SegQueue<Command>,
    closed: AtomicBool,
}

impl CommandChannel {
    /// Create an open, empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a command.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Closed` once the channel has been closed.
    pub fn send(&self, command: Command) -> Result<()> {
        if self.is_closed() {
            return Err(ChannelError::Closed.into());
        }
        self.queue.push(command);
        Ok(())
    }

    /// Take the oldest command, if any. Never blocks.
    pub fn try_receive(&self) -> Option<Command> {
        self.queue.pop()
    }

    /// Refuse further commands. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// True once closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no command is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
