//! Deadline policies and flush triggers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the flush deadline relates to buffer activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Deadline is fixed when the batch goes from empty to non-empty.
    #[default]
    FirstItem,
    /// Deadline is pushed back on every accepted append.
    LastItem,
}

impl Policy {
    /// Whether an append to a non-empty batch restarts the deadline.
    pub fn rearms_on_append(self) -> bool {
        matches!(self, Self::LastItem)
    }

    /// Kebab-case name, as accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstItem => "first-item",
            Self::LastItem => "last-item",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The batch reached the configured limit.
    Size,
    /// The deadline timer fired.
    Deadline,
    /// An explicit `force_process` call.
    Force,
    /// The final flush performed by `close`.
    Close,
}

impl FlushTrigger {
    /// Label used in log fields and the `trigger` metric attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Deadline => "deadline",
            Self::Force => "force",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
