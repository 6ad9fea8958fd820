//! Group processing context
//!
//! "Which group of the run am I in", carried into every log line

use crate::models::GroupKey;
use std::fmt::Display;

/// Group processing context
#[derive(Debug, Clone)]
pub struct GroupCtx {
    /// Position in the run (from 1)
    pub group_index: usize,

    /// Groups in the run
    pub group_count: usize,

    /// Building and section
    pub key: GroupKey,
}

impl GroupCtx {
    pub fn new(group_index: usize, group_count: usize, key: GroupKey) -> Self {
        Self {
            group_index,
            group_count,
            key,
        }
    }
}

impl Display for GroupCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[group {}/{} {}]",
            self.group_index, self.group_count, self.key
        )
    }
}
