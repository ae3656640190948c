//! Queue configuration
//!
//! Every field has a default, so an empty `[queue]` table (or no table at
//! all) yields a usable unbounded queue.

use crate::queue::error::{QueueError, QueueResult};
use serde::Deserialize;

pub const DEFAULT_QUEUE_NAME: &str = "default";
pub const DEFAULT_INITIAL_CAPACITY: usize = 1000;
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Identifier used in log lines and lifecycle events
    pub name: String,
    /// Upper bound on backlog length; `None` means unbounded
    pub max_backlog: Option<usize>,
    /// Backlog slots allocated up front
    pub initial_capacity: usize,
    /// Buffer size of the lifecycle event channel
    pub event_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
            max_backlog: None,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl QueueConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_max_backlog(mut self, max_backlog: usize) -> Self {
        self.max_backlog = Some(max_backlog);
        self
    }

    /// Parse a bare queue table, e.g. the contents of a `[queue]` section
    pub fn from_toml_str(contents: &str) -> QueueResult<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| QueueError::Configuration {
            message: format!("failed to parse queue configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> QueueResult<()> {
        if self.name.trim().is_empty() {
            return Err(QueueError::Configuration {
                message: "queue name must not be empty".to_string(),
            });
        }
        if self.max_backlog == Some(0) {
            return Err(QueueError::Configuration {
                message: "max_backlog must be greater than zero when set".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(QueueError::Configuration {
                message: "event_capacity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
