//! Engine configuration.

use std::fmt;
use std::sync::Arc;

use crate::checker::CommandChecker;
use crate::command::CommandContext;
use crate::jobs::Job;
use crate::scheduler::{HandlerRegistry, JobExecutorConfig, JobHandler};

/// Engine configuration.
#[derive(Clone)]
pub struct EngineConfig {
    /// Checkers consulted by every command, in registration order
    pub checkers: Vec<Arc<dyn CommandChecker>>,
    /// Whole-command attempts before a concurrency conflict is surfaced
    pub command_attempts: u32,
    /// Retry budget stamped on jobs created without an explicit one
    pub default_retries: u32,
    /// Handlers available to the job executor
    pub handlers: HandlerRegistry,
    /// Worker pool settings
    pub job_executor: JobExecutorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checkers: Vec::new(),
            command_attempts: 3,
            default_retries: Job::DEFAULT_RETRIES,
            handlers: HandlerRegistry::new(),
            job_executor: JobExecutorConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_checker(mut self, checker: Arc<dyn CommandChecker>) -> Self {
        self.checkers.push(checker);
        self
    }

    pub fn with_command_attempts(mut self, attempts: u32) -> Self {
        self.command_attempts = attempts;
        self
    }

    pub fn with_default_retries(mut self, retries: u32) -> Self {
        self.default_retries = retries;
        self
    }

    pub fn with_handler(mut self, handler_type: impl Into<String>, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.register(handler_type, handler);
        self
    }

    pub fn with_handler_fn<F>(mut self, handler_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Job, &mut CommandContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.register_fn(handler_type, handler);
        self
    }

    pub fn with_job_executor(mut self, config: JobExecutorConfig) -> Self {
        self.job_executor = config;
        self
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("checkers", &self.checkers.len())
            .field("command_attempts", &self.command_attempts)
            .field("default_retries", &self.default_retries)
            .field("handlers", &self.handlers)
            .field("job_executor", &self.job_executor)
            .finish()
    }
}
