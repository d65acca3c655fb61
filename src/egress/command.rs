//! The egress capability and its command-line implementation

use crate::config::EgressConfig;
use crate::egress::{EgressError, ProcessOutput, ProcessRunner};
use crate::identity::Identity;
use async_trait::async_trait;

/// Placeholder in connect arguments replaced by the identity name
const IDENTITY_PLACEHOLDER: &str = "{identity}";

/// Something that can switch the machine's egress path
///
/// Implementations report what the underlying mechanism said; deciding
/// whether that counts as success, and bounding how long it may take, is the
/// controller's job.
#[async_trait]
pub trait EgressCommand: Send + Sync {
    /// Drops the current egress path
    async fn disconnect(&self) -> Result<ProcessOutput, EgressError>;

    /// Switches the egress path to `identity`
    async fn connect(&self, identity: &Identity) -> Result<ProcessOutput, EgressError>;
}

/// Drives a VPN client through its command-line interface
#[derive(Debug, Clone)]
pub struct CliEgress {
    runner: ProcessRunner,
    program: String,
    connect_args: Vec<String>,
    disconnect_args: Vec<String>,
}

impl CliEgress {
    pub fn new(
        program: impl Into<String>,
        connect_args: Vec<String>,
        disconnect_args: Vec<String>,
    ) -> Self {
        Self {
            runner: ProcessRunner::new(),
            program: program.into(),
            connect_args,
            disconnect_args,
        }
    }

    pub fn from_config(config: &EgressConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.connect_args.clone(),
            config.disconnect_args.clone(),
        )
    }

    /// Connect arguments with the placeholder filled in
    pub fn connect_args_for(&self, identity: &Identity) -> Vec<String> {
        self.connect_args
            .iter()
            .map(|arg| arg.replace(IDENTITY_PLACEHOLDER, identity.name()))
            .collect()
    }
}

#[async_trait]
impl EgressCommand for CliEgress {
    async fn disconnect(&self) -> Result<ProcessOutput, EgressError> {
        self.runner.run(&self.program, &self.disconnect_args).await
    }

    async fn connect(&self, identity: &Identity) -> Result<ProcessOutput, EgressError> {
        let args = self.connect_args_for(identity);
        self.runner.run(&self.program, &args).await
    }
}
