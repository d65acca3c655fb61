//! Egress controller - establishes, rotates and releases identities
//!
//! The controller is the single owner of `RotationState`. A rotation is
//! all-or-nothing: the state is only changed, and persisted, after the new
//! identity has been established.

use crate::config::EgressConfig;
use crate::egress::{
    EgressCommand, EgressError, EgressState, ProcessOutput, RotationCause, RotationEvent,
};
use crate::identity::{Identity, IdentityPool};
use crate::state::{RotationState, RotationStateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

/// Retry, timeout and success-detection settings for the controller
#[derive(Debug, Clone)]
pub struct EgressSettings {
    /// Connect attempts per identity
    pub max_attempts: u32,
    /// Upper bound for one connect command
    pub connect_timeout: Duration,
    /// Upper bound for one disconnect command
    pub disconnect_timeout: Duration,
    /// Pause between failed attempts
    pub retry_backoff: Duration,
    /// Pause after disconnecting, before connecting
    pub disconnect_settle: Duration,
    /// Pause after a successful connect
    pub stabilization: Duration,
    /// Output word meaning "connected"
    pub connect_marker: String,
    /// Output word meaning "disconnected"
    pub disconnect_marker: String,
}

impl EgressSettings {
    pub fn from_config(config: &EgressConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            connect_timeout: Duration::from_secs(config.connect_timeout),
            disconnect_timeout: Duration::from_secs(config.disconnect_timeout),
            retry_backoff: Duration::from_millis(config.retry_backoff),
            disconnect_settle: Duration::from_millis(config.disconnect_settle),
            stabilization: Duration::from_millis(config.stabilization),
            connect_marker: config.connect_marker.clone(),
            disconnect_marker: config.disconnect_marker.clone(),
        }
    }

    /// Default settings with every pause removed and short timeouts
    pub fn immediate() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            disconnect_timeout: Duration::from_secs(5),
            retry_backoff: Duration::ZERO,
            disconnect_settle: Duration::ZERO,
            stabilization: Duration::ZERO,
            ..Self::from_config(&EgressConfig::default())
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// A connect succeeded if it exited cleanly or said so
    fn connected(&self, output: &ProcessOutput) -> bool {
        output.success() || reports(&output.stdout, &self.connect_marker)
    }

    fn disconnected(&self, output: &ProcessOutput) -> bool {
        output.success() || reports(&output.stdout, &self.disconnect_marker)
    }
}

/// Case-insensitive whole-word search, so "disconnected" never reads as "connected"
fn reports(output: &str, marker: &str) -> bool {
    let haystack = output.to_lowercase();
    let needle = marker.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }

    haystack.match_indices(&needle).any(|(start, found)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + found.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// State machine over the egress path
pub struct EgressController {
    command: Box<dyn EgressCommand>,
    pool: Arc<IdentityPool>,
    store: RotationStateStore,
    rotation: RotationState,
    status: EgressState,
    settings: EgressSettings,
    persistence_failures: u32,
}

impl EgressController {
    /// Creates a controller, loading the last persisted rotation state
    pub fn new(
        command: Box<dyn EgressCommand>,
        store: RotationStateStore,
        settings: EgressSettings,
    ) -> Self {
        let rotation = store.load();
        Self {
            command,
            pool: store.pool().clone(),
            store,
            rotation,
            status: EgressState::Disconnected,
            settings,
            persistence_failures: 0,
        }
    }

    pub fn status(&self) -> EgressState {
        self.status
    }

    pub fn pool(&self) -> &IdentityPool {
        &self.pool
    }

    /// Read-only view of the rotation state
    pub fn rotation_state(&self) -> &RotationState {
        &self.rotation
    }

    /// The identity the rotation state points at
    pub fn current_identity(&self) -> Option<&Identity> {
        self.pool.identity_at(self.rotation.current_index).ok()
    }

    /// Number of state saves that failed during this controller's lifetime
    pub fn persistence_failures(&self) -> u32 {
        self.persistence_failures
    }

    /// Switches the egress path to `identity`, retrying up to the attempt limit
    ///
    /// Each attempt disconnects first (a failed disconnect is expected when
    /// nothing is connected), then connects. Rotation state is not touched.
    pub async fn establish(&mut self, identity: &Identity) -> Result<(), EgressError> {
        let attempts = self.settings.max_attempts.max(1);
        let mut last_error = String::new();
        self.status = EgressState::Connecting;

        for attempt in 1..=attempts {
            info!(
                "Connecting to {} (attempt {}/{})",
                identity, attempt, attempts
            );
            self.disconnect_quietly().await;

            match timeout(self.settings.connect_timeout, self.command.connect(identity)).await {
                Ok(Ok(output)) if self.settings.connected(&output) => {
                    self.status = EgressState::Connected;
                    info!("Connected to {}", identity);
                    sleep(self.settings.stabilization).await;
                    return Ok(());
                }
                Ok(Ok(output)) => {
                    last_error = output.describe_failure();
                    warn!("Connect to {} failed: {}", identity, last_error);
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                    warn!("Connect to {} failed: {}", identity, last_error);
                }
                Err(_) => {
                    last_error = EgressError::Timeout(self.settings.connect_timeout).to_string();
                    warn!("Connect to {} timed out", identity);
                }
            }

            if attempt < attempts {
                sleep(self.settings.retry_backoff).await;
            }
        }

        self.status = EgressState::Failed;
        error!("All {} attempts to connect to {} failed", attempts, identity);
        Err(EgressError::Exhausted {
            identity: identity.name().to_string(),
            attempts,
            last_error,
        })
    }

    /// Establishes the identity the loaded state points at and records it as used
    pub async fn connect_initial(&mut self) -> Result<RotationEvent, EgressError> {
        let index = self.rotation.current_index;
        let identity = self.pool.identity_at(index)?.clone();
        info!(
            "Starting on identity #{} {} ({}/{} used this cycle)",
            index,
            identity,
            self.rotation.used.len(),
            self.pool.size()
        );

        self.establish(&identity).await?;

        let mut next = self.rotation.clone();
        next.mark_used(identity.name());
        next.touch();
        self.commit(next);

        Ok(RotationEvent {
            cause: RotationCause::Initial,
            previous: None,
            current: identity,
            index,
        })
    }

    /// Moves to the next identity not yet used in this cycle
    ///
    /// When every identity has been used, the cycle restarts at the first one.
    /// If the new identity cannot be established, the state is left exactly as
    /// it was and the error is returned.
    pub async fn rotate(&mut self, cause: RotationCause) -> Result<RotationEvent, EgressError> {
        let previous = self.current_identity().cloned();
        let selection = self
            .pool
            .next_unused(self.rotation.current_index + 1, &self.rotation.used)?;

        if selection.new_cycle {
            info!(
                "All {} identities used in this cycle, starting a new one",
                self.pool.size()
            );
        }
        info!(
            "Rotating ({}) to identity #{} {}",
            cause, selection.index, selection.identity
        );

        self.establish(&selection.identity).await?;

        let mut next = self.rotation.clone();
        if selection.new_cycle {
            next.reset_cycle();
        }
        next.mark_used(selection.identity.name());
        next.current_index = selection.index;
        next.touch();
        self.commit(next);

        Ok(RotationEvent {
            cause,
            previous,
            current: selection.identity,
            index: selection.index,
        })
    }

    /// Best-effort disconnect at the end of a run
    pub async fn release(&mut self) {
        info!("Releasing egress identity");
        match timeout(self.settings.disconnect_timeout, self.command.disconnect()).await {
            Ok(Ok(output)) if self.settings.disconnected(&output) => info!("Disconnected"),
            Ok(Ok(output)) => warn!("Disconnect reported {}", output.describe_failure()),
            Ok(Err(e)) => warn!("Disconnect failed: {}", e),
            Err(_) => warn!("Disconnect timed out (may already be disconnected)"),
        }
        self.status = EgressState::Disconnected;
    }

    async fn disconnect_quietly(&self) {
        match timeout(self.settings.disconnect_timeout, self.command.disconnect()).await {
            Ok(Ok(output)) => debug!(
                "Disconnect finished (reported disconnected: {})",
                self.settings.disconnected(&output)
            ),
            Ok(Err(e)) => debug!("Disconnect failed, continuing: {}", e),
            Err(_) => debug!("Disconnect timed out, continuing"),
        }
        sleep(self.settings.disconnect_settle).await;
    }

    /// Swaps in `next` and persists it; a failed save is logged, not fatal
    fn commit(&mut self, next: RotationState) {
        self.rotation = next;
        if let Err(e) = self.store.save(&self.rotation) {
            self.persistence_failures += 1;
            error!(
                "Failed to save rotation state, continuing with in-memory state: {}",
                e
            );
        }
    }
}
