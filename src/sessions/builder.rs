use std::sync::Arc;

use crate::error::{SessionError, SessionResult};
use crate::panels::PanelPolicy;
use crate::sessions::config::SessionConfig;
use crate::sessions::controller::SessionController;
use crate::sessions::inbound::InboundQueue;
use crate::telemetry::ViolationObserver;
use crate::Config;

/// The host objects a session calls into, one per [`Config`] associated type.
pub struct Collaborators<T: Config> {
    /// Outbound transport.
    pub sink: T::Sink,
    /// Legality checks.
    pub rules: T::Rules,
    /// Blocking decision dialogs.
    pub prompter: T::Prompter,
    /// Builds phase handlers.
    pub factory: T::Factory,
    /// Auxiliary panel visibility.
    pub panels: T::Panels,
    /// Window shell.
    pub shell: T::Shell,
}

/// The [`SessionBuilder`] builds a [`SessionController`].
///
/// After setting all appropriate values, use [`SessionBuilder::start_session`] to
/// consume the builder.
///
/// ```ignore
/// let session = SessionBuilder::<MyClient>::new()
///     .with_config(SessionConfig::bot())
///     .with_panel_policy(PanelPolicy::from_json(&stored)?)
///     .with_violation_observer(observer.clone())
///     .start_session(collaborators)?;
/// ```
#[must_use = "SessionBuilder must be consumed by calling start_session"]
pub struct SessionBuilder<T>
where
    T: Config,
{
    config: SessionConfig,
    policy: PanelPolicy,
    inbound: Option<InboundQueue>,
    violation_observer: Option<Arc<dyn ViolationObserver>>,
    _config: std::marker::PhantomData<T>,
}

impl<T: Config> std::fmt::Debug for SessionBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            config,
            policy,
            inbound,
            violation_observer,
            _config,
        } = self;

        f.debug_struct("SessionBuilder")
            .field("config", config)
            .field("policy", policy)
            .field("has_inbound_queue", &inbound.is_some())
            .field("has_violation_observer", &violation_observer.is_some())
            .finish()
    }
}

impl<T: Config> Default for SessionBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Config> SessionBuilder<T> {
    /// Construct a new builder with all values set to their defaults.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            policy: PanelPolicy::default(),
            inbound: None,
            violation_observer: None,
            _config: std::marker::PhantomData,
        }
    }

    /// Replaces the whole configuration. It is validated in
    /// [`start_session`](Self::start_session).
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the window title base.
    ///
    /// # Errors
    /// - Returns [`InvalidConfiguration`] if the title is blank.
    ///
    /// [`InvalidConfiguration`]: SessionError::InvalidConfiguration
    pub fn with_title_base(mut self, title: impl Into<String>) -> SessionResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration {
                info: "title_base must not be blank".to_owned(),
            });
        }
        self.config.title_base = title;
        Ok(self)
    }

    /// Marks this client as an automated player.
    pub fn with_automated_client(mut self, automated: bool) -> Self {
        self.config.automated_client = automated;
        self
    }

    /// Sets the inbound backlog warning threshold.
    ///
    /// # Errors
    /// - Returns [`InvalidConfiguration`] if `capacity` is zero or too large.
    ///
    /// [`InvalidConfiguration`]: SessionError::InvalidConfiguration
    pub fn with_inbound_queue_capacity(mut self, capacity: usize) -> SessionResult<Self> {
        if capacity == 0 || capacity > SessionConfig::MAX_INBOUND_QUEUE_CAPACITY {
            return Err(SessionError::InvalidConfiguration {
                info: format!(
                    "inbound_queue_capacity must be in 1..={}, got {}",
                    SessionConfig::MAX_INBOUND_QUEUE_CAPACITY,
                    capacity
                ),
            });
        }
        self.config.inbound_queue_capacity = capacity;
        Ok(self)
    }

    /// Sets the panel policy, usually one restored with [`PanelPolicy::from_json`].
    pub fn with_panel_policy(mut self, policy: PanelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Uses an existing queue, e.g. one the transport was already given.
    pub fn with_inbound_queue(mut self, queue: InboundQueue) -> Self {
        self.inbound = Some(queue);
        self
    }

    /// Sets a custom observer for protocol violations.
    ///
    /// If no observer is set, violations are logged via the `tracing` crate.
    ///
    /// ```ignore
    /// let observer = Arc::new(CollectingObserver::new());
    /// let builder = SessionBuilder::<MyClient>::new()
    ///     .with_violation_observer(observer.clone());
    /// ```
    pub fn with_violation_observer(mut self, observer: Arc<dyn ViolationObserver>) -> Self {
        self.violation_observer = Some(observer);
        self
    }

    /// Consumes the builder to construct a [`SessionController`].
    ///
    /// The session starts in [`Phase::Unknown`](crate::Phase::Unknown) with no handler
    /// until the server announces the first phase.
    ///
    /// # Errors
    /// - Returns [`InvalidConfiguration`] if the configuration does not validate.
    ///
    /// [`InvalidConfiguration`]: SessionError::InvalidConfiguration
    pub fn start_session(
        self,
        collaborators: Collaborators<T>,
    ) -> SessionResult<SessionController<T>> {
        self.config.validate()?;
        Ok(SessionController::new(
            self.config,
            self.policy,
            self.inbound.unwrap_or_default(),
            self.violation_observer,
            collaborators,
        ))
    }
}
