use std::collections::BTreeMap;

use exchange_error::Result;
use relation_transport::status::StatusFlags;
use relation_transport::transport::{Scope, Transport};

use crate::payload::{AuthenticationData, ConfigurationData};
use crate::{envelope, AUTHENTICATION_KEY, CONFIGURATION_KEY, NAME_KEY};

/// Subordinate (plugin) end of the exchange.
///
/// Receives the principal's service-user credentials and answers with
/// config-file fragments for the files the principal owns. Flags are kept
/// per session and recomputed by [`reconcile`](Self::reconcile) after
/// every inbound change notification.
pub struct PluginEndpoint {
    /// Label for logging
    label: String,
    flags: BTreeMap<Scope, StatusFlags>,
}

impl PluginEndpoint {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            flags: BTreeMap::new(),
        }
    }

    /// Handle the peer joining `scope`: mark the session connected, then
    /// reconcile.
    pub fn on_joined(&mut self, transport: &dyn Transport, scope: &Scope) {
        log::debug!("{} (plugin): joined: {}", self.label, scope);
        self.flags.entry(scope.clone()).or_default().connect();
        self.reconcile(transport, scope);
    }

    /// Handle a change notification for `scope`.
    ///
    /// Callable repeatedly; an unacknowledged `changed` stays raised
    /// across repeated notifications.
    pub fn on_changed(&mut self, transport: &dyn Transport, scope: &Scope) {
        log::debug!("{} (plugin): changed: {}", self.label, scope);
        self.reconcile(transport, scope);
    }

    /// Handle the session going away. Broken and departed are handled
    /// identically; all flags are dropped. Idempotent.
    pub fn on_departed(&mut self, scope: &Scope) {
        log::debug!("{} (plugin): departed: {}", self.label, scope);
        self.flags.remove(scope);
    }

    /// Recompute the session flags from what the peer has published.
    ///
    /// Raises `available` and `changed` once credentials have arrived.
    /// Never raises `changed` without `available`.
    pub fn reconcile(&mut self, transport: &dyn Transport, scope: &Scope) {
        if transport.get_remote(scope, AUTHENTICATION_KEY).is_some() {
            log::debug!(
                "{} (plugin): credentials present for: {}",
                self.label,
                scope
            );
            self.flags
                .entry(scope.clone())
                .or_default()
                .note_data_arrived();
        }
    }

    /// Clear `changed` for `scope` once the consumer has processed the
    /// data. `available` stays raised.
    pub fn acknowledge_change(&mut self, scope: &Scope) {
        if let Some(flags) = self.flags.get_mut(scope) {
            flags.acknowledge();
        }
    }

    /// Current flags for `scope`; all false when the session is unknown.
    pub fn flags(&self, scope: &Scope) -> StatusFlags {
        self.flags.get(scope).copied().unwrap_or_default()
    }

    /// Credentials published by the principal, or `Ok(None)` before they
    /// arrive. A payload that does not decode is a protocol error.
    pub fn authentication_data(
        &self,
        transport: &dyn Transport,
        scope: &Scope,
    ) -> Result<Option<AuthenticationData>> {
        match transport.get_remote(scope, AUTHENTICATION_KEY) {
            Some(raw) => Ok(Some(envelope::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Send config-file fragments to the principal.
    ///
    /// Written unconditionally to the local cache and the remote slot; the
    /// payload shape is not validated here.
    pub fn set_configuration_data(
        &self,
        transport: &mut dyn Transport,
        scope: &Scope,
        data: &ConfigurationData,
    ) -> Result<()> {
        let encoded = envelope::encode(data)?;
        transport.set_local(scope, CONFIGURATION_KEY, &encoded)?;
        transport.set_remote(scope, CONFIGURATION_KEY, &encoded)
    }

    /// The last fragments sent for `scope`, read back from the local
    /// cache, or `Ok(None)` if nothing has been sent yet.
    pub fn configuration_data(
        &self,
        transport: &dyn Transport,
        scope: &Scope,
    ) -> Result<Option<ConfigurationData>> {
        match transport.get_local(scope, CONFIGURATION_KEY) {
            Some(raw) => Ok(Some(envelope::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// The plugin name previously recorded with
    /// [`set_name`](Self::set_name), if any.
    pub fn name(
        &self,
        transport: &dyn Transport,
        scope: &Scope,
    ) -> Option<String> {
        transport.get_local(scope, NAME_KEY)
    }

    /// Record the plugin name locally and announce it to the principal.
    /// Distinguishes this plugin in logs when several are attached.
    pub fn set_name(
        &self,
        transport: &mut dyn Transport,
        scope: &Scope,
        name: &str,
    ) -> Result<()> {
        transport.set_local(scope, NAME_KEY, name)?;
        transport.set_remote(scope, NAME_KEY, name)
    }
}
