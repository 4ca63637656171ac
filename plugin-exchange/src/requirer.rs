use std::collections::BTreeMap;

use exchange_error::Result;
use relation_transport::status::StatusFlags;
use relation_transport::transport::{Scope, Transport};

use crate::payload::{AuthenticationData, ConfigurationData};
use crate::{envelope, AUTHENTICATION_KEY, CONFIGURATION_KEY, NAME_KEY};

/// Principal end of the exchange.
///
/// Sends the service-user credentials to the attached plugins and collects
/// the config-file fragments they answer with. A session's data is ready
/// for consumption once the peer has supplied both its name and its
/// configuration fragments.
pub struct PrincipalEndpoint {
    /// Label for logging
    label: String,
    flags: BTreeMap<Scope, StatusFlags>,
}

impl PrincipalEndpoint {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            flags: BTreeMap::new(),
        }
    }

    /// Handle the peer joining `scope`: mark the session connected, then
    /// reconcile.
    pub fn on_joined(&mut self, transport: &dyn Transport, scope: &Scope) {
        log::debug!("{} (principal): joined: {}", self.label, scope);
        self.flags.entry(scope.clone()).or_default().connect();
        self.reconcile(transport, scope);
    }

    /// Handle a change notification for `scope`.
    ///
    /// Callable repeatedly; an unacknowledged `changed` stays raised
    /// across repeated notifications.
    pub fn on_changed(&mut self, transport: &dyn Transport, scope: &Scope) {
        log::debug!("{} (principal): changed: {}", self.label, scope);
        self.reconcile(transport, scope);
    }

    /// Handle the session going away. Broken and departed are handled
    /// identically; all flags are dropped. Idempotent.
    pub fn on_departed(&mut self, scope: &Scope) {
        log::debug!("{} (principal): departed: {}", self.label, scope);
        self.flags.remove(scope);
    }

    /// Recompute the session flags from what the peer has published.
    ///
    /// Raises `available` and `changed` once both the plugin name and its
    /// configuration fragments are present. Never raises `changed`
    /// without `available`.
    pub fn reconcile(&mut self, transport: &dyn Transport, scope: &Scope) {
        let name = transport.get_remote(scope, NAME_KEY);
        let config = transport.get_remote(scope, CONFIGURATION_KEY);
        if name.is_some() && config.is_some() {
            log::debug!(
                "{} (principal): have name and configuration for: {}",
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

    /// The peer-supplied plugin name, if it has been announced.
    pub fn name(
        &self,
        transport: &dyn Transport,
        scope: &Scope,
    ) -> Option<String> {
        transport.get_remote(scope, NAME_KEY)
    }

    /// Config-file fragments published by the plugin, or `Ok(None)` until
    /// they are sent. A payload that does not decode is a protocol error.
    pub fn configuration_data(
        &self,
        transport: &dyn Transport,
        scope: &Scope,
    ) -> Result<Option<ConfigurationData>> {
        match transport.get_remote(scope, CONFIGURATION_KEY) {
            Some(raw) => Ok(Some(envelope::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// The credentials last sent for `scope`, read back from the local
    /// cache, or `Ok(None)` if nothing has been sent yet.
    pub fn authentication_data(
        &self,
        transport: &dyn Transport,
        scope: &Scope,
    ) -> Result<Option<AuthenticationData>> {
        match transport.get_local(scope, AUTHENTICATION_KEY) {
            Some(raw) => Ok(Some(envelope::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Send the service-user credentials to every attached plugin.
    ///
    /// A session that already holds an identical payload is skipped
    /// entirely, so repeated calls with unchanged data produce zero
    /// transport writes. A key set diverging from the expected record
    /// shape is reported to the log but still sent. A failure on one
    /// session does not stop processing of the others.
    pub fn set_authentication_data(
        &self,
        transport: &mut dyn Transport,
        value: &AuthenticationData,
    ) -> Result<()> {
        let (missing, unexpected) = value.key_divergence();
        if !missing.is_empty() || !unexpected.is_empty() {
            log::warn!(
                "{} (principal): credentials have missing keys {:?} \
                 or unexpected keys {:?}; sending anyway",
                self.label,
                missing,
                unexpected
            );
        }
        let encoded = envelope::encode(value)?;
        for scope in transport.scopes() {
            if self.already_sent(transport, &scope, value) {
                log::debug!(
                    "{} (principal): credentials unchanged for: {}",
                    self.label,
                    scope
                );
                continue;
            }
            let written = transport
                .set_local(&scope, AUTHENTICATION_KEY, &encoded)
                .and_then(|()| {
                    transport.set_remote(&scope, AUTHENTICATION_KEY, &encoded)
                });
            if let Err(err) = written {
                log::warn!(
                    "{} (principal): failed to send credentials to {}: {}",
                    self.label,
                    scope,
                    err
                );
            }
        }
        Ok(())
    }

    /// Whether `scope` already holds exactly `value`.
    ///
    /// A cached payload that no longer decodes counts as different, so
    /// the next write replaces it with a well-formed one.
    fn already_sent(
        &self,
        transport: &dyn Transport,
        scope: &Scope,
        value: &AuthenticationData,
    ) -> bool {
        let raw = match transport.get_local(scope, AUTHENTICATION_KEY) {
            Some(raw) => raw,
            None => return false,
        };
        match envelope::decode::<AuthenticationData>(&raw) {
            Ok(previous) => previous == *value,
            Err(err) => {
                log::warn!(
                    "{} (principal): cached credentials for {} are \
                     unreadable ({}); resending",
                    self.label,
                    scope,
                    err
                );
                false
            }
        }
    }
}
