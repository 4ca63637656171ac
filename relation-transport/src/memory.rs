use std::collections::BTreeMap;

use exchange_error::{ExchangeError, Result};

use crate::transport::{Scope, Transport};

/// Which half of the relation a view operates as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Provider,
    Requirer,
}

#[derive(Debug, Default)]
struct Slots {
    /// Private cache, never visible to the peer.
    local: BTreeMap<String, String>,
    /// Values published to the peer.
    published: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct SessionSlots {
    provider: Slots,
    requirer: Slots,
}

/// In-memory relation hub connecting the two endpoint sides.
///
/// Deployment transports live outside this workspace; the hub stands in
/// for them in tests and single-process embeddings. A `set_remote` on one
/// side's view lands in the slot the other side's `get_remote` reads,
/// which is the replication contract the endpoints rely on.
pub struct MemRelation {
    /// Label for logging
    label: String,
    sessions: BTreeMap<Scope, SessionSlots>,
    remote_writes: usize,
}

impl MemRelation {
    /// Create an empty hub with a diagnostic label.
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            sessions: BTreeMap::new(),
            remote_writes: 0,
        }
    }

    /// Establish a session for `scope`. Joining an existing scope keeps
    /// its slots.
    pub fn join(&mut self, scope: &str) {
        log::debug!("{}: session joined: {}", self.label, scope);
        self.sessions.entry(scope.to_owned()).or_default();
    }

    /// Tear down the session for `scope`, dropping both sides' slots.
    /// Idempotent.
    pub fn depart(&mut self, scope: &Scope) {
        log::debug!("{}: session departed: {}", self.label, scope);
        self.sessions.remove(scope);
    }

    /// Number of `set_remote` calls observed since creation, across both
    /// sides. The replication traffic a deployment transport would carry.
    pub fn remote_write_count(&self) -> usize {
        self.remote_writes
    }

    /// View of the hub as the provider-side transport.
    pub fn provider(&mut self) -> SideView<'_> {
        SideView {
            relation: self,
            end: End::Provider,
        }
    }

    /// View of the hub as the requirer-side transport.
    pub fn requirer(&mut self) -> SideView<'_> {
        SideView {
            relation: self,
            end: End::Requirer,
        }
    }
}

/// Short-lived [`Transport`] view of one end of a [`MemRelation`].
pub struct SideView<'a> {
    relation: &'a mut MemRelation,
    end: End,
}

impl SideView<'_> {
    fn own_slots<'s>(&self, session: &'s SessionSlots) -> &'s Slots {
        match self.end {
            End::Provider => &session.provider,
            End::Requirer => &session.requirer,
        }
    }

    fn peer_slots<'s>(&self, session: &'s SessionSlots) -> &'s Slots {
        match self.end {
            End::Provider => &session.requirer,
            End::Requirer => &session.provider,
        }
    }

    fn session_mut(&mut self, scope: &Scope) -> Result<&mut SessionSlots> {
        match self.relation.sessions.get_mut(scope) {
            Some(session) => Ok(session),
            None => Err(ExchangeError::Session(
                self.relation.label.clone(),
                format!("no session for scope: {}", scope),
            )),
        }
    }
}

impl Transport for SideView<'_> {
    fn scopes(&self) -> Vec<Scope> {
        self.relation.sessions.keys().cloned().collect()
    }

    fn set_local(
        &mut self,
        scope: &Scope,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let end = self.end;
        let session = self.session_mut(scope)?;
        let slots = match end {
            End::Provider => &mut session.provider,
            End::Requirer => &mut session.requirer,
        };
        slots.local.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn get_local(&self, scope: &Scope, key: &str) -> Option<String> {
        let session = self.relation.sessions.get(scope)?;
        self.own_slots(session).local.get(key).cloned()
    }

    fn set_remote(
        &mut self,
        scope: &Scope,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let end = self.end;
        let session = self.session_mut(scope)?;
        let slots = match end {
            End::Provider => &mut session.provider,
            End::Requirer => &mut session.requirer,
        };
        slots.published.insert(key.to_owned(), value.to_owned());
        self.relation.remote_writes += 1;
        log::debug!(
            "{}: published {} for scope {}",
            self.relation.label,
            key,
            scope
        );
        Ok(())
    }

    fn get_remote(&self, scope: &Scope, key: &str) -> Option<String> {
        let session = self.relation.sessions.get(scope)?;
        self.peer_slots(session).published.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::MemRelation;
    use crate::transport::Transport;

    #[test_log::test]
    fn published_values_reach_the_peer() {
        let mut relation = MemRelation::new("test");
        relation.join("s0");
        let scope = "s0".to_owned();

        relation
            .provider()
            .set_remote(&scope, "greeting", "hello")
            .expect("Failed to publish value");

        assert_eq!(
            relation.requirer().get_remote(&scope, "greeting"),
            Some("hello".to_owned())
        );
        // The writer does not see its own value as remote data.
        assert_eq!(relation.provider().get_remote(&scope, "greeting"), None);
    }

    #[test]
    fn local_values_stay_private() {
        let mut relation = MemRelation::new("test");
        relation.join("s0");
        let scope = "s0".to_owned();

        relation
            .provider()
            .set_local(&scope, "secret", "value")
            .expect("Failed to store local value");

        assert_eq!(
            relation.provider().get_local(&scope, "secret"),
            Some("value".to_owned())
        );
        assert_eq!(relation.requirer().get_local(&scope, "secret"), None);
        assert_eq!(relation.requirer().get_remote(&scope, "secret"), None);
    }

    #[test]
    fn missing_session_reads_are_absent_writes_fail() {
        let mut relation = MemRelation::new("test");
        let scope = "ghost".to_owned();

        assert_eq!(relation.provider().get_local(&scope, "k"), None);
        assert_eq!(relation.provider().get_remote(&scope, "k"), None);
        assert!(relation
            .provider()
            .set_local(&scope, "k", "v")
            .is_err());
        assert!(relation
            .provider()
            .set_remote(&scope, "k", "v")
            .is_err());
    }

    #[test]
    fn depart_is_idempotent_and_drops_slots() {
        let mut relation = MemRelation::new("test");
        relation.join("s0");
        let scope = "s0".to_owned();
        relation
            .provider()
            .set_remote(&scope, "k", "v")
            .expect("Failed to publish value");

        relation.depart(&scope);
        relation.depart(&scope);

        assert!(relation.provider().scopes().is_empty());
        assert_eq!(relation.requirer().get_remote(&scope, "k"), None);
    }

    #[test]
    fn rejoin_after_depart_starts_clean() {
        let mut relation = MemRelation::new("test");
        relation.join("s0");
        let scope = "s0".to_owned();
        relation
            .provider()
            .set_remote(&scope, "k", "v")
            .expect("Failed to publish value");

        relation.depart(&scope);
        relation.join("s0");

        assert_eq!(relation.requirer().get_remote(&scope, "k"), None);
    }

    #[test]
    fn remote_write_count_tracks_publishes() {
        let mut relation = MemRelation::new("test");
        relation.join("s0");
        let scope = "s0".to_owned();

        assert_eq!(relation.remote_write_count(), 0);
        relation
            .provider()
            .set_remote(&scope, "k", "v1")
            .expect("Failed to publish value");
        relation
            .requirer()
            .set_remote(&scope, "k", "v2")
            .expect("Failed to publish value");
        relation
            .provider()
            .set_local(&scope, "k", "v3")
            .expect("Failed to store local value");

        assert_eq!(relation.remote_write_count(), 2);
    }
}
