use exchange_error::Result;

/// Identity of one session with a remote peer. Local and remote key-value
/// slots are stored under this key.
pub type Scope = String;

/// One side's view of the relation transport connecting the two endpoints.
///
/// The transport replicates values written with [`set_remote`] to the
/// counterpart side, where they become visible through its [`get_remote`].
/// Local values are a private cache and never leave this side.
///
/// [`set_remote`]: Transport::set_remote
/// [`get_remote`]: Transport::get_remote
pub trait Transport {
    /// Scopes of the sessions currently established with remote peers.
    ///
    /// An empty list is a valid transient state before any peer joins,
    /// not an error.
    fn scopes(&self) -> Vec<Scope>;

    /// Store a value in the private cache for `scope`.
    fn set_local(&mut self, scope: &Scope, key: &str, value: &str)
        -> Result<()>;

    /// Read a value from the private cache for `scope`.
    ///
    /// Returns `None` if the key has not been written or the session does
    /// not exist.
    fn get_local(&self, scope: &Scope, key: &str) -> Option<String>;

    /// Publish a value to the remote peer of `scope`.
    fn set_remote(&mut self, scope: &Scope, key: &str, value: &str)
        -> Result<()>;

    /// Read a value published by the remote peer of `scope`.
    ///
    /// Returns `None` until the peer publishes the key.
    fn get_remote(&self, scope: &Scope, key: &str) -> Option<String>;
}
