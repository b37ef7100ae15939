//! Connection Control Port - lifecycle commands driven by the auth state
//!
//! The credential observer only needs to open and close the realtime session;
//! this narrow port lets it do so without knowing the concrete client.

use crate::infrastructure::auth::Credential;

/// Port for starting and stopping the realtime session.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ConnectionControl: Send + Sync {
    /// Open (or re-open) the session for `credential`, superseding any previous one.
    fn connect(&self, credential: &Credential);

    /// Close the session and cancel any pending reconnect.
    fn disconnect(&self);
}
