pub mod auth;
pub mod caro;
pub mod messaging;
pub mod realtime;
pub mod websocket;

// Re-export the types most callers need
pub use auth::{AuthWatcher, Credential, CredentialStore};
pub use messaging::{ConnectionState, SubscriptionRegistry};
pub use realtime::RealtimeClient;
