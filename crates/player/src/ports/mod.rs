//! Player port definitions.
//!
//! Ports are the seams between the realtime core and its collaborators
//! (toast display, session lifecycle control). Infrastructure implements them;
//! tests replace them with mockall mocks.

pub mod outbound;
