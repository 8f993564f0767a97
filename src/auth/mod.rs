//! Authentication for the Feenox API.
//!
//! Flow:
//! 1. Reuse the in-memory session, or load it from the on-disk cache
//! 2. Otherwise exchange client credentials with the identity endpoint
//! 3. Persist the new session to the cache for the next process
//! 4. Before every API call, refresh when less than 60 seconds remain

pub mod cache;
pub mod identity;
pub mod session;

pub use cache::{FileSessionCache, SessionCache};
pub use identity::{HttpIdentityProvider, IdentityProvider, TokenResponse};
pub use session::{Session, SessionManager, REFRESH_MARGIN_SECS};
