//! Media control-plane integrations
//!
//! Session registry, agent dispatch and access-token issuance all talk to
//! the external real-time media control plane. Each is a small async port
//! with an in-memory implementation used by tests and the default wiring.

pub mod dispatch;
pub mod session_registry;
pub mod token;

pub use dispatch::{AgentDispatchClient, InMemoryDispatchClient};
pub use session_registry::{InMemorySessionRegistry, SessionRegistry};
pub use token::{AccessTokenIssuer, MediaCapabilities, TokenClaims};
