//! Room registry for Quizwire.
//!
//! The registry is the front door: it allocates short human-typeable codes
//! for new sessions, looks live sessions up by code, and sweeps away rooms
//! nobody has touched in a while. It owns no game state of its own;
//! everything lives in the [`SessionStore`](quizwire_store::SessionStore),
//! and code uniqueness rides on the store's atomic insert.

mod error;
mod registry;

pub use error::RegistryError;
pub use registry::{RegistryConfig, RoomRegistry};
