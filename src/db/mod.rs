pub mod sessions;

pub use sessions::{SessionId, SessionStore, StoredSession};
