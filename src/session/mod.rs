pub mod cookie;
pub mod extractors;
pub mod store;

pub use extractors::{SessionId, SessionUser};
pub use store::{PgSessionStore, SessionStore};
