mod auth;
mod file;
mod refresh;
mod sqlite;
pub(crate) mod store;
mod validator;

pub use auth::TokenManager;
pub use file::FileTokenStore;
pub use refresh::{RefreshExecutor, expires_at};
pub use sqlite::SqliteTokenStore;
pub use store::{MemoryTokenStore, TokenStore, open_store};
pub use validator::{Clock, GRACE_WINDOW, ManualClock, SystemClock, TokenValidator};
