pub mod admin_key;
pub mod request_id;
pub mod session;

pub use admin_key::AdminKeyGuard;
pub use request_id::{RequestId, RequestIdMiddleware};
pub use session::{AuthedAccount, OptionalAccount, SessionAccount, SessionAuth, SessionManager};
