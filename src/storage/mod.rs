pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use backend::retry::RetryConfig;
pub use models::{AccessRecord, Account, AccountType, LinkPatch, NewLink, ShortLink};
