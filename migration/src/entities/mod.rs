pub mod access_record;
pub mod account;
pub mod short_link;

pub use access_record::Entity as AccessRecordEntity;
pub use account::Entity as AccountEntity;
pub use short_link::Entity as ShortLinkEntity;
