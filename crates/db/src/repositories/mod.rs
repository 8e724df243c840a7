//! Repository implementations over `SeaORM`.

mod record;
mod user_data;

pub use record::RecordRepository;
pub use user_data::{PurgeSummary, UserDataRepository};
