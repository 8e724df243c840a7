//! `SeaORM` entity definitions.

pub mod authorized_users;
pub mod categories;
pub mod ledgers;
pub mod profiles;
pub mod transactions;
pub mod user_settings;
