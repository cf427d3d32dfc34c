pub mod postgres;
pub mod store;

pub use postgres::PgRecordStore;
pub use store::{RecordStore, StoreError};
