//! Database access for master data and leads

pub mod leads;
pub mod master;

pub use leads::{count_records, find_existing_phone_keys, insert_record, load_records};
pub use master::{find_master, insert_master_if_absent, list_masters};
