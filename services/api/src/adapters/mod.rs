pub mod db;
pub mod files;
pub mod paystack;

pub use db::DbAdapter;
pub use files::DiskFileStore;
pub use paystack::PaystackAdapter;
