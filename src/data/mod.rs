mod loader;

pub use loader::{load_bank_from_json, save_bank_to_json, LoadError};
