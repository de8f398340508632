pub mod toml_loader;

pub use toml_loader::{load_all_bank_files, load_bank_file};
