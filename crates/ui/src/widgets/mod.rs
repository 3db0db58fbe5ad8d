pub mod library;
pub mod trimbar;
