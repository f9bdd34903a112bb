// src/core/storage/mod.rs

pub mod store;

pub use store::{Entries, Store, normalize_key, render_value};
