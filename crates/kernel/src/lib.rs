//! Shared configuration for the libris workspace.

pub mod settings;

pub use settings::Settings;
