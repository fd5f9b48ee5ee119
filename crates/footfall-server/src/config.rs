/// Re-export `Config` from `footfall-core` for use within this crate.
///
/// Environment parsing lives in `footfall-core` so integration tests can
/// build a `Config` without depending on the server binary.
pub use footfall_core::config::Config;
