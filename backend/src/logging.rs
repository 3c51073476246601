//! Logging setup for the tracker binary.
//!
//! Library code only uses the `log` macros; the binary decides where the
//! output goes.

use env_logger::Env;

/// Initialize `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}
