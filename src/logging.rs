//! Inicialización de logs: `tracing-subscriber` con filtro de `RUST_LOG`.
//! Los crates de librería emiten con `log`; el subscriber los recoge a
//! través del puente `tracing-log`.
use tracing_subscriber::EnvFilter;

/// `default_directive` se usa cuando `RUST_LOG` no está definido.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    // Un segundo init (tests, binarios embebidos) no es error.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
