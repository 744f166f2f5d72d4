use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_COORDINATOR_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_LEASE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_REDUCER_COUNT: u32 = 10;

/// Lee una variable de entorno numérica; si no está o no parsea, usa `default`.
fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Dirección (host:puerto) donde escucha el coordinador.
/// Se puede sobreescribir con MR_COORDINATOR_ADDR.
pub fn coordinator_addr() -> String {
    env::var("MR_COORDINATOR_ADDR").unwrap_or_else(|_| DEFAULT_COORDINATOR_ADDR.to_string())
}

/// URL base para los clientes HTTP (worker y client).
pub fn coordinator_base_url() -> String {
    format!("http://{}", coordinator_addr())
}

/// Directorio compartido donde viven particiones y salidas (MR_WORK_DIR, default ".").
pub fn work_dir() -> PathBuf {
    env::var("MR_WORK_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Duración de un lease antes de que el watchdog lo reclame.
pub fn lease_timeout() -> Duration {
    Duration::from_secs(env_u64("MR_LEASE_TIMEOUT_SECS", DEFAULT_LEASE_TIMEOUT_SECS))
}

/// Pausa del worker entre pedidos cuando no hay trabajo. Nunca cero.
pub fn poll_interval() -> Duration {
    Duration::from_millis(env_u64("MR_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_u64_respeta_env_var_y_default() {
        env::set_var("MR_TEST_ENV_U64", "1234");
        assert_eq!(env_u64("MR_TEST_ENV_U64", 7), 1234);

        env::set_var("MR_TEST_ENV_U64", "no-es-numero");
        assert_eq!(env_u64("MR_TEST_ENV_U64", 7), 7);

        env::remove_var("MR_TEST_ENV_U64");
        assert_eq!(env_u64("MR_TEST_ENV_U64", 7), 7);
    }

    #[test]
    fn coordinator_base_url_agrega_esquema() {
        assert!(coordinator_base_url().starts_with("http://"));
    }
}
