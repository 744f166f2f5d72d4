//! Verifica que las tareas reduce corran en paralelo en varios workers.
//!
//! Cada reduce deja un archivo `mr-worker-reduce-<pid>` en el directorio de
//! trabajo, cuenta cuántos de esos pids siguen vivos, espera un segundo y
//! borra su marca. La salida de cada clave es esa cuenta.

use std::{
    fs, io,
    path::Path,
    thread::sleep,
    time::Duration,
};

use crate::{config, store::KeyValue};

const MARKER_HOLD: Duration = Duration::from_secs(1);

// En Linux un pid vivo tiene su entrada en /proc
fn pid_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

/// Cuenta los workers vivos que están en `phase` al mismo tiempo que éste.
fn count_parallel_in(dir: &Path, phase: &str, hold: Duration) -> io::Result<usize> {
    let prefix = format!("mr-worker-{}-", phase);
    let marker = dir.join(format!("{}{}", prefix, std::process::id()));
    fs::write(&marker, "x")?;

    let mut alive = 0;
    for entry in fs::read_dir(dir)?.flatten() {
        let name = entry.file_name();
        let Some(pid) = name
            .to_str()
            .and_then(|n| n.strip_prefix(prefix.as_str()))
            .and_then(|p| p.parse::<u32>().ok())
        else {
            continue;
        };
        if pid_alive(pid) {
            alive += 1;
        }
    }

    sleep(hold);
    fs::remove_file(&marker)?;
    Ok(alive)
}

/// Diez claves fijas con valor "1", independiente del archivo.
pub fn map(_filename: &str, _contents: &str) -> Vec<KeyValue> {
    ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]
        .into_iter()
        .map(|k| KeyValue::new(k, "1"))
        .collect()
}

pub fn reduce(_key: &str, _values: &[String]) -> String {
    match count_parallel_in(&config::work_dir(), "reduce", MARKER_HOLD) {
        Ok(n) => n.to_string(),
        // no se pudo escribir la marca
        Err(_) => "0".to_string(),
    }
}
