use anyhow::{Context, Result};
use glob::glob;
use std::path::Path;
use tracing::warn;

fn is_pattern(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Expande los argumentos de entrada: los patrones glob se reemplazan por los
/// archivos que matchean (en orden), las rutas literales pasan tal cual.
/// El orden resultante define los ids de las tareas map.
pub fn expand_inputs(args: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for arg in args {
        if !is_pattern(arg) {
            if !Path::new(arg).is_file() {
                warn!("archivo de entrada {} no existe (todavía)", arg);
            }
            files.push(arg.clone());
            continue;
        }

        let entries = glob(arg).with_context(|| format!("patrón de entrada inválido: {arg}"))?;
        let mut matched = 0;
        for entry in entries.flatten() {
            if entry.is_file() {
                files.push(entry.to_string_lossy().to_string());
                matched += 1;
            }
        }
        if matched == 0 {
            warn!("el patrón {} no matcheó ningún archivo", arg);
        }
    }

    Ok(files)
}
