use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    hash::Hasher,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

use crate::task::TaskId;

/// Par clave/valor que emite una función map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/* =========================
   Nombres de archivos
   ========================= */

/// Archivo intermedio que escribe el map `map_id` para el reduce `reduce_id`.
pub fn partition_file_name(map_id: TaskId, reduce_id: TaskId) -> String {
    format!("partition-{}-{}", map_id, reduce_id)
}

/// Archivo final de un reduce.
pub fn output_file_name(reduce_id: TaskId) -> String {
    format!("mr-out-{}", reduce_id)
}

/// Todos los archivos de partición que necesita el reduce `reduce_id`,
/// uno por cada tarea map, en orden de map id.
pub fn partition_files_for_reduce(map_count: u32, reduce_id: TaskId) -> Vec<String> {
    (0..map_count)
        .map(|map_id| partition_file_name(map_id, reduce_id))
        .collect()
}

/* =========================
   Hash de particionado
   ========================= */

/// FNV-1a de la clave, enmascarado a 31 bits (siempre no negativo).
/// Tiene que ser idéntico en todos los workers y en todas las ejecuciones.
pub fn ihash(key: &str) -> u32 {
    let mut h = FnvHasher::default();
    h.write(key.as_bytes());
    (h.finish() & 0x7fff_ffff) as u32
}

/// Partición (reduce id) que le toca a `key`, en `[0, reducer_count)`.
pub fn partition_for(key: &str, reducer_count: u32) -> u32 {
    ihash(key) % reducer_count.max(1)
}

/* =========================
   Escritura atómica
   ========================= */

/// Escribe `path` en un temporal del mismo directorio y lo renombra al final,
/// así un lector nunca ve un archivo a medio escribir.
fn write_atomically<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        fill(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/* =========================
   Shuffle: map -> particiones
   ========================= */

/// Reparte `records` en `reducer_count` buckets según `partition_for(key)` y
/// escribe cada bucket como JSONL en `<dir>/partition-<map_id>-<r>`.
///
/// Se escriben siempre los `reducer_count` archivos, aunque alguno quede vacío,
/// para que cada reduce encuentre exactamente un archivo por map.
/// Una re-ejecución del mismo map sobreescribe los archivos.
pub fn write_partitions(
    dir: &Path,
    map_id: TaskId,
    records: Vec<KeyValue>,
    reducer_count: u32,
) -> io::Result<Vec<PathBuf>> {
    let reducer_count = reducer_count.max(1);

    let mut buckets: Vec<Vec<KeyValue>> = vec![Vec::new(); reducer_count as usize];
    for kv in records.into_iter() {
        let pid = partition_for(&kv.key, reducer_count) as usize;
        buckets[pid].push(kv);
    }

    let mut paths = Vec::with_capacity(buckets.len());
    for (reduce_id, bucket) in buckets.iter().enumerate() {
        let path = dir.join(partition_file_name(map_id, reduce_id as TaskId));
        write_atomically(&path, |w| {
            for kv in bucket {
                serde_json::to_writer(&mut *w, kv)?;
                w.write_all(b"\n")?;
            }
            Ok(())
        })?;
        paths.push(path);
    }

    Ok(paths)
}

/// Lee un archivo de partición (JSONL) y devuelve sus registros en orden.
pub fn read_partition(path: &Path) -> io::Result<Vec<KeyValue>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let kv: KeyValue = serde_json::from_str(&line).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("registro inválido en {}: {e}", path.display()),
            )
        })?;
        out.push(kv);
    }

    Ok(out)
}

/// Lee y concatena todas las particiones de un reduce (nombres relativos a `dir`).
pub fn read_partitions(dir: &Path, partition_files: &[String]) -> io::Result<Vec<KeyValue>> {
    let mut all = Vec::new();
    for name in partition_files {
        let mut recs = read_partition(&dir.join(name))?;
        all.append(&mut recs);
    }
    Ok(all)
}

/* =========================
   Reduce: agrupar y escribir salida
   ========================= */

/// Ordena (estable) por clave y agrupa cada tramo de claves iguales.
/// Los valores de cada clave conservan el orden en que fueron leídos.
pub fn group_by_key(mut records: Vec<KeyValue>) -> Vec<(String, Vec<String>)> {
    records.sort_by(|a, b| a.key.cmp(&b.key));

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for kv in records.into_iter() {
        match groups.last_mut() {
            Some((key, values)) if *key == kv.key => values.push(kv.value),
            _ => groups.push((kv.key, vec![kv.value])),
        }
    }
    groups
}

/// Escribe el archivo final: una línea `clave valor` por entrada, en el orden dado.
pub fn write_output(path: &Path, lines: &[(String, String)]) -> io::Result<()> {
    write_atomically(path, |w| {
        for (key, value) in lines {
            writeln!(w, "{} {}", key, value)?;
        }
        Ok(())
    })
}
