use std::collections::BTreeSet;

use crate::store::KeyValue;

/// Índice invertido: emite `(palabra, documento)` una vez por palabra distinta.
pub fn map(filename: &str, contents: &str) -> Vec<KeyValue> {
    let words: BTreeSet<&str> = contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();

    words
        .into_iter()
        .map(|w| KeyValue::new(w, filename))
        .collect()
}

/// `<cantidad de documentos> <doc1>,<doc2>,...` con los documentos ordenados.
pub fn reduce(_key: &str, values: &[String]) -> String {
    let docs: BTreeSet<&str> = values.iter().map(String::as_str).collect();
    let joined = docs.iter().copied().collect::<Vec<_>>().join(",");
    format!("{} {}", docs.len(), joined)
}
