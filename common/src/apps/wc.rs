use crate::store::KeyValue;

/// Separa el contenido en palabras: tramos de caracteres alfabéticos,
/// normalizados a minúscula. Emite `(palabra, "1")` por aparición.
pub fn map(_filename: &str, contents: &str) -> Vec<KeyValue> {
    contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(|w| KeyValue::new(w.to_lowercase(), "1"))
        .collect()
}

/// Cantidad de apariciones de la palabra.
pub fn reduce(_key: &str, values: &[String]) -> String {
    values.len().to_string()
}
