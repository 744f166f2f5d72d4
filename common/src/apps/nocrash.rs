use crate::store::KeyValue;

/// Cuatro hechos deterministas por archivo: nombre, largo del nombre,
/// largo del contenido y una constante.
pub fn map(filename: &str, contents: &str) -> Vec<KeyValue> {
    vec![
        KeyValue::new("a", filename),
        KeyValue::new("b", filename.len().to_string()),
        KeyValue::new("c", contents.len().to_string()),
        KeyValue::new("d", "xyzzy"),
    ]
}

/// Valores ordenados y unidos por espacio, para que la salida no dependa
/// del orden en que llegaron.
pub fn reduce(_key: &str, values: &[String]) -> String {
    let mut sorted = values.to_vec();
    sorted.sort();
    sorted.join(" ")
}
