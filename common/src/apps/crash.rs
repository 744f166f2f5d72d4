//! Igual que `nocrash`, pero a veces el proceso muere o se cuelga un rato.
//! Sirve para probar que el coordinador reasigna las tareas perdidas.

use rand::Rng;
use std::{thread::sleep, time::Duration};

use crate::store::KeyValue;

fn maybe_crash() {
    let mut rng = rand::rng();
    if rng.random_range(0..1000) < 330 {
        std::process::exit(1);
    } else if rng.random_range(0..1000) < 660 {
        let ms = rng.random_range(0..10_000);
        sleep(Duration::from_millis(ms));
    }
}

pub fn map(filename: &str, contents: &str) -> Vec<KeyValue> {
    maybe_crash();
    super::nocrash::map(filename, contents)
}

pub fn reduce(key: &str, values: &[String]) -> String {
    maybe_crash();
    super::nocrash::reduce(key, values)
}
