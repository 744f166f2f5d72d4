//! Aplicaciones map/reduce incluidas en el worker.
//!
//! Cada aplicación es un par de funciones con la firma fija que espera el
//! loop del worker; se eligen por nombre al arrancar.

pub mod crash;
pub mod indexer;
pub mod nocrash;
pub mod rtiming;
pub mod wc;

use crate::store::KeyValue;

/// `(nombre de archivo, contenido) -> registros clave/valor`
pub type MapFn = fn(&str, &str) -> Vec<KeyValue>;

/// `(clave, valores de esa clave) -> valor final`
pub type ReduceFn = fn(&str, &[String]) -> String;

#[derive(Debug, Clone, Copy)]
pub struct App {
    pub name: &'static str,
    pub map: MapFn,
    pub reduce: ReduceFn,
}

pub const APPS: &[App] = &[
    App {
        name: "wc",
        map: wc::map,
        reduce: wc::reduce,
    },
    App {
        name: "indexer",
        map: indexer::map,
        reduce: indexer::reduce,
    },
    App {
        name: "nocrash",
        map: nocrash::map,
        reduce: nocrash::reduce,
    },
    App {
        name: "rtiming",
        map: rtiming::map,
        reduce: rtiming::reduce,
    },
    App {
        name: "crash",
        map: crash::map,
        reduce: crash::reduce,
    },
];

pub fn lookup(name: &str) -> Option<App> {
    APPS.iter().find(|app| app.name == name).copied()
}

pub fn names() -> Vec<&'static str> {
    APPS.iter().map(|app| app.name).collect()
}
