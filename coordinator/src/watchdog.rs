use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use common::{LeaseGen, TaskId, TaskKind};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::state::{lock_ledger, Ledger};

/// Timer de un lease: espera `timeout` y, si la tarea sigue Leased con la
/// misma generación, la devuelve a Idle para que otro worker la tome.
///
/// No se cancela cuando la tarea se completa; el chequeo bajo el lock hace
/// que un disparo tardío no tenga efecto.
pub(crate) async fn run(
    ledger: Arc<Mutex<Ledger>>,
    kind: TaskKind,
    id: TaskId,
    gen: LeaseGen,
    timeout: Duration,
) {
    sleep(timeout).await;

    let reclaimed = lock_ledger(&ledger).expire(kind, id, gen);
    if reclaimed {
        warn!(
            "lease de {:?} {} (gen={}) vencido tras {:?}, vuelve a Idle",
            kind, id, gen, timeout
        );
    } else {
        debug!("watchdog de {:?} {} (gen={}) sin efecto", kind, id, gen);
    }
}
