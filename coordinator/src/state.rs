// coordinator/src/state.rs

use chrono::{DateTime, Utc};
use common::{
    store::partition_files_for_reduce, JobPhase, JobStatusResponse, LeaseGen,
    LeaseMapTaskResponse, LeaseReduceTaskResponse, MapAssignment, ReduceAssignment,
    StateCounts, TaskId, TaskKind, TaskState, TaskStatus,
};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::watchdog;

#[derive(Debug, Clone)]
struct TaskEntry {
    state: TaskState,
    /// Generación del último lease; 0 si nunca se entregó
    lease_gen: LeaseGen,
    attempts: u32,
    leased_at: Option<DateTime<Utc>>,
}

impl TaskEntry {
    fn idle() -> Self {
        Self {
            state: TaskState::Idle,
            lease_gen: 0,
            attempts: 0,
            leased_at: None,
        }
    }

    fn grant(&mut self, gen: LeaseGen, now: DateTime<Utc>) {
        self.state = TaskState::Leased;
        self.lease_gen = gen;
        self.attempts += 1;
        self.leased_at = Some(now);
    }
}

/// Resultado de pedir una tarea al ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lease<T> {
    Granted { task: T, gen: LeaseGen },
    /// No hay tareas Idle pero quedan sin completar: volver a pedir más tarde
    Wait,
    /// Todas las tareas de la fase están completadas
    AllDone,
}

/// Todo el estado mutable del coordinador. Sólo se toca a través de
/// `Coordinator`, siempre con el lock tomado.
#[derive(Debug)]
pub(crate) struct Ledger {
    map_tasks: BTreeMap<TaskId, TaskEntry>,
    /// Vacío mientras se está mapeando; se llena en `is_job_done`
    reduce_tasks: BTreeMap<TaskId, TaskEntry>,
    map_files: BTreeMap<TaskId, String>,
    reducer_count: u32,
    last_gen: LeaseGen,
}

fn all_completed(tasks: &BTreeMap<TaskId, TaskEntry>) -> bool {
    tasks.values().all(|t| t.state == TaskState::Completed)
}

impl Ledger {
    pub fn new(files: Vec<String>, reducer_count: u32) -> Self {
        let mut map_tasks = BTreeMap::new();
        let mut map_files = BTreeMap::new();
        for (id, file) in files.into_iter().enumerate() {
            map_tasks.insert(id as TaskId, TaskEntry::idle());
            map_files.insert(id as TaskId, file);
        }

        Self {
            map_tasks,
            reduce_tasks: BTreeMap::new(),
            map_files,
            reducer_count: reducer_count.max(1),
            last_gen: 0,
        }
    }

    pub fn map_count(&self) -> u32 {
        self.map_tasks.len() as u32
    }

    pub fn reducer_count(&self) -> u32 {
        self.reducer_count
    }

    fn next_gen(&mut self) -> LeaseGen {
        self.last_gen += 1;
        self.last_gen
    }

    pub fn lease_map(&mut self, now: DateTime<Utc>) -> Lease<MapAssignment> {
        let idle = self
            .map_tasks
            .iter()
            .find(|(_, t)| t.state == TaskState::Idle)
            .map(|(id, _)| *id);

        let Some(id) = idle else {
            return if all_completed(&self.map_tasks) {
                Lease::AllDone
            } else {
                Lease::Wait
            };
        };

        let gen = self.next_gen();
        if let Some(entry) = self.map_tasks.get_mut(&id) {
            entry.grant(gen, now);
        }

        let task = MapAssignment {
            filename: self.map_files.get(&id).cloned().unwrap_or_default(),
            map_task_id: id,
            reducer_count: self.reducer_count,
        };
        Lease::Granted { task, gen }
    }

    pub fn lease_reduce(&mut self, now: DateTime<Utc>) -> Lease<ReduceAssignment> {
        // Barrera: sin ledger de reduce todavía se está mapeando
        if self.reduce_tasks.is_empty() {
            return Lease::Wait;
        }

        let idle = self
            .reduce_tasks
            .iter()
            .find(|(_, t)| t.state == TaskState::Idle)
            .map(|(id, _)| *id);

        let Some(id) = idle else {
            return if all_completed(&self.reduce_tasks) {
                Lease::AllDone
            } else {
                Lease::Wait
            };
        };

        let gen = self.next_gen();
        if let Some(entry) = self.reduce_tasks.get_mut(&id) {
            entry.grant(gen, now);
        }

        let task = ReduceAssignment {
            partition_files: partition_files_for_reduce(self.map_count(), id),
            reduce_task_id: id,
        };
        Lease::Granted { task, gen }
    }

    fn tasks_mut(&mut self, kind: TaskKind) -> &mut BTreeMap<TaskId, TaskEntry> {
        match kind {
            TaskKind::Map => &mut self.map_tasks,
            TaskKind::Reduce => &mut self.reduce_tasks,
        }
    }

    /// Marca la tarea como completada sin importar su estado actual.
    /// Devuelve false si el id no existe (se ignora).
    pub fn complete(&mut self, kind: TaskKind, id: TaskId) -> bool {
        match self.tasks_mut(kind).get_mut(&id) {
            Some(entry) => {
                entry.state = TaskState::Completed;
                true
            }
            None => false,
        }
    }

    /// Vuelve la tarea a Idle si sigue Leased con la misma generación.
    /// Devuelve true si hubo reclamo.
    pub fn expire(&mut self, kind: TaskKind, id: TaskId, gen: LeaseGen) -> bool {
        match self.tasks_mut(kind).get_mut(&id) {
            Some(entry) if entry.state == TaskState::Leased && entry.lease_gen == gen => {
                entry.state = TaskState::Idle;
                entry.leased_at = None;
                true
            }
            _ => false,
        }
    }

    /// Crea el ledger de reduce la primera vez que ve todos los maps
    /// completados; después sólo es true cuando todos los reduces terminaron.
    pub fn is_job_done(&mut self) -> bool {
        if self.reduce_tasks.is_empty() {
            if !all_completed(&self.map_tasks) {
                return false;
            }

            for id in 0..self.reducer_count {
                self.reduce_tasks.insert(id, TaskEntry::idle());
            }
            info!(
                "todos los maps ({}) completados, habilitando {} tareas reduce",
                self.map_count(),
                self.reducer_count
            );
            return false;
        }

        all_completed(&self.reduce_tasks)
    }

    pub fn phase(&self) -> JobPhase {
        if self.reduce_tasks.is_empty() {
            JobPhase::Mapping
        } else if all_completed(&self.reduce_tasks) {
            JobPhase::Done
        } else {
            JobPhase::Reducing
        }
    }

    pub fn snapshot(&self) -> JobStatusResponse {
        let mut map = StateCounts::default();
        let mut reduce = StateCounts::default();
        let mut tasks = Vec::with_capacity(self.map_tasks.len() + self.reduce_tasks.len());

        for (id, t) in &self.map_tasks {
            map.add(t.state);
            tasks.push(TaskStatus {
                kind: TaskKind::Map,
                id: *id,
                state: t.state,
                attempts: t.attempts,
                leased_at: t.leased_at,
                filename: self.map_files.get(id).cloned(),
            });
        }
        for (id, t) in &self.reduce_tasks {
            reduce.add(t.state);
            tasks.push(TaskStatus {
                kind: TaskKind::Reduce,
                id: *id,
                state: t.state,
                attempts: t.attempts,
                leased_at: t.leased_at,
                filename: None,
            });
        }

        let phase = self.phase();
        JobStatusResponse {
            phase,
            reducer_count: self.reducer_count,
            map,
            reduce,
            done: phase == JobPhase::Done,
            tasks,
        }
    }
}

/// Servicio del coordinador: dueño del ledger y de los watchdogs de lease.
/// Se clona barato (todo va detrás de `Arc`) y es el `State` del router.
#[derive(Clone)]
pub struct Coordinator {
    ledger: Arc<Mutex<Ledger>>,
    lease_timeout: Duration,
    // timers de lease pendientes, para poder abortarlos al apagar
    watchdogs: Arc<Mutex<JoinSet<()>>>,
}

impl Coordinator {
    pub fn new(files: Vec<String>, reducer_count: u32, lease_timeout: Duration) -> Self {
        let ledger = Ledger::new(files, reducer_count);
        info!(
            "job creado: {} tareas map, {} tareas reduce, lease de {:?}",
            ledger.map_count(),
            ledger.reducer_count(),
            lease_timeout
        );

        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            lease_timeout,
            watchdogs: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        lock_ledger(&self.ledger)
    }

    pub fn lease_timeout(&self) -> Duration {
        self.lease_timeout
    }

    pub fn lease_map_task(&self) -> LeaseMapTaskResponse {
        let lease = self.ledger().lease_map(Utc::now());

        match lease {
            Lease::Granted { task, gen } => {
                info!(
                    "asignando map {} (input={}, gen={})",
                    task.map_task_id, task.filename, gen
                );
                self.arm_watchdog(TaskKind::Map, task.map_task_id, gen);
                LeaseMapTaskResponse {
                    task: Some(task),
                    done: false,
                }
            }
            Lease::Wait => LeaseMapTaskResponse {
                task: None,
                done: false,
            },
            Lease::AllDone => LeaseMapTaskResponse {
                task: None,
                done: true,
            },
        }
    }

    pub fn complete_map_task(&self, id: TaskId) {
        if self.ledger().complete(TaskKind::Map, id) {
            info!("map {} completado", id);
        } else {
            warn!("reporte de map {} desconocido, ignorado", id);
        }
    }

    pub fn lease_reduce_task(&self) -> LeaseReduceTaskResponse {
        let lease = self.ledger().lease_reduce(Utc::now());

        match lease {
            Lease::Granted { task, gen } => {
                info!(
                    "asignando reduce {} ({} particiones, gen={})",
                    task.reduce_task_id,
                    task.partition_files.len(),
                    gen
                );
                self.arm_watchdog(TaskKind::Reduce, task.reduce_task_id, gen);
                LeaseReduceTaskResponse {
                    task: Some(task),
                    done: false,
                }
            }
            Lease::Wait => LeaseReduceTaskResponse {
                task: None,
                done: false,
            },
            Lease::AllDone => LeaseReduceTaskResponse {
                task: None,
                done: true,
            },
        }
    }

    pub fn complete_reduce_task(&self, id: TaskId) {
        if self.ledger().complete(TaskKind::Reduce, id) {
            info!("reduce {} completado", id);
        } else {
            warn!("reporte de reduce {} desconocido, ignorado", id);
        }
    }

    /// Lo consulta el driver cada segundo. No bloquea.
    pub fn is_job_done(&self) -> bool {
        self.ledger().is_job_done()
    }

    pub fn status(&self) -> JobStatusResponse {
        self.ledger().snapshot()
    }

    fn arm_watchdog(&self, kind: TaskKind, id: TaskId, gen: LeaseGen) {
        let ledger = Arc::clone(&self.ledger);
        let timeout = self.lease_timeout;

        let mut set = self
            .watchdogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // limpiar los timers que ya dispararon
        while set.try_join_next().is_some() {}
        set.spawn(watchdog::run(ledger, kind, id, gen, timeout));
    }

    /// Cantidad de watchdogs que todavía no dispararon.
    pub fn pending_watchdogs(&self) -> usize {
        let mut set = self
            .watchdogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while set.try_join_next().is_some() {}
        set.len()
    }

    /// Aborta los watchdogs pendientes.
    pub fn shutdown(&self) {
        let mut set = self
            .watchdogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !set.is_empty() {
            info!("abortando {} watchdogs pendientes", set.len());
        }
        set.abort_all();
    }
}

pub(crate) fn lock_ledger(ledger: &Mutex<Ledger>) -> MutexGuard<'_, Ledger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}
