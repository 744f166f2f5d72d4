use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id denso de tarea. Los ids de map y de reduce son espacios independientes,
/// ambos empiezan en 0.
pub type TaskId = u32;

/// Generación de un lease. Cada vez que una tarea se entrega a un worker
/// se asigna una generación nueva; el watchdog sólo reclama la suya.
pub type LeaseGen = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Idle,
    Leased,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Map,
    Reduce,
}

/// Fase global del job vista desde el coordinador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    Mapping,
    Reducing,
    Done,
}

/// Fila del snapshot de estado (para `client status`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub kind: TaskKind,
    pub id: TaskId,
    pub state: TaskState,
    /// Cuántas veces se entregó esta tarea
    pub attempts: u32,
    pub leased_at: Option<DateTime<Utc>>,
    /// Sólo para map: archivo de entrada
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub idle: u32,
    pub leased: u32,
    pub completed: u32,
}

impl StateCounts {
    pub fn add(&mut self, state: TaskState) {
        match state {
            TaskState::Idle => self.idle += 1,
            TaskState::Leased => self.leased += 1,
            TaskState::Completed => self.completed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.idle + self.leased + self.completed
    }
}
