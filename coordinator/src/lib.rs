pub mod handlers;
pub mod inputs;
pub mod state;
mod watchdog;

pub use handlers::build_router;
pub use state::Coordinator;

use std::io;
use tokio::net::TcpListener;

/// Sirve las RPC del coordinador en `listener` hasta que se aborte la tarea.
pub async fn serve(listener: TcpListener, coordinator: Coordinator) -> io::Result<()> {
    axum::serve(listener, build_router(coordinator)).await
}
