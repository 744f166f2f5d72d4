use common::{
    apps::{nocrash, wc},
    store::{output_file_name, partition_file_name},
    TaskKind, TaskState,
};
use coordinator::{serve, Coordinator};
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    net::SocketAddr,
    path::Path,
    time::Duration,
};
use tokio::{net::TcpListener, task::JoinHandle, time::timeout};
use worker::{CoordinatorClient, Worker, WorkerExit};

const POLL: Duration = Duration::from_millis(20);
const TEST_DEADLINE: Duration = Duration::from_secs(30);

/// Levanta el coordinador en un puerto libre y un "driver" que consulta
/// `is_job_done` como lo hace el binario.
async fn start_coordinator(
    files: Vec<String>,
    n_reduce: u32,
    lease: Duration,
) -> (Coordinator, SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let coordinator = Coordinator::new(files, n_reduce, lease);

    let server_state = coordinator.clone();
    tokio::spawn(async move {
        let _ = serve(listener, server_state).await;
    });

    let driver_state = coordinator.clone();
    let driver = tokio::spawn(async move {
        while !driver_state.is_job_done() {
            tokio::time::sleep(POLL).await;
        }
    });

    (coordinator, addr, driver)
}

fn client_for(addr: SocketAddr) -> CoordinatorClient {
    CoordinatorClient::new(format!("http://{addr}"))
}

fn write_inputs(dir: &Path, contents: &[&str]) -> Vec<String> {
    contents
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let path = dir.join(format!("pg-{i}.txt"));
            fs::write(&path, text).unwrap();
            path.to_string_lossy().to_string()
        })
        .collect()
}

fn read_output(dir: &Path, reduce_id: u32) -> Vec<(String, String)> {
    fs::read_to_string(dir.join(output_file_name(reduce_id)))
        .unwrap()
        .lines()
        .map(|line| {
            let (k, v) = line.split_once(' ').unwrap();
            (k.to_string(), v.to_string())
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dos_archivos_dos_reduces_de_punta_a_punta() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = write_inputs(
        tmp.path(),
        &["el gato y el perro", "El perro come, el gato duerme"],
    );
    let (coordinator, addr, driver) =
        start_coordinator(inputs, 2, Duration::from_secs(10)).await;

    let mut workers = Vec::new();
    for _ in 0..2 {
        let w = Worker::new(client_for(addr), tmp.path(), POLL, wc::map, wc::reduce);
        workers.push(tokio::spawn(async move { w.run().await }));
    }
    for w in workers {
        let exit = timeout(TEST_DEADLINE, w).await.unwrap().unwrap().unwrap();
        assert_eq!(exit, WorkerExit::JobDone);
    }
    timeout(TEST_DEADLINE, driver).await.unwrap().unwrap();
    assert!(coordinator.is_job_done());

    // 2 maps x 2 reduces = 4 particiones
    for m in 0..2 {
        for r in 0..2 {
            assert!(tmp.path().join(partition_file_name(m, r)).is_file());
        }
    }

    let mut merged = BTreeMap::new();
    let mut seen: HashSet<String> = HashSet::new();
    for r in 0..2 {
        let lines = read_output(tmp.path(), r);
        let keys: Vec<&String> = lines.iter().map(|(k, _)| k).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "claves no ordenadas");

        for (k, v) in lines {
            assert!(seen.insert(k.clone()), "clave {k} en más de una salida");
            merged.insert(k, v);
        }
    }

    let expected: BTreeMap<String, String> = [
        ("come", "1"),
        ("duerme", "1"),
        ("el", "4"),
        ("gato", "2"),
        ("perro", "2"),
        ("y", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(merged, expected);

    let outputs = fs::read_dir(tmp.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("mr-out-"))
        .count();
    assert_eq!(outputs, 2);

    coordinator.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn map_de_worker_caido_se_reasigna_tras_el_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = write_inputs(tmp.path(), &["uno dos", "dos tres"]);
    let lease = Duration::from_millis(300);
    let (coordinator, addr, driver) = start_coordinator(inputs.clone(), 2, lease).await;

    // worker "colgado": toma el map 0 y nunca reporta
    let stuck = client_for(addr);
    let leased = stuck.lease_map_task().await.unwrap();
    assert_eq!(leased.task.as_ref().map(|t| t.map_task_id), Some(0));

    let w = Worker::new(client_for(addr), tmp.path(), POLL, nocrash::map, nocrash::reduce);
    let handle = tokio::spawn(async move { w.run().await });

    let exit = timeout(TEST_DEADLINE, handle).await.unwrap().unwrap().unwrap();
    assert_eq!(exit, WorkerExit::JobDone);
    timeout(TEST_DEADLINE, driver).await.unwrap().unwrap();

    let status = coordinator.status();
    let map0 = status
        .tasks
        .iter()
        .find(|t| t.kind == TaskKind::Map && t.id == 0)
        .unwrap();
    assert_eq!(map0.attempts, 2);
    assert_eq!(map0.state, TaskState::Completed);

    // el reporte tardío del worker colgado se acepta sin romper nada
    stuck.complete_map_task(0).await.unwrap();
    assert!(coordinator.is_job_done());

    let mut all = BTreeMap::new();
    for r in 0..2 {
        all.extend(read_output(tmp.path(), r));
    }
    let mut names = inputs.clone();
    names.sort();
    assert_eq!(all.get("a"), Some(&names.join(" ")));
    assert_eq!(all.get("d"), Some(&"xyzzy xyzzy".to_string()));

    coordinator.shutdown();
}

#[tokio::test]
async fn lease_map_espera_si_todos_estan_tomados() {
    let tmp = tempfile::tempdir().unwrap();
    let inputs = write_inputs(tmp.path(), &["a"]);
    let (coordinator, addr, _driver) =
        start_coordinator(inputs, 1, Duration::from_secs(10)).await;

    let client = client_for(addr);
    assert!(client.lease_map_task().await.unwrap().task.is_some());

    let waiting = client.lease_map_task().await.unwrap();
    assert!(waiting.task.is_none());
    assert!(!waiting.done);

    let status = client.job_status().await.unwrap();
    assert_eq!(status.map.leased, 1);
    assert!(!status.done);

    coordinator.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sin_entradas_igual_se_generan_salidas_vacias() {
    let tmp = tempfile::tempdir().unwrap();
    let (coordinator, addr, driver) =
        start_coordinator(Vec::new(), 2, Duration::from_secs(10)).await;

    let w = Worker::new(client_for(addr), tmp.path(), POLL, wc::map, wc::reduce);
    let exit = timeout(TEST_DEADLINE, w.run()).await.unwrap().unwrap();
    assert_eq!(exit, WorkerExit::JobDone);
    timeout(TEST_DEADLINE, driver).await.unwrap().unwrap();

    for r in 0..2 {
        assert!(read_output(tmp.path(), r).is_empty());
    }
    coordinator.shutdown();
}

#[tokio::test]
async fn worker_termina_si_el_coordinador_no_esta() {
    // reservar un puerto y soltarlo: nadie escucha ahí
    let addr = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap()
    };
    let tmp = tempfile::tempdir().unwrap();

    let w = Worker::new(client_for(addr), tmp.path(), POLL, wc::map, wc::reduce);
    let exit = timeout(TEST_DEADLINE, w.run()).await.unwrap().unwrap();
    assert_eq!(exit, WorkerExit::CoordinatorGone);
}

#[tokio::test]
async fn error_de_io_es_fatal_para_el_worker() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("no-existe.txt").to_string_lossy().to_string();
    let (coordinator, addr, _driver) =
        start_coordinator(vec![missing], 1, Duration::from_secs(10)).await;

    let w = Worker::new(client_for(addr), tmp.path(), POLL, wc::map, wc::reduce);
    let res = timeout(TEST_DEADLINE, w.run()).await.unwrap();
    assert!(res.is_err());

    // la tarea sigue tomada: la recupera el watchdog, no el worker
    let status = coordinator.status();
    assert_eq!(status.map.leased, 1);
    coordinator.shutdown();
}
