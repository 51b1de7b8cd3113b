//! End-to-end supervisor tests against real child processes.
//!
//! Programs are overridden to `/bin/sh` so the suite exercises the full
//! spawn → watch → classify → publish pipeline without the bundled
//! executables. Unix only: classification of signals and graceful TERM
//! delivery have no portable equivalent.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use procvisor::{
    CommandError, Config, CrashReason, Event, EventKind, LaunchError, ProgramSpec, RuntimeStatus,
    Supervisor, VenvDiscovery,
};

/// Config whose sync server runs `sh -c <script>` and whose readiness
/// windows are short enough to observe in a test.
fn sh_config(script: &str) -> Config {
    let mut cfg = Config::default();
    cfg.sync_server = ProgramSpec {
        program: PathBuf::from("/bin/sh"),
        args: vec!["-c".into(), script.into()],
    };
    cfg.monitor = ProgramSpec {
        program: PathBuf::from("/bin/sh"),
        args: vec!["-c".into(), script.into()],
    };
    cfg.kernel_ready_after = Duration::from_millis(20);
    cfg.sync_ready_after = Duration::from_millis(20);
    cfg.monitor_ready_after = Duration::from_millis(20);
    cfg.kill_grace = Duration::from_millis(500);
    cfg.grace = Duration::from_secs(5);
    cfg
}

async fn next_matching(
    rx: &mut broadcast::Receiver<Event>,
    pred: impl Fn(&Event) -> bool,
) -> Event {
    timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(ev) if pred(&ev) => return ev,
                Ok(_) => {}
                Err(e) => panic!("bus closed while waiting for event: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Venv fixture whose interpreter is a shell script that sleeps.
fn fake_venv(root: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let venv = root.join(".venv");
    let bin = venv.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let python = bin.join("python");
    std::fs::write(&python, "#!/bin/sh\nsleep 30\n").unwrap();
    std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
    venv
}

#[tokio::test]
async fn clean_exit_is_reported_and_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("exit 0")).build();
    let mut rx = sup.subscribe();

    let id = sup.start_sync_server(dir.path()).await.unwrap();
    let ev = next_matching(&mut rx, |e| {
        e.kind == EventKind::RuntimeExited && e.runtime == Some(id)
    })
    .await;

    assert_eq!(ev.reason, Some(CrashReason::Clean));
    assert_eq!(ev.exit_code, Some(0));
    assert_eq!(ev.signal, None);

    // The terminal instance stays queryable until evicted.
    let state = sup.attach_runtime(id).await.unwrap();
    assert_eq!(state.status, RuntimeStatus::Exited);
    let exit = state.last_exit.expect("exit details recorded");
    assert_eq!(exit.code, Some(0));
}

#[tokio::test]
async fn crash_is_reported_then_evictable() {
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("exit 3")).build();
    let mut rx = sup.subscribe();

    let id = sup.start_sync_server(dir.path()).await.unwrap();
    let ev = next_matching(&mut rx, |e| {
        e.kind == EventKind::RuntimeDied && e.runtime == Some(id)
    })
    .await;

    assert_eq!(ev.reason, Some(CrashReason::Crash));
    assert_eq!(ev.exit_code, Some(3));
    assert!(ev.target.is_some());

    let state = sup.attach_runtime(id).await.unwrap();
    assert_eq!(state.status, RuntimeStatus::Crashed);

    sup.evict_runtime(id).await.unwrap();
    assert!(matches!(
        sup.attach_runtime(id).await,
        Err(CommandError::NotFound { .. })
    ));
}

#[tokio::test]
async fn kill_classifies_as_killed_not_crash() {
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("sleep 30")).build();
    let mut rx = sup.subscribe();

    let id = sup.start_sync_server(dir.path()).await.unwrap();
    sup.kill_runtime(id).await.unwrap();

    let ev = next_matching(&mut rx, |e| e.is_terminal() && e.runtime == Some(id)).await;
    assert_eq!(ev.kind, EventKind::RuntimeExited);
    assert_eq!(ev.reason, Some(CrashReason::Killed));

    let state = sup.attach_runtime(id).await.unwrap();
    assert_eq!(state.status, RuntimeStatus::Exited);

    // A second kill of a terminal instance is a no-op success.
    sup.kill_runtime(id).await.unwrap();
}

#[tokio::test]
async fn sync_server_is_a_singleton_per_target() {
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("sleep 30")).build();

    let first = sup.start_sync_server(dir.path()).await.unwrap();
    let second = sup.start_sync_server(dir.path()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(sup.list_runtimes().await.len(), 1);

    // A different project gets its own instance.
    let other = tempfile::tempdir().unwrap();
    let third = sup.start_sync_server(other.path()).await.unwrap();
    assert_ne!(first, third);

    sup.shutdown().await.unwrap();
}

#[tokio::test]
async fn kernels_attach_by_default_and_fork_on_force_new() {
    let dir = tempfile::tempdir().unwrap();
    let venv = fake_venv(dir.path());
    let mut cfg = sh_config("sleep 30");
    cfg.kernel_args = Vec::new();
    let sup = Supervisor::builder(cfg).build();

    let first = sup.start_python(&venv, false).await.unwrap();
    let attached = sup.start_python(&venv, false).await.unwrap();
    assert_eq!(first, attached);

    let forked = sup.start_python(&venv, true).await.unwrap();
    assert_ne!(first, forked);
    assert_eq!(sup.list_runtimes().await.len(), 2);

    sup.shutdown().await.unwrap();
}

#[tokio::test]
async fn ready_transition_is_observed() {
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("sleep 30")).build();
    let mut rx = sup.subscribe();

    let id = sup.start_sync_server(dir.path()).await.unwrap();
    next_matching(&mut rx, |e| {
        e.kind == EventKind::RuntimeReady && e.runtime == Some(id)
    })
    .await;

    let state = sup.attach_runtime(id).await.unwrap();
    assert_eq!(state.status, RuntimeStatus::Running);

    sup.shutdown().await.unwrap();
}

#[tokio::test]
async fn missing_executable_fails_synchronously() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.sync_server = ProgramSpec::new("/nonexistent/editor-sync-server");
    let sup = Supervisor::builder(cfg).build();

    let err = sup.start_sync_server(dir.path()).await.unwrap_err();
    assert!(matches!(err, LaunchError::NotFound { .. }));
    assert!(sup.list_runtimes().await.is_empty());
}

#[tokio::test]
async fn external_sigkill_counts_as_crash_with_signal() {
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("sleep 30")).build();
    let mut rx = sup.subscribe();

    let id = sup.start_sync_server(dir.path()).await.unwrap();
    let state = sup.attach_runtime(id).await.unwrap();

    // Kill the child behind the supervisor's back.
    unsafe {
        libc::kill(state.pid as libc::pid_t, libc::SIGKILL);
    }

    let ev = next_matching(&mut rx, |e| e.is_terminal() && e.runtime == Some(id)).await;
    assert_eq!(ev.kind, EventKind::RuntimeDied);
    assert_eq!(ev.reason, Some(CrashReason::Crash));
    assert_eq!(ev.signal, Some(libc::SIGKILL));
    assert_eq!(ev.exit_code, None);

    // The death event precedes eviction: by the time it is observed, the
    // registry already holds the terminal state.
    let state = sup.attach_runtime(id).await.unwrap();
    assert_eq!(state.status, RuntimeStatus::Crashed);
}

#[tokio::test]
async fn evicting_a_live_runtime_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("sleep 30")).build();

    let id = sup.start_sync_server(dir.path()).await.unwrap();
    assert!(matches!(
        sup.evict_runtime(id).await,
        Err(CommandError::NotTerminal { .. })
    ));

    sup.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_stops_everything_within_grace() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("sleep 30")).build();
    let mut rx = sup.subscribe();

    sup.start_sync_server(dir_a.path()).await.unwrap();
    sup.start_monitor(dir_b.path()).await.unwrap();

    sup.shutdown().await.unwrap();

    next_matching(&mut rx, |e| e.kind == EventKind::ShutdownRequested).await;
    next_matching(&mut rx, |e| e.kind == EventKind::AllStoppedWithin).await;

    for state in sup.list_runtimes().await {
        assert!(state.status.is_terminal());
        assert_eq!(state.status, RuntimeStatus::Exited);
    }
}

#[tokio::test]
async fn stubborn_child_is_force_killed_after_kill_grace() {
    let dir = tempfile::tempdir().unwrap();
    // Traps TERM so only the KILL escalation can end it.
    let sup = Supervisor::builder(sh_config("trap '' TERM; sleep 30")).build();
    let mut rx = sup.subscribe();

    let id = sup.start_sync_server(dir.path()).await.unwrap();
    // Let the shell install its trap before the TERM arrives.
    tokio::time::sleep(Duration::from_millis(100)).await;
    sup.kill_runtime(id).await.unwrap();

    let ev = next_matching(&mut rx, |e| e.is_terminal() && e.runtime == Some(id)).await;
    assert_eq!(ev.kind, EventKind::RuntimeExited);
    assert_eq!(ev.reason, Some(CrashReason::Killed));
    assert_eq!(ev.signal, Some(libc::SIGKILL));
}

struct FixedVenvs(Vec<PathBuf>);

#[async_trait::async_trait]
impl VenvDiscovery for FixedVenvs {
    async fn interpreters(&self, _project: &Path) -> std::io::Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn project_launch_resolves_venv_through_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let venv = fake_venv(dir.path());
    let mut cfg = sh_config("sleep 30");
    cfg.kernel_args = Vec::new();
    let sup = Supervisor::builder(cfg).build();

    let venvs = FixedVenvs(vec![venv.join("bin").join("python")]);
    let id = sup
        .start_python_for_project(dir.path(), &venvs, false)
        .await
        .unwrap();

    let state = sup.attach_runtime(id).await.unwrap();
    assert_eq!(state.target, venv);

    sup.shutdown().await.unwrap();
}

#[tokio::test]
async fn project_launch_without_candidates_fails() {
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("sleep 30")).build();

    let err = sup
        .start_python_for_project(dir.path(), &FixedVenvs(Vec::new()), false)
        .await
        .unwrap_err();
    assert!(matches!(err, LaunchError::NotFound { path } if path == dir.path()));
}

#[tokio::test]
async fn subscribers_observe_the_full_lifecycle() {
    use async_trait::async_trait;
    use procvisor::Subscribe;
    use std::sync::Mutex;

    struct Recorder(Arc<Mutex<Vec<EventKind>>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let dir = tempfile::tempdir().unwrap();
    let sup = Supervisor::builder(sh_config("exit 0"))
        .with_subscriber(Arc::new(Recorder(Arc::clone(&seen))))
        .build();
    let mut rx = sup.subscribe();

    let id = sup.start_sync_server(dir.path()).await.unwrap();
    next_matching(&mut rx, |e| e.is_terminal() && e.runtime == Some(id)).await;

    // Workers drain their queues asynchronously.
    timeout(Duration::from_secs(5), async {
        loop {
            if seen.lock().unwrap().contains(&EventKind::RuntimeExited) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscriber never saw the terminal event");

    let kinds = seen.lock().unwrap().clone();
    assert!(kinds.contains(&EventKind::RuntimeStarted));
    let started = kinds
        .iter()
        .position(|k| *k == EventKind::RuntimeStarted)
        .unwrap();
    let exited = kinds
        .iter()
        .position(|k| *k == EventKind::RuntimeExited)
        .unwrap();
    assert!(started < exited, "lifecycle order preserved per runtime");
}
