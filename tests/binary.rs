//! The `redis-exporter` binary: version output, OS signals and exit codes.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const BIN: &str = env!("CARGO_BIN_EXE_redis-exporter");

fn exporter() -> Command {
    let mut command = Command::new(BIN);
    command.env_remove("RUST_LOG");
    command
}

fn free_port() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
}

fn wait_for_exit(child: &mut Child, limit: Duration) -> ExitStatus {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("exporter did not exit within {limit:?}");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn wait_for_listener(addr: SocketAddr, child: &mut Child) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while TcpStream::connect(addr).is_err() {
        if let Some(status) = child.try_wait().unwrap() {
            panic!("exporter exited before listening: {status}");
        }
        assert!(Instant::now() < deadline, "exporter never listened on {addr}");
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn version_prints_build_metadata_without_serving() {
    // Holding the port means any attempt to serve would fail the run.
    let held = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = held.local_addr().unwrap();

    let output = exporter()
        .args(["--version", "--web.listen-address", &addr.to_string()])
        .output()
        .unwrap();

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Redis Metrics Exporter"), "{stdout}");
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "{stdout}");
    assert!(stdout.contains("build date:"), "{stdout}");
}

#[test]
fn malformed_connection_timeout_exits_non_zero() {
    let mut child = exporter()
        .args([
            "--web.listen-address",
            "127.0.0.1:0",
            "--connection-timeout",
            "fifteen",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let status = wait_for_exit(&mut child, Duration::from_secs(10));
    assert!(!status.success());
    assert_eq!(status.code(), Some(1));
}

#[test]
fn port_in_use_exits_non_zero() {
    let held = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = held.local_addr().unwrap();

    let mut child = exporter()
        .args(["--web.listen-address", &addr.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let status = wait_for_exit(&mut child, Duration::from_secs(10));
    assert_eq!(status.code(), Some(1));
}

#[cfg(unix)]
mod signals {
    use super::*;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    fn serving(addr: SocketAddr) -> Child {
        let mut child = exporter()
            .args(["--web.listen-address", &addr.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        wait_for_listener(addr, &mut child);
        child
    }

    fn pid(child: &Child) -> Pid {
        Pid::from_raw(i32::try_from(child.id()).unwrap())
    }

    #[test]
    fn sigterm_stops_cleanly_and_second_signal_is_ignored() {
        let addr = free_port();
        let mut child = serving(addr);

        kill(pid(&child), Signal::SIGTERM).unwrap();
        // The process may already be gone; a default SIGINT would show up as
        // a signal exit instead of status 0.
        let _ = kill(pid(&child), Signal::SIGINT);

        let status = wait_for_exit(&mut child, Duration::from_secs(15));
        assert!(status.success(), "{status}");
        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn sigint_stops_cleanly() {
        let addr = free_port();
        let mut child = serving(addr);

        kill(pid(&child), Signal::SIGINT).unwrap();

        let status = wait_for_exit(&mut child, Duration::from_secs(15));
        assert!(status.success(), "{status}");
    }
}
