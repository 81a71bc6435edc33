//! Enumerator over a fixed, replaceable snapshot of host state.

use crate::{EnumerateError, Enumerator, PortMap, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Snapshot {
    ports: PortMap,
    processes: Vec<String>,
    ports_error: Option<String>,
    processes_error: Option<String>,
}

/// Serves ports and processes from memory; files are walked from disk.
///
/// Useful for replaying captured state and for driving the engine without
/// shelling out.
#[derive(Debug, Default)]
pub struct StaticEnumerator {
    state: Mutex<Snapshot>,
}

impl StaticEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: report `port` as held by `process`.
    pub fn with_port(self, port: u16, process: impl Into<String>) -> Self {
        self.state.lock().ports.insert(port, process.into());
        self
    }

    /// Builder: report `name` as running.
    pub fn with_process(self, name: impl Into<String>) -> Self {
        self.state.lock().processes.push(name.into());
        self
    }

    /// Replace the port map.
    pub fn set_ports(&self, ports: PortMap) {
        self.state.lock().ports = ports;
    }

    /// Replace the process list.
    pub fn set_processes(&self, processes: Vec<String>) {
        self.state.lock().processes = processes;
    }

    /// Make the next port listings fail with `reason` (`None` to recover).
    pub fn fail_ports(&self, reason: Option<&str>) {
        self.state.lock().ports_error = reason.map(str::to_string);
    }

    /// Make the next process listings fail with `reason` (`None` to recover).
    pub fn fail_processes(&self, reason: Option<&str>) {
        self.state.lock().processes_error = reason.map(str::to_string);
    }
}

#[async_trait]
impl Enumerator for StaticEnumerator {
    async fn list_ports(&self) -> Result<PortMap> {
        let state = self.state.lock();
        match &state.ports_error {
            Some(reason) => Err(EnumerateError::Failed {
                command: "static ports".to_string(),
                status: "error".to_string(),
                stderr: reason.clone(),
            }),
            None => Ok(state.ports.clone()),
        }
    }

    async fn list_processes(&self) -> Result<Vec<String>> {
        let state = self.state.lock();
        match &state.processes_error {
            Some(reason) => Err(EnumerateError::Failed {
                command: "static processes".to_string(),
                status: "error".to_string(),
                stderr: reason.clone(),
            }),
            None => Ok(state.processes.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_state_and_failures() {
        let enumerator = StaticEnumerator::new()
            .with_port(8080, "nginx")
            .with_process("sshd");

        assert_eq!(
            enumerator.list_ports().await.unwrap().get(&8080).map(String::as_str),
            Some("nginx")
        );
        assert_eq!(enumerator.list_processes().await.unwrap(), vec!["sshd"]);

        enumerator.fail_processes(Some("ps: not found"));
        assert!(enumerator.list_processes().await.is_err());
        enumerator.fail_processes(None);
        assert!(enumerator.list_processes().await.is_ok());
    }
}
