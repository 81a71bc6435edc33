//! Enumerators backed by the host's own tooling.

use crate::command::run_command;
use crate::ports::{parse_lsof_output, parse_netstat_ano, resolve_pids};
use crate::process::{parse_ps_output, parse_tasklist_csv, parse_tasklist_pids};
use crate::{EnumerateError, Enumerator, PortMap, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// `ps` and `lsof` based enumeration for Linux, macOS and the BSDs.
#[derive(Debug, Clone)]
pub struct UnixEnumerator {
    timeout: Duration,
}

impl UnixEnumerator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Enumerator for UnixEnumerator {
    async fn list_ports(&self) -> Result<PortMap> {
        // lsof exits 1 when no socket matches
        let output = run_command("lsof", &["-i", "-P", "-n"], self.timeout, &[1]).await?;
        let ports = parse_lsof_output(&output).map_err(|reason| EnumerateError::Parse {
            command: "lsof -i -P -n".to_string(),
            reason,
        })?;
        debug!("lsof reported {} listening port(s)", ports.len());
        Ok(ports)
    }

    async fn list_processes(&self) -> Result<Vec<String>> {
        let output = run_command("ps", &["-e", "-o", "comm="], self.timeout, &[]).await?;
        Ok(parse_ps_output(&output))
    }
}

/// `tasklist` and `netstat` based enumeration for Windows.
#[derive(Debug, Clone)]
pub struct WindowsEnumerator {
    timeout: Duration,
}

impl WindowsEnumerator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn tasklist(&self) -> Result<String> {
        run_command("tasklist", &["/fo", "csv", "/nh"], self.timeout, &[]).await
    }
}

#[async_trait]
impl Enumerator for WindowsEnumerator {
    async fn list_ports(&self) -> Result<PortMap> {
        let output = run_command("netstat", &["-ano"], self.timeout, &[]).await?;
        let listening = parse_netstat_ano(&output).map_err(|reason| EnumerateError::Parse {
            command: "netstat -ano".to_string(),
            reason,
        })?;
        let names: HashMap<u32, String> = parse_tasklist_pids(&self.tasklist().await?)
            .into_iter()
            .collect();
        let ports = resolve_pids(&listening, &names);
        debug!("netstat reported {} listening port(s)", ports.len());
        Ok(ports)
    }

    async fn list_processes(&self) -> Result<Vec<String>> {
        Ok(parse_tasklist_csv(&self.tasklist().await?))
    }
}

/// The enumerator for the platform this binary was built for.
pub fn system_enumerator(timeout: Duration) -> Box<dyn Enumerator> {
    if cfg!(windows) {
        Box::new(WindowsEnumerator::new(timeout))
    } else {
        Box::new(UnixEnumerator::new(timeout))
    }
}
