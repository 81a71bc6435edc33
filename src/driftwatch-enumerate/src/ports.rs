//! Parsers for listening-socket listings.

use crate::PortMap;
use std::collections::HashMap;

/// Name used when a port's owning process cannot be resolved.
pub const UNKNOWN_PROCESS: &str = "unknown";

/// Parse `lsof -i -P -n` output into listening ports.
///
/// TCP sockets count only in `LISTEN` state, UDP sockets only when not
/// connected. When several processes hold the same port the first one
/// listed wins.
pub fn parse_lsof_output(output: &str) -> Result<PortMap, String> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    match lines.next() {
        None => return Ok(PortMap::new()),
        Some(header) if header.trim_start().starts_with("COMMAND") => {}
        Some(other) => return Err(format!("missing lsof header, got '{}'", other.trim())),
    }

    let mut ports = PortMap::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }
        let Some(proto_idx) = fields.iter().position(|f| *f == "TCP" || *f == "UDP") else {
            continue;
        };
        let Some(name) = fields.get(proto_idx + 1) else {
            continue;
        };
        if name.contains("->") {
            continue;
        }
        if fields[proto_idx] == "TCP" && fields.get(proto_idx + 2) != Some(&"(LISTEN)") {
            continue;
        }
        if let Some(port) = port_of(name) {
            ports.entry(port).or_insert_with(|| fields[0].to_string());
        }
    }
    Ok(ports)
}

/// Parse Windows `netstat -ano` output into `(port, pid)` pairs.
pub fn parse_netstat_ano(output: &str) -> Result<Vec<(u16, u32)>, String> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    if !output.lines().any(|l| l.trim_start().starts_with("Proto")) {
        return Err("missing netstat column header".to_string());
    }

    let mut listening = Vec::new();
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let pid_field = match fields.first() {
            Some(&"TCP") if fields.len() >= 5 && fields[3] == "LISTENING" => fields[4],
            Some(&"UDP") if fields.len() >= 4 => fields[fields.len() - 1],
            _ => continue,
        };
        let (Some(port), Ok(pid)) = (port_of(fields[1]), pid_field.parse::<u32>()) else {
            continue;
        };
        listening.push((port, pid));
    }
    Ok(listening)
}

/// Join `(port, pid)` pairs with a pid to process-name table.
pub fn resolve_pids(listening: &[(u16, u32)], names: &HashMap<u32, String>) -> PortMap {
    let mut ports = PortMap::new();
    for (port, pid) in listening {
        ports.entry(*port).or_insert_with(|| {
            names
                .get(pid)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_PROCESS.to_string())
        });
    }
    ports
}

/// Port number after the last colon of `addr` (`*:80`, `[::1]:8080`).
fn port_of(addr: &str) -> Option<u16> {
    let (_, port) = addr.rsplit_once(':')?;
    port.parse().ok()
}
