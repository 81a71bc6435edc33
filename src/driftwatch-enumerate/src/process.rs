//! Parsers for process listings.

use std::path::Path;

/// Parse `ps -e -o comm=` output into process names.
///
/// Some platforms print the full executable path in `comm`; for absolute
/// paths only the last component is kept. Other names may contain `/`
/// (Linux kernel threads such as `kworker/0:1H`) and are kept whole.
pub fn parse_ps_output(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if !line.starts_with('/') {
                return line.to_string();
            }
            Path::new(line)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| line.to_string())
        })
        .collect()
}

/// Parse `tasklist /fo csv /nh` output into process names.
pub fn parse_tasklist_csv(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| csv_fields(line).into_iter().next())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Parse `tasklist /fo csv /nh` output into `(pid, name)` pairs.
pub fn parse_tasklist_pids(output: &str) -> Vec<(u32, String)> {
    output
        .lines()
        .filter_map(|line| {
            let fields = csv_fields(line);
            let name = fields.first()?.clone();
            let pid = fields.get(1)?.parse().ok()?;
            Some((pid, name))
        })
        .collect()
}

/// Split one line of tasklist's quoted CSV.
fn csv_fields(line: &str) -> Vec<String> {
    let line = line.trim();
    if !line.starts_with('"') {
        return Vec::new();
    }
    line.split("\",\"")
        .map(|field| field.trim_matches('"').trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_ps_linux() {
        let out = "systemd\nkthreadd\n  sshd  \n\nnginx\n";
        assert_eq!(parse_ps_output(out), vec!["systemd", "kthreadd", "sshd", "nginx"]);
    }

    #[test]
    fn test_parse_ps_macos_paths() {
        let out = "/sbin/launchd\n/usr/sbin/sshd\n/Applications/Safari.app/Contents/MacOS/Safari\n";
        assert_eq!(parse_ps_output(out), vec!["launchd", "sshd", "Safari"]);
    }

    #[test]
    fn test_parse_ps_kernel_threads_kept_whole() {
        let out = "kworker/0:1H-events_highpri\nksoftirqd/0\n/usr/sbin/cron\n";
        assert_eq!(
            parse_ps_output(out),
            vec!["kworker/0:1H-events_highpri", "ksoftirqd/0", "cron"]
        );
    }

    #[test]
    fn test_parse_tasklist() {
        let out = concat!(
            "\r\n",
            "\"System Idle Process\",\"0\",\"Services\",\"0\",\"8 K\"\r\n",
            "\"svchost.exe\",\"912\",\"Services\",\"0\",\"21,144 K\"\r\n",
            "\"nginx.exe\",\"4410\",\"Console\",\"1\",\"9,020 K\"\r\n",
        );
        assert_eq!(
            parse_tasklist_csv(out),
            vec!["System Idle Process", "svchost.exe", "nginx.exe"]
        );
        assert_eq!(
            parse_tasklist_pids(out),
            vec![
                (0, "System Idle Process".to_string()),
                (912, "svchost.exe".to_string()),
                (4410, "nginx.exe".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_tasklist_no_match_message() {
        let out = "INFO: No tasks are running which match the specified criteria.\r\n";
        assert!(parse_tasklist_csv(out).is_empty());
        assert!(parse_tasklist_pids(out).is_empty());
    }
}
