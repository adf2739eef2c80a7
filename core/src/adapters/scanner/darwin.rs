//! macOS port scanner using `lsof` and `ps`.

use std::collections::HashMap;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::domain::PortInfo;
use crate::error::{Error, Result};

use super::utils::{decode_output, finalize, parse_address, truncate_command};
use super::Scanner;

/// macOS-specific port scanner.
pub struct DarwinScanner;

impl DarwinScanner {
    pub fn new() -> Self {
        Self
    }

    /// Full command line for every process (`ps -axo pid,command`).
    async fn process_commands(&self) -> HashMap<u32, String> {
        let output = match Command::new("/bin/ps")
            .args(["-axo", "pid,command"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "ps unavailable, continuing without commands");
                return HashMap::new();
            }
        };

        parse_ps_output(&decode_output(&output.stdout))
    }

    /// Run lsof with `args`. Exit status 1 with no output means "no matches".
    async fn lsof(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("/usr/sbin/lsof")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run lsof: {}", e)))?;

        let stdout = decode_output(&output.stdout);

        if !output.status.success() && !(output.status.code() == Some(1) && stdout.is_empty()) {
            return Err(Error::CommandFailed(format!(
                "lsof exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(stdout)
    }
}

fn parse_ps_output(output: &str) -> HashMap<u32, String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let (pid, command) = line.trim().split_once(char::is_whitespace)?;
            let pid: u32 = pid.parse().ok()?;
            Some((pid, truncate_command(command.trim())))
        })
        .collect()
}

/// lsof escapes spaces and slashes in command names.
fn unescape_name(name: &str) -> String {
    name.replace("\\x20", " ").replace("\\x2f", "/")
}

/// Parse lsof output.
///
/// ```text
/// COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
/// node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
/// mDNSResp   412  root   12u  IPv4 0x3d8015e195af1a2b      0t0  UDP *:5353
/// ```
///
/// Connected UDP sockets (`a:1->b:2`) are not listeners and are skipped.
fn parse_lsof_output(output: &str, commands: &HashMap<u32, String>) -> Vec<PortInfo> {
    let mut rows = Vec::new();

    for line in output.lines().skip(1) {
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 9 {
            continue;
        }

        let process_name = unescape_name(columns[0]);
        let Ok(pid) = columns[1].parse::<u32>() else {
            continue;
        };

        let Some(name) = columns[8..]
            .iter()
            .rev()
            .find(|c| c.contains(':') && !c.starts_with("0x") && !c.starts_with("0t"))
        else {
            continue;
        };
        if name.contains("->") {
            continue;
        }
        let Some((address, port)) = parse_address(name) else {
            continue;
        };

        let command = commands
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| process_name.clone());

        rows.push(PortInfo::active(
            port,
            pid,
            process_name,
            address,
            columns[2],
            command,
            columns[3],
        ));
    }

    rows
}

impl Default for DarwinScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for DarwinScanner {
    /// Executes `lsof -iTCP -sTCP:LISTEN -P -n +c 0` and `lsof -iUDP -P -n +c 0`.
    ///
    /// -P numeric ports, -n numeric hosts, +c 0 full command names.
    async fn scan(&self) -> Result<Vec<PortInfo>> {
        let tcp = self
            .lsof(&["-iTCP", "-sTCP:LISTEN", "-P", "-n", "+c", "0"])
            .await?;
        let udp = self.lsof(&["-iUDP", "-P", "-n", "+c", "0"]).await?;
        let commands = self.process_commands().await;

        let mut rows = parse_lsof_output(&tcp, &commands);
        rows.extend(parse_lsof_output(&udp, &commands));
        Ok(finalize(rows))
    }
}
