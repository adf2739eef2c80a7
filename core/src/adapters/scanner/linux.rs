//! Linux port scanner using `ss` and `ps`.

use std::collections::HashMap;
use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::domain::PortInfo;
use crate::error::{Error, Result};

use super::utils::{decode_output, finalize, parse_address, truncate_command};
use super::Scanner;

/// One `("name",pid=N,fd=M)` owner inside the ss process column.
const SS_OWNER_PATTERN: &str = r#"\("((?:[^"\\]|\\.)*)",pid=(\d+),fd=(\d+)\)"#;

/// Linux-specific port scanner.
pub struct LinuxScanner;

#[derive(Debug, Clone)]
struct ProcessDetails {
    user: String,
    command: String,
}

impl LinuxScanner {
    pub fn new() -> Self {
        Self
    }

    /// Owner and command line for every process.
    ///
    /// Executes: `ps -axo pid,user,args --no-headers`. Failures leave the map
    /// empty; rows then fall back to the short process name.
    async fn process_details(&self) -> HashMap<u32, ProcessDetails> {
        let output = match Command::new("ps")
            .args(["-axo", "pid,user,args", "--no-headers"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "ps unavailable, continuing without process details");
                return HashMap::new();
            }
        };

        parse_ps_output(&decode_output(&output.stdout))
    }
}

fn parse_ps_output(output: &str) -> HashMap<u32, ProcessDetails> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let pid: u32 = parts.next()?.parse().ok()?;
            let user = parts.next()?.to_string();
            let command = parts.collect::<Vec<_>>().join(" ");
            Some((
                pid,
                ProcessDetails {
                    user,
                    command: truncate_command(&command),
                },
            ))
        })
        .collect()
}

/// Parse `ss -Htulnp` output.
///
/// ```text
/// tcp   LISTEN 0  4096  127.0.0.1:5432  0.0.0.0:*  users:(("postgres",pid=812,fd=7))
/// udp   UNCONN 0  0     0.0.0.0:5353    0.0.0.0:*  users:(("avahi-daemon",pid=640,fd=12))
/// ```
///
/// A socket shared by several processes yields one row per owner. Sockets
/// without a visible owner (other users' processes when not root) are skipped.
fn parse_ss_output(
    output: &str,
    owner_re: &Regex,
    details: &HashMap<u32, ProcessDetails>,
) -> Vec<PortInfo> {
    let mut rows = Vec::new();

    for line in output.lines() {
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 7 {
            trace!(line = line, "Skipping ss row without process column");
            continue;
        }

        let Some((address, port)) = parse_address(columns[4]) else {
            continue;
        };

        let process_column = columns[6..].join(" ");
        for caps in owner_re.captures_iter(&process_column) {
            let Ok(pid) = caps[2].parse::<u32>() else {
                continue;
            };
            let name = caps[1].to_string();
            let (user, command) = match details.get(&pid) {
                Some(d) => (d.user.clone(), d.command.clone()),
                None => ("-".to_string(), name.clone()),
            };

            rows.push(PortInfo::active(
                port,
                pid,
                name,
                address.clone(),
                user,
                command,
                caps[3].to_string(),
            ));
        }
    }

    finalize(rows)
}

impl Default for LinuxScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for LinuxScanner {
    /// Executes: `ss -Htulnp`
    ///
    /// -H no header, -t TCP, -u UDP, -l listening/bound, -n numeric, -p processes.
    async fn scan(&self) -> Result<Vec<PortInfo>> {
        let output = Command::new("ss")
            .args(["-Htulnp"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run ss: {}", e)))?;

        if !output.status.success() {
            return Err(Error::CommandFailed(format!(
                "ss exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = decode_output(&output.stdout);

        let owner_re = Regex::new(SS_OWNER_PATTERN)
            .map_err(|e| Error::ParseError(format!("Invalid ss owner pattern: {}", e)))?;
        let details = self.process_details().await;

        Ok(parse_ss_output(&stdout, &owner_re, &details))
    }
}
