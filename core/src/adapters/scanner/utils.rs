//! Parsing helpers shared by the platform scanners.

use std::collections::HashSet;

use crate::domain::PortInfo;

/// Commands longer than this are cut and suffixed with "...".
pub const MAX_COMMAND_LEN: usize = 200;

/// Split a socket name into address and port.
///
/// Handles `127.0.0.1:3000`, `*:8080`, `[::1]:3000`, `[fe80::1%en0]:5353` and
/// `fe80::1%lo0:22`. Interface scope suffixes are dropped and an empty
/// address becomes `*`.
pub fn parse_address(name: &str) -> Option<(String, u16)> {
    let (addr, port) = if name.starts_with('[') {
        let bracket_end = name.find(']')?;
        let port = name[bracket_end + 1..].strip_prefix(':')?;
        (&name[..=bracket_end], port)
    } else {
        name.rsplit_once(':')?
    };

    let port: u16 = port.parse().ok()?;
    if port == 0 {
        return None;
    }

    let addr = match addr.find('%') {
        Some(i) if addr.ends_with(']') => format!("{}]", &addr[..i]),
        Some(i) => addr[..i].to_string(),
        None => addr.to_string(),
    };
    let addr = if addr.is_empty() { "*".to_string() } else { addr };
    Some((addr, port))
}

/// Decode command output. Invalid UTF-8 (odd process names) becomes U+FFFD
/// instead of failing the whole scan.
pub fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Truncate a command line to [`MAX_COMMAND_LEN`] characters.
pub fn truncate_command(command: &str) -> String {
    match command.char_indices().nth(MAX_COMMAND_LEN) {
        Some((idx, _)) => format!("{}...", &command[..idx]),
        None => command.to_string(),
    }
}

/// Drop repeated (port, pid) rows and order by port, then pid.
pub fn finalize(rows: Vec<PortInfo>) -> Vec<PortInfo> {
    let mut seen: HashSet<(u16, u32)> = HashSet::new();
    let mut ports: Vec<PortInfo> = rows
        .into_iter()
        .filter(|p| seen.insert((p.port, p.pid)))
        .collect();
    ports.sort_by_key(|p| (p.port, p.pid));
    ports
}
