//! Port list expressions such as `"22,80,8000-8100"`.

use std::collections::BTreeSet;

/// Parses a port expression into a sorted, duplicate-free list.
///
/// Port `0` and numbers above 65535 are rejected.
pub fn parse_port_list(expr: &str) -> Result<Vec<u16>, String> {
    let mut ports: BTreeSet<u16> = BTreeSet::new();

    for part in expr.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_port(start)?;
                let end = parse_port(end)?;
                if start > end {
                    return Err(format!("port range '{part}' is reversed"));
                }
                ports.extend(start..=end);
            }
            None => {
                ports.insert(parse_port(part)?);
            }
        }
    }

    if ports.is_empty() {
        return Err(format!("port list '{expr}' is empty"));
    }

    Ok(ports.into_iter().collect())
}

fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid port '{s}': {e}"))?;
    if port == 0 {
        return Err("port 0 is not scannable".to_string());
    }
    Ok(port)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
