// Location: mt5-relay/src/adapters/infrastructure/config_patcher.rs
// Purpose: Minimal, idempotent edits of the terminal's common.ini
// Why: Credentials and the algo-trading switch must be in place before the
//      terminal starts; everything else in the file is left byte-for-byte.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::models::Credentials;

const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

const EXPERTS_SECTION: &str = "Experts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextEncoding {
    Utf8 { bom: bool },
    Utf16Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Rewritten,
    /// Nothing to change; the file was not touched
    Unchanged,
}

/// Patch every existing location. Failures are logged and the location
/// skipped. Returns the number of files rewritten.
pub fn patch(locations: &[PathBuf], credentials: &Credentials) -> usize {
    let mut rewritten = 0;
    for path in locations {
        if !path.is_file() {
            tracing::debug!("Config file not present, skipping: {:?}", path);
            continue;
        }
        match patch_file(path, credentials) {
            Ok(PatchOutcome::Rewritten) => {
                rewritten += 1;
                tracing::info!(
                    path = %path.display(),
                    login = ?credentials.login,
                    server = ?credentials.server,
                    "Prepared terminal config (experts enabled)"
                );
            }
            Ok(PatchOutcome::Unchanged) => {
                tracing::debug!("Terminal config already up to date: {:?}", path);
            }
            Err(e) => {
                tracing::warn!("Could not prepare {:?}: {:#}", path, e);
            }
        }
    }
    rewritten
}

/// Patch one file in place, keeping its encoding
pub fn patch_file(path: &Path, credentials: &Credentials) -> Result<PatchOutcome> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let (text, encoding) = decode(&raw)?;

    let patched = patch_text(&text, credentials);
    if patched == text {
        return Ok(PatchOutcome::Unchanged);
    }

    fs::write(path, encode(&patched, encoding))
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(PatchOutcome::Rewritten)
}

/// Apply the credential and experts edits to INI text.
///
/// - every line starting with `Login=` / `Server=` gets the new value
/// - the first `Enabled=0` inside `[Experts]` becomes `Enabled=1`
///
/// Line endings are kept per line.
pub fn patch_text(text: &str, credentials: &Credentials) -> String {
    let login = credentials.login.map(|l| l.to_string());
    let server = credentials.server.as_deref();

    let mut out = String::with_capacity(text.len() + 16);
    let mut in_experts = false;
    let mut experts_flipped = false;

    for raw_line in text.split_inclusive('\n') {
        let (line, ending) = split_line_ending(raw_line);

        if let Some(section) = section_name(line) {
            in_experts = section == EXPERTS_SECTION;
            out.push_str(raw_line);
            continue;
        }

        match (login.as_deref(), server) {
            (Some(login), _) if line.starts_with("Login=") => {
                out.push_str("Login=");
                out.push_str(login);
                out.push_str(ending);
                continue;
            }
            (_, Some(server)) if line.starts_with("Server=") => {
                out.push_str("Server=");
                out.push_str(server);
                out.push_str(ending);
                continue;
            }
            _ => {}
        }

        if in_experts && !experts_flipped {
            if let Some(value) = line.strip_prefix("Enabled=") {
                if value.trim() == "0" {
                    experts_flipped = true;
                    out.push_str("Enabled=1");
                    out.push_str(ending);
                    continue;
                }
            }
        }

        out.push_str(raw_line);
    }

    out
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

fn section_name(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

fn decode(raw: &[u8]) -> Result<(String, TextEncoding)> {
    if let Some(body) = raw.strip_prefix(&UTF16LE_BOM) {
        if body.len() % 2 != 0 {
            bail!("truncated UTF-16 text ({} bytes)", raw.len());
        }
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .collect();
        let text = String::from_utf16(&units).context("invalid UTF-16 text")?;
        return Ok((text, TextEncoding::Utf16Le));
    }

    let (body, bom) = match raw.strip_prefix(&UTF8_BOM) {
        Some(body) => (body, true),
        None => (raw, false),
    };
    match std::str::from_utf8(body) {
        Ok(text) => Ok((text.to_string(), TextEncoding::Utf8 { bom })),
        Err(_) => bail!("file is neither UTF-16LE with BOM nor UTF-8"),
    }
}

fn encode(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Utf16Le => {
            let mut out = Vec::with_capacity(2 + text.len() * 2);
            out.extend_from_slice(&UTF16LE_BOM);
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
            out
        }
        TextEncoding::Utf8 { bom } => {
            let mut out = Vec::with_capacity(3 + text.len());
            if bom {
                out.extend_from_slice(&UTF8_BOM);
            }
            out.extend_from_slice(text.as_bytes());
            out
        }
    }
}
