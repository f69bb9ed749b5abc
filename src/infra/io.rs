//! File and stdio helpers for the CLI. A path of `-` means stdin/stdout.

use std::path::Path;

use serde_json::Value;
use tokio::{
    fs,
    io::{self, AsyncReadExt, AsyncWriteExt},
};

use super::error::InfraError;

const STDIO_MARKER: &str = "-";

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_MARKER
}

/// Read UTF-8 text from a file, or from stdin when `path` is `-`.
pub async fn read_text(path: &Path) -> Result<String, InfraError> {
    if is_stdio(path) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).await?;
        return Ok(buffer);
    }

    Ok(fs::read_to_string(path).await?)
}

pub async fn read_json(path: &Path) -> Result<Value, InfraError> {
    let raw = read_text(path).await?;
    let origin = if is_stdio(path) {
        "stdin".to_string()
    } else {
        path.display().to_string()
    };
    serde_json::from_str(&raw).map_err(|err| InfraError::json(origin, err))
}

/// Write `text` verbatim to `path`, or to stdout when no path (or `-`) is given.
pub async fn write_text(path: Option<&Path>, text: &str) -> Result<(), InfraError> {
    match path {
        Some(path) if !is_stdio(path) => {
            fs::write(path, text).await?;
        }
        _ => {
            let mut stdout = io::stdout();
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
