// Solution document persistence

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{OptimizerError, Result};

/// Write `document` as pretty-printed JSON; the path must carry a `.json` extension
pub fn write_solution<T: Serialize>(document: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return Err(OptimizerError::config(format!(
            "solution file must be a JSON file (e.g. 'solution.json'), got '{}'",
            path.display()
        )));
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(path = %path.display(), "wrote solution");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Doc {
        status: &'static str,
        value: f64,
    }

    #[test]
    fn writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.json");
        write_solution(&Doc { status: "OPTIMAL", value: 4.5 }, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["status"], "OPTIMAL");
        assert_eq!(written["value"], 4.5);
    }

    #[test]
    fn rejects_non_json_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.txt");
        let err = write_solution(&Doc { status: "OPTIMAL", value: 0.0 }, &path).unwrap_err();
        assert!(matches!(err, OptimizerError::Config(_)));
        assert!(!path.exists());
    }
}
