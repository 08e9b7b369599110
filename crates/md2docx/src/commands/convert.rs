//! `convert` command implementation.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use md2docx_compiler::Converter;
use md2docx_storage::FsStore;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Entry markdown document.
    entry: PathBuf,

    /// Output `.docx` file.
    #[arg(short, long)]
    output: PathBuf,

    /// Kroki server URL for Mermaid diagrams (overrides `diagrams.krokiUrl`).
    #[arg(long, env = "KROKI_ENDPOINT")]
    kroki_url: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry path is invalid, conversion fails, or
    /// the output cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (name, cwd) = entry_location(&self.entry)?;

        output.info(&format!("Converting {}...", self.entry.display()));

        let store = FsStore::new();
        let bytes = Converter::new(&store)
            .kroki_url(self.kroki_url)
            .convert_to_bytes(name, cwd)?;

        if let Some(parent) = self.output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.output, &bytes)?;

        output.success(&format!(
            "Wrote {} ({} bytes)",
            self.output.display(),
            bytes.len()
        ));
        Ok(())
    }
}

/// Split the entry path into the document name and its directory.
///
/// The directory is the project root: `.docx.toml` and relative embeds are
/// resolved against it.
fn entry_location(entry: &Path) -> Result<(&str, &Path), CliError> {
    let name = entry
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| CliError::Validation(format!("Invalid entry path: {}", entry.display())))?;
    let cwd = entry
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((name, cwd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entry_location() {
        assert_eq!(
            entry_location(Path::new("docs/guide/index.md")).unwrap(),
            ("index.md", Path::new("docs/guide"))
        );
        assert_eq!(
            entry_location(Path::new("index.md")).unwrap(),
            ("index.md", Path::new("."))
        );
    }

    #[test]
    fn test_entry_location_rejects_directory_paths() {
        assert!(matches!(
            entry_location(Path::new("..")),
            Err(CliError::Validation(_))
        ));
    }

    #[test]
    fn test_execute_writes_docx() {
        let temp = tempfile::tempdir().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("index.md"), "# Guide\n\nHello.\n").unwrap();
        let target = temp.path().join("out/guide.docx");

        let args = ConvertArgs {
            entry: docs.join("index.md"),
            output: target.clone(),
            kroki_url: None,
            verbose: false,
        };
        args.execute().unwrap();

        let bytes = fs::read(&target).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_execute_reports_missing_entry() {
        let temp = tempfile::tempdir().unwrap();

        let args = ConvertArgs {
            entry: temp.path().join("missing.md"),
            output: temp.path().join("out.docx"),
            kroki_url: None,
            verbose: false,
        };

        assert!(matches!(args.execute(), Err(CliError::Compile(_))));
        assert!(!temp.path().join("out.docx").exists());
    }
}
