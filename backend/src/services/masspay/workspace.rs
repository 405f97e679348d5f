//! Per-request scratch space on disk.
//!
//! Every upload gets `<temp_root>/<YYYYMMDD-HHMMSS>-<random>/` with an `input/`
//! and an `output/` directory. The tree is deleted when the workspace is
//! dropped, so any early return removes it; `keep` hands the directory over to
//! external cleanup once the artifact has been produced.

use chrono::Local;
use log::info;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const INPUT_DIR: &str = "input";
const OUTPUT_DIR: &str = "output";

pub struct RequestWorkspace {
    dir: TempDir,
}

impl RequestWorkspace {
    pub fn create(temp_root: &Path) -> io::Result<Self> {
        fs::create_dir_all(temp_root)?;
        let prefix = format!("{}-", Local::now().format("%Y%m%d-%H%M%S"));
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir_in(temp_root)?;

        for sub in [INPUT_DIR, OUTPUT_DIR] {
            let path = dir.path().join(sub);
            fs::create_dir(&path)?;
            info!("Created directory: {}", path.display());
        }

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(INPUT_DIR).join(file_name)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(OUTPUT_DIR).join(file_name)
    }

    /// Writes the uploaded bytes to `input/<file_name>` and syncs them to disk.
    pub fn persist_input(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.input_path(file_name);
        let mut file = File::create(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(path)
    }

    /// Stops automatic removal and returns the directory path.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}
