//! External document-format conversion.
//!
//! Office-format templates become PDFs through a headless LibreOffice
//! process. Conversions run under a fixed-size permit pool so concurrent
//! render calls cannot fork an unbounded number of office processes, and
//! each invocation gets its own scoped temp directory and a hard deadline.

use crate::error::RenderError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// The conversion collaborator consumed by the renderer. Implementations
/// signal failure through the result; a conversion failure is terminal for
/// the render call that needed it.
pub trait DocumentConverter: Send + Sync {
    fn convert_to_pdf(&self, input: &Path, output: &Path) -> Result<(), RenderError>;
}

const DEFAULT_WORKERS: usize = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fixed-size permit pool. Acquiring blocks until a slot frees up; the guard
/// releases its slot on drop, on every exit path.
struct PermitPool {
    available: Mutex<usize>,
    freed: Condvar,
}

struct Permit<'a> {
    pool: &'a PermitPool,
}

impl PermitPool {
    fn new(slots: usize) -> Self {
        Self { available: Mutex::new(slots.max(1)), freed: Condvar::new() }
    }

    fn acquire(&self) -> Permit<'_> {
        let mut available = self
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *available == 0 {
            available = self
                .freed
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;
        Permit { pool: self }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut available = self
            .pool
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *available += 1;
        self.pool.freed.notify_one();
    }
}

/// LibreOffice-backed converter.
pub struct SofficeConverter {
    binary: PathBuf,
    pool: PermitPool,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            pool: PermitPool::new(DEFAULT_WORKERS),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Locates `soffice` on the PATH or in the usual install locations.
    pub fn discover() -> Result<Self, RenderError> {
        find_soffice()
            .map(Self::new)
            .ok_or_else(|| RenderError::Conversion("soffice binary not found on PATH".into()))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.pool = PermitPool::new(workers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl DocumentConverter for SofficeConverter {
    fn convert_to_pdf(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
        let _permit = self.pool.acquire();
        let workdir = tempfile::tempdir()?;

        let mut child = Command::new(&self.binary)
            .args(["--headless", "--norestore", "--nolockcheck", "--nodefault"])
            .args(["--convert-to", "pdf", "--outdir"])
            .arg(workdir.path())
            .arg(input)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RenderError::Conversion(format!("failed to start soffice: {}", e)))?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RenderError::Conversion(format!(
                        "soffice timed out after {:?}",
                        self.timeout
                    )));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(RenderError::Conversion(format!(
                        "failed waiting for soffice: {}",
                        e
                    )));
                }
            }
        };
        if !status.success() {
            return Err(RenderError::Conversion(format!(
                "soffice exited with {}",
                status
            )));
        }

        let produced = find_produced_pdf(workdir.path(), input).ok_or_else(|| {
            RenderError::Conversion("soffice produced no PDF output".into())
        })?;
        std::fs::copy(produced, output)?;
        Ok(())
    }
}

/// The converted file keeps the input's stem; if it does not, take whatever
/// single PDF the process left behind.
fn find_produced_pdf(outdir: &Path, input: &Path) -> Option<PathBuf> {
    if let Some(stem) = input.file_stem() {
        let expected = outdir.join(format!("{}.pdf", stem.to_string_lossy()));
        if expected.is_file() {
            return Some(expected);
        }
    }
    std::fs::read_dir(outdir).ok()?.find_map(|entry| {
        let path = entry.ok()?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        (is_pdf && path.is_file()).then_some(path)
    })
}

fn find_soffice() -> Option<PathBuf> {
    let fixed = [
        "/usr/bin/soffice",
        "/usr/local/bin/soffice",
        "/opt/libreoffice/program/soffice",
    ];
    for candidate in fixed {
        let path = Path::new(candidate);
        if path.is_file() {
            return Some(path.to_path_buf());
        }
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("soffice"))
        .find(|candidate| candidate.is_file())
}
