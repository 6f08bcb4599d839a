//! # Generation Session
//!
//! [`Generator`] wraps one render run: it rejects overlapping runs, keeps an
//! in-progress flag that is always cleared, reports a terminal status and
//! writes the output file atomically.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{FolhaError, Result};
use crate::model::{FormDocument, TestimonyForm, OUTPUT_FILE_NAME};

pub const SUCCESS_MESSAGE: &str = "PDF gerado com sucesso!";
pub const FAILURE_MESSAGE: &str = "Erro ao gerar PDF. Verifique o console para mais detalhes.";

/// Terminal status of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Success,
    Failure,
}

impl GenerationStatus {
    /// The message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            GenerationStatus::Success => SUCCESS_MESSAGE,
            GenerationStatus::Failure => FAILURE_MESSAGE,
        }
    }
}

#[derive(Debug, Default)]
pub struct Generator {
    in_progress: AtomicBool,
    last_status: Mutex<Option<GenerationStatus>>,
}

/// Clears the in-progress flag on drop, including during unwinding.
struct InProgressGuard<'a>(&'a AtomicBool);

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn last_status(&self) -> Option<GenerationStatus> {
        self.last_status.lock().map(|s| *s).unwrap_or(None)
    }

    pub fn last_message(&self) -> Option<&'static str> {
        self.last_status().map(|s| s.message())
    }

    /// Render `form` to PDF bytes.
    ///
    /// Returns [`FolhaError::Busy`] without touching the running generation
    /// when another run is in flight.
    pub fn generate(&self, form: &TestimonyForm) -> Result<Vec<u8>> {
        self.run(|| crate::render(form))
    }

    /// Render `form` and write it to `dir/Folha_de_Testemunho.pdf`.
    ///
    /// The document is rendered fully in memory, written to a temporary file
    /// next to the target and renamed into place, so a failed run leaves no
    /// file behind.
    pub fn generate_to(&self, form: &TestimonyForm, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(OUTPUT_FILE_NAME);
        self.generate_to_path(form, &target)?;
        Ok(target)
    }

    /// Like [`Generator::generate_to`] with an explicit output path.
    pub fn generate_to_path(&self, form: &TestimonyForm, target: &Path) -> Result<()> {
        self.run(|| render_to(form, target))
    }

    /// Resolve the images of a parsed JSON form and write the PDF to
    /// `target`. Loading failures count as a failed run.
    pub fn generate_document_to_path(&self, document: FormDocument, target: &Path) -> Result<()> {
        self.run(|| render_to(&document.load()?, target))
    }

    fn run<T>(&self, job: impl FnOnce() -> Result<T>) -> Result<T> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Generation already in progress; ignoring trigger");
            return Err(FolhaError::Busy);
        }
        let _guard = InProgressGuard(&self.in_progress);

        let result = job();
        let status = match &result {
            Ok(_) => GenerationStatus::Success,
            Err(e) => {
                log::error!("Erro ao gerar PDF: {}", e);
                GenerationStatus::Failure
            }
        };
        if let Ok(mut last) = self.last_status.lock() {
            *last = Some(status);
        }
        result
    }
}

fn render_to(form: &TestimonyForm, target: &Path) -> Result<()> {
    let bytes = crate::render(form)?;
    write_atomically(target, &bytes)?;
    log::info!("Wrote {} bytes to {}", bytes.len(), target.display());
    Ok(())
}

fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = target.with_extension("pdf.part");
    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, target)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
