use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::MoonError;
use crate::fetcher::Transport;
use crate::interrupt::Cancellation;
use crate::models::{ImageQuality, ImageRecord, LocalHour};

pub const CHUNK_SIZE: usize = 8 * 1024;

/// `{dir}/{date}T{HH}L.{ext}`; the `L` marks a local hour.
pub fn image_path(dir: &Path, date: NaiveDate, hour: LocalHour, quality: ImageQuality) -> PathBuf {
    dir.join(format!(
        "{}T{hour}L.{}",
        date.format("%Y-%m-%d"),
        quality.extension()
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub written: u64,
    pub total: Option<u64>,
}

impl Progress {
    pub fn percent(&self) -> Option<u64> {
        self.total
            .filter(|total| *total > 0)
            .map(|total| (self.written.saturating_mul(100) / total).min(100))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { bytes: u64 },
    /// The server answered but not with a 2xx; nothing was written.
    Empty { status: u16 },
}

/// Streams images to disk.
pub struct ImageFetcher<'a, T: Transport> {
    transport: &'a T,
    cancellation: Cancellation,
}

impl<'a, T: Transport> ImageFetcher<'a, T> {
    pub fn new(transport: &'a T, cancellation: Cancellation) -> Self {
        Self {
            transport,
            cancellation,
        }
    }

    pub fn fetch(
        &self,
        record: &ImageRecord,
        on_progress: &mut dyn FnMut(Progress),
    ) -> Result<SaveOutcome, MoonError> {
        let response = self.transport.get(&record.url)?;
        if !response.is_success() {
            warn!(status = response.status, url = %record.url, "image request failed");
            return Ok(SaveOutcome::Empty {
                status: response.status,
            });
        }

        if let Some(parent) = record.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MoonError::io(format!("creating {}", parent.display()), e))?;
        }

        let partial = partial_path(&record.path);
        let result = self.stream(response.body, response.content_length, &partial, on_progress);
        match result {
            Ok(bytes) => {
                fs::rename(&partial, &record.path).map_err(|e| {
                    let _ = fs::remove_file(&partial);
                    MoonError::io(format!("moving image to {}", record.path.display()), e)
                })?;
                debug!(path = %record.path.display(), bytes, "image saved");
                Ok(SaveOutcome::Saved { bytes })
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e)
            }
        }
    }

    fn stream(
        &self,
        mut body: Box<dyn Read>,
        total: Option<u64>,
        partial: &Path,
        on_progress: &mut dyn FnMut(Progress),
    ) -> Result<u64, MoonError> {
        let mut file = File::create(partial)
            .map_err(|e| MoonError::io(format!("creating {}", partial.display()), e))?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;

        loop {
            if self.cancellation.is_cancelled() {
                return Err(MoonError::Cancelled);
            }
            let n = match body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(MoonError::EndpointUnavailable(format!("download interrupted: {e}"))),
            };
            file.write_all(&buf[..n])
                .map_err(|e| MoonError::io(format!("writing {}", partial.display()), e))?;
            written += n as u64;
            on_progress(Progress { written, total });
        }

        file.flush()
            .map_err(|e| MoonError::io(format!("writing {}", partial.display()), e))?;
        Ok(written)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
