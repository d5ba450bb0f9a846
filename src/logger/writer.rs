//! Size-rotating file writer

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use jiff::Zoned;
use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::{FileConfig, RotationConfig};
use crate::logger::error::LoggerError;

/// File writer with size-based rotation. Falls back to stderr when the file
/// cannot be written.
#[derive(Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<WriterState>>,
    path: PathBuf,
    rotation: RotationConfig,
}

struct WriterState {
    file: BufWriter<File>,
    current_size: u64,
    fallback_mode: bool,
}

impl RotatingFileWriter {
    pub fn new(config: &FileConfig) -> Result<Self, LoggerError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            fs::metadata(&config.path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                file,
                current_size,
                fallback_mode: false,
            })),
            path: config.path.clone(),
            rotation: config.rotation.clone(),
        })
    }

    pub fn is_in_fallback_mode(&self) -> bool {
        self.state.lock().map(|s| s.fallback_mode).unwrap_or(false)
    }

    fn rotate(&self, state: &mut WriterState) -> Result<(), LoggerError> {
        state.file.flush()?;

        if self.path.exists() {
            fs::rename(&self.path, rotated_path(&self.path))?;
        }
        cleanup_rotated(&self.path, self.rotation.max_files)?;

        state.file = open_log_file(&self.path, false)?;
        state.current_size = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().write(buf);
        }

        let needs_rotation = state.current_size > 0
            && state.current_size + buf.len() as u64 > self.rotation.max_size;
        if needs_rotation {
            if let Err(e) = self.rotate(&mut state) {
                state.fallback_mode = true;
                eprintln!("[Logger] Rotation failed, falling back to stderr: {}", e);
                return io::stderr().write(buf);
            }
        }

        match state.file.write(buf) {
            Ok(written) => {
                state.current_size += written as u64;
                Ok(written)
            }
            Err(e) => {
                state.fallback_mode = true;
                eprintln!("[Logger] File write failed, falling back to stderr: {}", e);
                io::stderr().write(buf)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().flush();
        }
        state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn open_log_file(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    Ok(BufWriter::new(file))
}

fn file_parts(base_path: &Path) -> (String, String) {
    let stem = base_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let ext = base_path
        .extension()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    (stem, ext)
}

fn rotated_path(base_path: &Path) -> PathBuf {
    let timestamp = Zoned::now().strftime("%Y%m%d_%H%M%S").to_string();
    let (stem, ext) = file_parts(base_path);

    let mut attempt = 0u32;
    loop {
        let suffix = if attempt == 0 {
            timestamp.clone()
        } else {
            format!("{}-{}", timestamp, attempt)
        };
        let name = if ext.is_empty() {
            format!("{}.{}", stem, suffix)
        } else {
            format!("{}.{}.{}", stem, suffix, ext)
        };
        let candidate = base_path.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}

/// Removes the oldest rotated files beyond `max_files`.
fn cleanup_rotated(base_path: &Path, max_files: usize) -> Result<(), LoggerError> {
    let dir = match base_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let active = base_path
        .file_name()
        .ok_or_else(|| LoggerError::rotation("log path has no file name"))?;
    let (stem, _) = file_parts(base_path);
    let prefix = format!("{}.", stem);

    let mut rotated: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name().is_some_and(|name| {
                name != active && name.to_string_lossy().starts_with(&prefix)
            })
        })
        .collect();
    rotated.sort();

    let excess = rotated.len().saturating_sub(max_files);
    for path in rotated.into_iter().take(excess) {
        fs::remove_file(&path)?;
    }
    Ok(())
}
