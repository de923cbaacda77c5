use chrono::{DateTime, Local};
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions whose contents are taken as-is.
pub const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

pub const MAX_FILE_BYTES: u64 = 3 * 1024 * 1024;
pub const MAX_TOTAL_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SubjectError {
    #[error("subject name must not be empty")]
    EmptyName,

    #[error("a subject needs at least one file")]
    NoFiles,

    #[error("unsupported file {0}, only .txt and .md can be read")]
    UnsupportedFile(String),

    #[error("{filename} is {size} bytes, files may be at most {limit} bytes")]
    FileTooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },

    #[error("files add up to {size} bytes, a subject may hold at most {limit} bytes")]
    TotalTooLarge { size: u64, limit: u64 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed subject file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Extracted text of one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub text: String,
    pub uploaded_at: DateTime<Local>,
}

/// Named collection of study documents that quizzes are generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Local>,
    pub documents: Vec<Document>,
}

impl Subject {
    pub fn from_files<P: AsRef<Path>>(name: &str, paths: &[P]) -> Result<Self, SubjectError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SubjectError::EmptyName);
        }
        if paths.is_empty() {
            return Err(SubjectError::NoFiles);
        }

        // sizes come from metadata so oversized files are never read
        let mut total = 0;
        for p in paths {
            total += check_file(p.as_ref())?;
        }
        if total > MAX_TOTAL_BYTES {
            return Err(SubjectError::TotalTooLarge {
                size: total,
                limit: MAX_TOTAL_BYTES,
            });
        }

        let now = Local::now();
        let documents = paths
            .iter()
            .map(|p| read_document(p.as_ref(), now))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: new_id(now),
            name: name.to_string(),
            created_at: now,
            documents,
        })
    }

    pub fn file_count(&self) -> usize {
        self.documents.len()
    }
}

fn new_id(now: DateTime<Local>) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}-{:08x}", now.format("%Y%m%d%H%M%S"), suffix)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extension and size checks, returning the file size.
fn check_file(path: &Path) -> Result<u64, SubjectError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(SubjectError::UnsupportedFile(file_name(path)));
    }

    let size = fs::metadata(path)
        .map_err(|source| SubjectError::Io {
            path: path.display().to_string(),
            source,
        })?
        .len();
    if size > MAX_FILE_BYTES {
        return Err(SubjectError::FileTooLarge {
            filename: file_name(path),
            size,
            limit: MAX_FILE_BYTES,
        });
    }

    Ok(size)
}

fn read_document(path: &Path, uploaded_at: DateTime<Local>) -> Result<Document, SubjectError> {
    let bytes = fs::read(path).map_err(|source| SubjectError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(Document {
        id: new_id(uploaded_at),
        filename: file_name(path),
        text: decode_text(bytes),
        uploaded_at,
    })
}

/// UTF-8, falling back to Latin-1 for anything else.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

/// Directory of `<id>.json` subject files
#[derive(Debug, Clone)]
pub struct SubjectStore {
    dir: PathBuf,
}

impl SubjectStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, subject: &Subject) -> Result<PathBuf, SubjectError> {
        fs::create_dir_all(&self.dir).map_err(|source| SubjectError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        let path = self.dir.join(format!("{}.json", subject.id));
        let data = serde_json::to_vec_pretty(subject)?;
        fs::write(&path, data).map_err(|source| SubjectError::Io {
            path: path.display().to_string(),
            source,
        })?;

        info!(
            "saved subject {} ({} files) to {}",
            subject.name,
            subject.file_count(),
            path.display()
        );
        Ok(path)
    }

    /// All readable subjects, newest first.
    pub fn list(&self) -> Vec<Subject> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut subjects: Vec<Subject> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| match fs::read(&p) {
                Ok(bytes) => match serde_json::from_slice::<Subject>(&bytes) {
                    Ok(s) => Some(s),
                    Err(e) => {
                        warn!("skipping subject file {}: {}", p.display(), e);
                        None
                    }
                },
                Err(e) => {
                    warn!("cannot read subject file {}: {}", p.display(), e);
                    None
                }
            })
            .collect();

        subjects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        subjects
    }
}
