//! Documents on disk, one Markdown file per document.
//!
//! ```text
//! <root>/services/<id>.md
//! <root>/use-cases/<id>.md
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use docgraph_codec::{CodecError, MarkdownSchema, from_markdown, to_markdown};
use relative_path::RelativePathBuf;
use uuid::Uuid;

use crate::model::{DocGraph, Service, UseCase};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid document {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("Document {path} declares id {found}, expected {expected}")]
    IdMismatch {
        path: PathBuf,
        expected: Uuid,
        found: Uuid,
    },
    #[error("Invalid documents directory: {0}")]
    InvalidRoot(PathBuf),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A document type with its own directory under the store root.
pub trait StoredDocument: MarkdownSchema {
    const DIR: &'static str;

    fn id(&self) -> Uuid;
}

impl StoredDocument for Service {
    const DIR: &'static str = "services";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl StoredDocument for UseCase {
    const DIR: &'static str = "use-cases";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Outcome of [`DocumentStore::reformat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reformat {
    Unchanged,
    Rewritten,
}

#[derive(Debug)]
pub struct DocumentStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl DocumentStore {
    /// Opens a store over an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::InvalidRoot(root));
        }
        log::debug!("opened document store at {}", root.display());
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative_path<D: StoredDocument>(id: Uuid) -> RelativePathBuf {
        RelativePathBuf::from(D::DIR).join(format!("{id}.md"))
    }

    pub fn path_of<D: StoredDocument>(&self, id: Uuid) -> PathBuf {
        Self::relative_path::<D>(id).to_path(&self.root)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes `document`, replacing any previous version. Returns its path.
    pub fn save<D: StoredDocument>(&self, document: &D) -> Result<PathBuf> {
        let path = self.path_of::<D>(document.id());
        let text = to_markdown(document).map_err(|source| StoreError::Codec {
            path: path.clone(),
            source,
        })?;

        let _guard = self.guard();
        write_document(&path, &text)?;
        log::debug!("saved {}", path.display());
        Ok(path)
    }

    pub fn load<D: StoredDocument>(&self, id: Uuid) -> Result<D> {
        let path = self.path_of::<D>(id);
        let text = {
            let _guard = self.guard();
            read_document(&path)?
        };
        let document = parse::<D>(&path, &text)?;
        if document.id() != id {
            return Err(StoreError::IdMismatch {
                path,
                expected: id,
                found: document.id(),
            });
        }
        Ok(document)
    }

    pub fn delete<D: StoredDocument>(&self, id: Uuid) -> Result<()> {
        let path = self.path_of::<D>(id);
        let _guard = self.guard();
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("deleted {}", path.display());
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path))
            }
            Err(err) => Err(StoreError::io(&path, err)),
        }
    }

    /// Ids of the stored documents of type `D`, sorted. Files whose name is
    /// not `<uuid>.md` are skipped.
    pub fn list_ids<D: StoredDocument>(&self) -> Result<Vec<Uuid>> {
        let dir = RelativePathBuf::from(D::DIR).to_path(&self.root);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let _guard = self.guard();
        let entries = fs::read_dir(&dir).map_err(|err| StoreError::io(&dir, err))?;
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| StoreError::io(&dir, err))?.path();
            if path.is_dir() {
                continue;
            }
            if let Some(ext) = path.extension()
                && ext == "md"
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                match Uuid::parse_str(stem) {
                    Ok(id) => ids.push(id),
                    Err(_) => log::warn!("skipping {}: file name is not an id", path.display()),
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn load_all<D: StoredDocument>(&self) -> Result<Vec<D>> {
        self.list_ids::<D>()?
            .into_iter()
            .map(|id| self.load::<D>(id))
            .collect()
    }

    pub fn load_graph(&self) -> Result<DocGraph> {
        let services = self.load_all::<Service>()?;
        let use_cases = self.load_all::<UseCase>()?;
        log::debug!(
            "loaded graph with {} services and {} use cases",
            services.len(),
            use_cases.len()
        );
        Ok(DocGraph::new(services, use_cases))
    }

    /// Whether the stored file is byte-identical to its canonical form.
    pub fn is_canonical<D: StoredDocument>(&self, id: Uuid) -> Result<bool> {
        let path = self.path_of::<D>(id);
        let _guard = self.guard();
        let (text, canonical) = canonical_text::<D>(&path)?;
        Ok(text == canonical)
    }

    /// Rewrites a stored document in canonical form if it is not already.
    pub fn reformat<D: StoredDocument>(&self, id: Uuid) -> Result<Reformat> {
        let path = self.path_of::<D>(id);
        let _guard = self.guard();

        let (text, canonical) = canonical_text::<D>(&path)?;
        if text == canonical {
            return Ok(Reformat::Unchanged);
        }

        fs::write(&path, canonical).map_err(|err| StoreError::io(&path, err))?;
        log::debug!("reformatted {}", path.display());
        Ok(Reformat::Rewritten)
    }
}

/// The file's current text and the text `save` would write for it.
fn canonical_text<D: StoredDocument>(path: &Path) -> Result<(String, String)> {
    let text = read_document(path)?;
    let document = parse::<D>(path, &text)?;
    let canonical = to_markdown(&document).map_err(|source| StoreError::Codec {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((text, format!("{canonical}\n")))
}

fn parse<D: StoredDocument>(path: &Path, text: &str) -> Result<D> {
    from_markdown::<D>(text).map_err(|source| StoreError::Codec {
        path: path.to_path_buf(),
        source,
    })
}

fn read_document(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|err| StoreError::io(path, err))
}

/// Files end with exactly one newline; the codec output has none.
fn write_document(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
    }
    fs::write(path, format!("{text}\n")).map_err(|err| StoreError::io(path, err))
}
