use crate::author::AuthorProfiles;
use crate::lookup::IndexLabels;
use crate::tokenizer::TokenizerConfig;
use crate::{BookIndex, DenseMatrix, DocMeta, IdIndex, SimilarityMatrix, TitleIndex, Vocabulary};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_titles: usize,
    pub vocabulary_size: usize,
    pub num_authors: usize,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn ids(&self) -> PathBuf { self.root.join("ids.bin") }
    fn titles(&self) -> PathBuf { self.root.join("titles.bin") }
    fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    fn documents(&self) -> PathBuf { self.root.join("documents.bin") }
    fn similarities(&self) -> PathBuf { self.root.join("similarities.bin") }
    fn authors(&self) -> PathBuf { self.root.join("authors.bin") }
    fn tokenizer(&self) -> PathBuf { self.root.join("tokenizer.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn save_bin<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    bincode::serialize_into(&mut w, value)?;
    w.flush()?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value = bincode::deserialize_from(BufReader::new(f))
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(value)
}

pub fn save_docs(paths: &IndexPaths, docs: &[DocMeta]) -> Result<()> { save_bin(&paths.docs(), docs) }
pub fn load_docs(paths: &IndexPaths) -> Result<Vec<DocMeta>> { load_bin(&paths.docs()) }

pub fn save_ids(paths: &IndexPaths, ids: &IdIndex) -> Result<()> { save_bin(&paths.ids(), ids) }
pub fn load_ids(paths: &IndexPaths) -> Result<IdIndex> { load_bin(&paths.ids()) }

pub fn save_titles(paths: &IndexPaths, titles: &TitleIndex) -> Result<()> { save_bin(&paths.titles(), titles) }
pub fn load_titles(paths: &IndexPaths) -> Result<TitleIndex> { load_bin(&paths.titles()) }

pub fn save_vocabulary(paths: &IndexPaths, vocabulary: &Vocabulary) -> Result<()> { save_bin(&paths.vocabulary(), vocabulary) }
pub fn load_vocabulary(paths: &IndexPaths) -> Result<Vocabulary> { load_bin(&paths.vocabulary()) }

pub fn save_documents(paths: &IndexPaths, documents: &DenseMatrix) -> Result<()> { save_bin(&paths.documents(), documents) }
pub fn load_documents(paths: &IndexPaths) -> Result<DenseMatrix> { load_bin(&paths.documents()) }

pub fn save_similarities(paths: &IndexPaths, sims: &SimilarityMatrix) -> Result<()> { save_bin(&paths.similarities(), sims) }
pub fn load_similarities(paths: &IndexPaths) -> Result<SimilarityMatrix> { load_bin(&paths.similarities()) }

pub fn save_authors(paths: &IndexPaths, authors: &AuthorProfiles) -> Result<()> { save_bin(&paths.authors(), authors) }

/// Author profiles are optional; a missing file loads as `None`.
pub fn load_authors(paths: &IndexPaths) -> Result<Option<AuthorProfiles>> {
    let path = paths.authors();
    if !path.exists() {
        return Ok(None);
    }
    load_bin(&path).map(Some)
}

pub fn save_tokenizer(paths: &IndexPaths, config: &TokenizerConfig) -> Result<()> { save_bin(&paths.tokenizer(), config) }
pub fn load_tokenizer(paths: &IndexPaths) -> Result<TokenizerConfig> { load_bin(&paths.tokenizer()) }

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write every component of `index` under `paths.root`.
pub fn save_index(paths: &IndexPaths, index: &BookIndex) -> Result<()> {
    create_dir_all(&paths.root).with_context(|| format!("creating {}", paths.root.display()))?;
    save_docs(paths, &index.docs)?;
    save_ids(paths, &index.ids)?;
    save_titles(paths, &index.titles)?;
    save_vocabulary(paths, &index.vocabulary)?;
    save_documents(paths, &index.documents)?;
    save_similarities(paths, &index.similarities)?;
    save_tokenizer(paths, &index.tokenizer)?;
    if let Some(authors) = &index.authors {
        save_authors(paths, authors)?;
    } else if paths.authors().exists() {
        std::fs::remove_file(paths.authors())?;
    }
    let meta = MetaFile {
        num_docs: index.num_docs(),
        num_titles: index.titles.len(),
        vocabulary_size: index.vocabulary.len(),
        num_authors: index.authors.as_ref().map_or(0, |a| a.index.len()),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)
}

pub fn load_index(paths: &IndexPaths) -> Result<BookIndex> {
    let meta = load_meta(paths)?;
    anyhow::ensure!(meta.version == FORMAT_VERSION, "unsupported index version {}", meta.version);
    let index = BookIndex {
        docs: load_docs(paths)?,
        ids: load_ids(paths)?,
        titles: load_titles(paths)?,
        vocabulary: load_vocabulary(paths)?,
        documents: load_documents(paths)?,
        similarities: load_similarities(paths)?,
        authors: load_authors(paths)?,
        tokenizer: load_tokenizer(paths)?,
    };
    check_shapes(&index, &meta)?;
    Ok(index)
}

/// Components written by different builds must not be mixed.
fn check_shapes(index: &BookIndex, meta: &MetaFile) -> Result<()> {
    let n = index.num_docs();
    anyhow::ensure!(n == meta.num_docs, "meta.json lists {} documents, docs.bin has {}", meta.num_docs, n);
    anyhow::ensure!(
        index.documents.n_rows() == n && index.similarities.len() == n,
        "expected {} rows, documents.bin has {} and similarities.bin has {}",
        n,
        index.documents.n_rows(),
        index.similarities.len()
    );
    anyhow::ensure!(
        index.documents.n_cols() == index.vocabulary.len(),
        "documents.bin has {} columns for a vocabulary of {}",
        index.documents.n_cols(),
        index.vocabulary.len()
    );
    for labels in [&index.titles as &dyn IndexLabels, &index.ids as &dyn IndexLabels] {
        if let Some(max) = labels.max_index() {
            anyhow::ensure!(max < n, "lookup index {max} is out of range for {n} documents");
        }
    }
    Ok(())
}
