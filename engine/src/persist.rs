use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::index::{DocumentRecord, ScopeState};
use crate::{DocId, Engine, IdfMode, ScopeId};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_scopes: u32,
    pub idf_mode: IdfMode,
    pub created_at: String,
    pub version: u32,
}

pub const FORMAT_VERSION: u32 = 1;

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn scopes(&self) -> PathBuf { self.root.join("scopes.bin") }
    fn documents(&self) -> PathBuf { self.root.join("documents.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn save_scopes(paths: &IndexPaths, scopes: &HashMap<ScopeId, ScopeState>) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.scopes())?;
    let bytes = bincode::serialize(scopes)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_scopes(paths: &IndexPaths) -> Result<HashMap<ScopeId, ScopeState>> {
    let mut f = File::open(paths.scopes())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let scopes = bincode::deserialize(&buf)?;
    Ok(scopes)
}

pub fn save_documents(paths: &IndexPaths, docs: &HashMap<DocId, DocumentRecord>) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.documents())?;
    let bytes = bincode::serialize(docs)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_documents(paths: &IndexPaths) -> Result<HashMap<DocId, DocumentRecord>> {
    let mut f = File::open(paths.documents())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let docs = bincode::deserialize(&buf)?;
    Ok(docs)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Persist the engine's full state: scopes.bin, documents.bin, meta.json.
pub fn save_snapshot(paths: &IndexPaths, engine: &Engine, created_at: String) -> Result<()> {
    let (scopes, documents) = engine.export();
    save_scopes(paths, &scopes)?;
    save_documents(paths, &documents)?;
    let meta = MetaFile {
        num_docs: documents.len() as u32,
        num_scopes: scopes.len() as u32,
        idf_mode: engine.idf_mode(),
        created_at,
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(())
}

/// Rebuild an engine from a saved snapshot. The IDF mode recorded in the
/// meta file wins; mixing formulas across a snapshot boundary would corrupt
/// the stored values.
pub fn load_snapshot(paths: &IndexPaths) -> Result<Engine> {
    let meta = load_meta(paths)?;
    let scopes = load_scopes(paths)?;
    let documents = load_documents(paths)?;
    Ok(Engine::from_parts(meta.idf_mode, scopes, documents))
}
