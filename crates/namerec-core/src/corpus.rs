//! Corpus ingestion: JSON documents to program graphs plus the feature index
//! built over them.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IngestError;
use crate::feature::FeatureIndex;
use crate::program::ProgramGraph;

/// A validated training corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Every feature key the programs produce under their ground truth.
    pub features: FeatureIndex,
    /// Programs in load order.
    pub programs: Vec<ProgramGraph>,
    /// Source file for each program (empty for in-memory corpora).
    pub sources: Vec<PathBuf>,
}

impl Corpus {
    pub fn new() -> Self {
        Corpus::default()
    }

    /// Adds a program and registers its feature keys.
    pub fn push(&mut self, program: ProgramGraph) {
        self.features.register_program(&program);
        self.programs.push(program);
    }

    /// Builds a corpus from already-parsed programs.
    pub fn from_programs(programs: impl IntoIterator<Item = ProgramGraph>) -> Self {
        let mut corpus = Corpus::new();
        for program in programs {
            corpus.push(program);
        }
        corpus
    }

    /// Loads a `.json` file, or every non-hidden `.json` file of a directory
    /// in sorted file-name order.
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let files = json_files(path)?;
        let mut corpus = Corpus::new();
        for file in files {
            let text = fs::read_to_string(&file).map_err(|source| IngestError::Io {
                path: file.clone(),
                source,
            })?;
            let program = ProgramGraph::from_json(&text).map_err(|source| IngestError::InFile {
                path: file.clone(),
                source: Box::new(source),
            })?;
            tracing::debug!(
                file = %file.display(),
                nodes = program.node_count(),
                edges = program.edge_count(),
                "loaded program"
            );
            corpus.push(program);
            corpus.sources.push(file);
        }
        tracing::info!(
            programs = corpus.programs.len(),
            features = corpus.features.len(),
            "corpus loaded"
        );
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Lists the JSON documents a corpus path refers to.
pub fn json_files(path: &Path) -> Result<Vec<PathBuf>, IngestError> {
    if path.is_file() {
        if !is_json(path) {
            return Err(IngestError::NotJson {
                path: path.to_path_buf(),
            });
        }
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(IngestError::NotJson {
            path: path.to_path_buf(),
        });
    }

    let io_err = |source: std::io::Error| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && file.is_file() && is_json(&file) {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}
