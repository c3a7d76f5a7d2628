use super::{BufferedArraySink, DocumentConsumer};
use crate::errors::{ProjectionError, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Routes documents to one array file per bucket: `<dir>/<bucket>.json`
///
/// Sinks are opened on the first document of each bucket, so buckets that
/// never receive a document produce no file. Bucket keys that sanitise to
/// the same file name get a numeric suffix (`a_b.json`, `a_b-2.json`).
#[derive(Debug)]
pub struct BucketRouter {
    dir: PathBuf,
    capacity: usize,
    sinks: BTreeMap<String, BufferedArraySink>,
    claimed: HashSet<PathBuf>,
    closed: bool,
}

impl BucketRouter {
    pub fn new(dir: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            dir: dir.into(),
            capacity,
            sinks: BTreeMap::new(),
            claimed: HashSet::new(),
            closed: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a bucket is written to
    ///
    /// For a bucket not seen yet this is the unsuffixed name it would get
    /// if no other bucket claimed it first.
    pub fn path_for(&self, bucket: &str) -> PathBuf {
        match self.sinks.get(bucket) {
            Some(sink) => sink.path().to_path_buf(),
            None => self.dir.join(format!("{}.json", file_stem(bucket))),
        }
    }

    /// Paths of every bucket file opened so far, in bucket order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.sinks.values().map(|s| s.path().to_path_buf()).collect()
    }
}

impl DocumentConsumer for BucketRouter {
    fn accept(&mut self, bucket: &str, document: String) -> Result<()> {
        if self.closed {
            return Err(ProjectionError::SinkClosed {
                path: self.dir.clone(),
            });
        }
        let Self {
            dir,
            capacity,
            sinks,
            claimed,
            ..
        } = self;
        sinks
            .entry(bucket.to_string())
            .or_insert_with(|| BufferedArraySink::new(claim_path(dir, claimed, bucket), *capacity))
            .accept(document)
    }

    /// Close every bucket sink; the first failure is returned after all
    /// sinks have been closed
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut first_error = None;
        for sink in self.sinks.values_mut() {
            if let Err(err) = sink.close() {
                tracing::error!(path = %sink.path().display(), error = %err, "Failed to close bucket sink");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// First file name for `bucket` not yet taken by another bucket
fn claim_path(dir: &Path, claimed: &mut HashSet<PathBuf>, bucket: &str) -> PathBuf {
    let stem = file_stem(bucket);
    let mut path = dir.join(format!("{}.json", stem));
    let mut suffix = 2;
    while !claimed.insert(path.clone()) {
        path = dir.join(format!("{}-{}.json", stem, suffix));
        suffix += 1;
    }
    if suffix > 2 {
        tracing::warn!(bucket = %bucket, path = %path.display(), "Bucket file name collides; suffixed");
    }
    path
}

/// Keep bucket keys usable as file names
fn file_stem(bucket: &str) -> String {
    let stem: String = bucket
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}
