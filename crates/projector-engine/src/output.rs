//! Bucket writers
//!
//! Both layouts go through the buffered array sink, so at most
//! `buffer_size` documents per file are pending at any time.

#![allow(clippy::result_large_err)]

use crate::config::{OutputLayout, OutputSettings};
use projector_core::errors::Result;
use projector_core::sink::{BucketRouter, BufferedArraySink, DocumentConsumer};
use projector_core::traversal::BucketMap;
use projector_core::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;

/// Open the consumer matching the configured layout
pub fn open_consumer(output: &OutputSettings) -> Box<dyn DocumentConsumer> {
    match output.layout {
        OutputLayout::Single => Box::new(BufferedArraySink::new(&output.path, output.buffer_size)),
        OutputLayout::PerBucket => Box::new(BucketRouter::new(&output.path, output.buffer_size)),
    }
}

/// Write every bucket, in insertion order, and close the output
///
/// Returns the number of documents written.
///
/// # Errors
///
/// `SinkIo` when a file cannot be created or written.
pub fn write_buckets(buckets: &BucketMap, output: &OutputSettings) -> Result<usize> {
    let start = Instant::now();
    log_op_start!("write_buckets", path = %output.path.display());

    let mut consumer = open_consumer(output);
    let result = write_all(buckets, consumer.as_mut());
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(written) => {
            log_op_end!("write_buckets", duration_ms = duration_ms, documents = *written);
        }
        Err(err) => {
            log_op_error!("write_buckets", err, duration_ms = duration_ms);
        }
    }
    result
}

fn write_all(buckets: &BucketMap, consumer: &mut dyn DocumentConsumer) -> Result<usize> {
    let mut written = 0;
    for (bucket, documents) in buckets.iter() {
        for document in documents {
            consumer.accept(bucket, document.clone())?;
            written += 1;
        }
    }
    consumer.close()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    fn buckets() -> BucketMap {
        let mut buckets = BucketMap::new();
        buckets.push("study", json!({"s": 1}).to_string());
        buckets.push("groups", json!({"g": 1}).to_string());
        buckets.push("groups", json!({"g": 2}).to_string());
        buckets
    }

    #[test]
    fn test_single_layout_keeps_bucket_insertion_order() {
        let dir = TempDir::new().unwrap();
        let output = OutputSettings {
            path: dir.path().join("out.json"),
            layout: OutputLayout::Single,
            buffer_size: 2,
        };

        let written = write_buckets(&buckets(), &output).unwrap();

        let docs: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&output.path).unwrap()).unwrap();
        assert_eq!(written, 3);
        assert_eq!(docs, vec![json!({"s": 1}), json!({"g": 1}), json!({"g": 2})]);
    }

    #[test]
    fn test_per_bucket_layout() {
        let dir = TempDir::new().unwrap();
        let output = OutputSettings {
            path: dir.path().join("buckets"),
            layout: OutputLayout::PerBucket,
            buffer_size: 10,
        };

        write_buckets(&buckets(), &output).unwrap();

        let groups: Vec<Value> = serde_json::from_str(
            &fs::read_to_string(output.path.join("groups.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert!(output.path.join("study.json").exists());
    }

    #[test]
    fn test_empty_map_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = OutputSettings {
            path: dir.path().join("out.json"),
            layout: OutputLayout::Single,
            buffer_size: 2,
        };

        assert_eq!(write_buckets(&BucketMap::new(), &output).unwrap(), 0);
        assert!(!output.path.exists());
    }
}
