use crate::errors::Result;
use crate::sink::DocumentConsumer;
use std::collections::HashMap;

/// Rendered documents grouped by output-type key
///
/// Keys iterate in the order they were first pushed, which is traversal
/// visitation order; documents within a bucket keep the order they were
/// pushed in. The map is owned by a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketMap {
    buckets: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
    render_failures: usize,
}

impl BucketMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bucket: &str, document: String) {
        self.bucket_mut(bucket).push(document);
    }

    fn bucket_mut(&mut self, bucket: &str) -> &mut Vec<String> {
        let position = match self.index.get(bucket) {
            Some(&position) => position,
            None => {
                self.buckets.push((bucket.to_string(), Vec::new()));
                self.index.insert(bucket.to_string(), self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[position].1
    }

    /// Append every bucket of `other` after the documents already held
    ///
    /// Buckets new to this map are added after the existing ones, in
    /// `other`'s order.
    pub fn merge(&mut self, other: BucketMap) {
        for (bucket, documents) in other.buckets {
            self.bucket_mut(&bucket).extend(documents);
        }
        self.render_failures += other.render_failures;
    }

    pub fn get(&self, bucket: &str) -> Option<&[String]> {
        self.index
            .get(bucket)
            .map(|&position| self.buckets[position].1.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total documents across all buckets
    pub fn document_count(&self) -> usize {
        self.buckets.iter().map(|(_, v)| v.len()).sum()
    }

    /// Related documents dropped because their render failed
    pub fn render_failures(&self) -> usize {
        self.render_failures
    }

    pub fn record_render_failure(&mut self) {
        self.render_failures += 1;
    }

    /// Buckets in first-insertion order
    pub fn into_buckets(self) -> Vec<(String, Vec<String>)> {
        self.buckets
    }

    /// Hand every document to `consumer` in bucket order, emptying the map
    ///
    /// Returns the number of documents handed over. The consumer is not
    /// closed.
    ///
    /// # Errors
    ///
    /// Propagates the first consumer failure.
    pub fn drain_into(&mut self, consumer: &mut dyn DocumentConsumer) -> Result<usize> {
        self.index.clear();
        let mut count = 0;
        for (bucket, documents) in std::mem::take(&mut self.buckets) {
            for document in documents {
                consumer.accept(&bucket, document)?;
                count += 1;
            }
        }
        Ok(count)
    }
}

impl DocumentConsumer for BucketMap {
    fn accept(&mut self, bucket: &str, document: String) -> Result<()> {
        self.push(bucket, document);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut map = BucketMap::new();
        map.push("groups", "g2".to_string());
        map.push("groups", "g1".to_string());
        map.push("study", "s".to_string());
        map.push("audit", "a".to_string());

        assert_eq!(map.get("groups").unwrap(), &["g2", "g1"]);
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            vec!["groups", "study", "audit"]
        );
        assert_eq!(map.document_count(), 4);
    }

    #[test]
    fn test_merge_appends() {
        let mut first = BucketMap::new();
        first.push("observation", "o1".to_string());
        first.record_render_failure();
        let mut second = BucketMap::new();
        second.push("observation", "o2".to_string());
        second.push("subject", "p".to_string());
        second.record_render_failure();

        first.merge(second);

        assert_eq!(first.get("observation").unwrap(), &["o1", "o2"]);
        assert_eq!(first.get("subject").unwrap(), &["p"]);
        assert_eq!(first.render_failures(), 2);
        assert_eq!(first.keys().collect::<Vec<_>>(), vec!["observation", "subject"]);
    }

    #[test]
    fn test_drain_into_another_map() {
        let mut source = BucketMap::new();
        source.push("b", "2".to_string());
        source.push("a", "1".to_string());
        let mut target = BucketMap::new();

        let moved = source.drain_into(&mut target).unwrap();

        assert_eq!(moved, 2);
        assert!(source.is_empty());
        assert_eq!(target.get("a").unwrap(), &["1"]);
        assert_eq!(target.get("b").unwrap(), &["2"]);
        assert_eq!(target.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_drained_map_is_reusable() {
        let mut map = BucketMap::new();
        map.push("study", "s".to_string());
        map.drain_into(&mut BucketMap::new()).unwrap();

        map.push("groups", "g".to_string());

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["groups"]);
        assert_eq!(map.get("groups").unwrap(), &["g"]);
        assert!(map.get("study").is_none());
    }
}
