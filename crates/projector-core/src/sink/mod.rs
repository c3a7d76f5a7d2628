//! Document sinks
//!
//! A [`DocumentConsumer`] receives rendered documents tagged with their
//! bucket key. [`BufferedArraySink`] writes them into one JSON array file;
//! [`BucketRouter`] keeps one such file per bucket.

pub mod json_array;
pub mod router;

pub use json_array::BufferedArraySink;
pub use router::BucketRouter;

use crate::errors::Result;

pub trait DocumentConsumer {
    /// Take ownership of one rendered document
    ///
    /// # Errors
    ///
    /// `SinkClosed` after `close`, `SinkIo` when a triggered flush fails.
    fn accept(&mut self, bucket: &str, document: String) -> Result<()>;

    /// Write out anything pending and release resources
    ///
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// `SinkIo` when the final write fails.
    fn close(&mut self) -> Result<()>;
}
