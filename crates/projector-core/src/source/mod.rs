//! Row source contract
//!
//! A row source owns the rows; traversal only borrows instances for the
//! duration of one projection call. Two access paths exist: `fetch_all` for
//! small bounded classes (studies) and `stream` for large ones (subjects),
//! which must hold no more than one page in memory at a time.

pub mod memory;

use crate::errors::ExError;
use crate::model::{Edge, Instance, ModelSchema};

pub use memory::MemorySource;

/// Result type for row source operations
pub type SourceResult<T> = std::result::Result<T, ExError>;

/// Lazy, single-pass sequence of instances
pub type InstanceStream<'a> = Box<dyn Iterator<Item = SourceResult<Instance>> + 'a>;

pub trait RowSource {
    /// Edge table the source was built from
    fn model(&self) -> &ModelSchema;

    /// Every instance of a class, eagerly
    ///
    /// # Errors
    ///
    /// `NotFound` for undeclared classes, `Persistence` for backend failures.
    fn fetch_all(&self, class_name: &str) -> SourceResult<Vec<Instance>>;

    /// Every instance of a class, pulled `page_size` rows at a time
    ///
    /// Restartable only by calling `stream` again.
    ///
    /// # Errors
    ///
    /// `NotFound` for undeclared classes. Backend failures while paging are
    /// yielded as `Err` items.
    fn stream<'a>(&'a self, class_name: &str, page_size: usize)
        -> SourceResult<InstanceStream<'a>>;

    /// Members of `edge` for `instance`, in target primary-key order
    ///
    /// A singular edge yields at most one instance; a NULL key yields none.
    ///
    /// # Errors
    ///
    /// `NotFound` if either class is undeclared, `Persistence` for backend
    /// failures.
    fn related(&self, instance: &Instance, edge: &Edge) -> SourceResult<Vec<Instance>>;
}
