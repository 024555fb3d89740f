//! Storage domain - object storage used to stage knowledge base documents

mod object_store;

pub use object_store::ObjectStore;

#[cfg(test)]
pub use object_store::MockObjectStore;
