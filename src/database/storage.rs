//! The storage collaborator seam.
//!
//! An engine is a connection factory built once from configuration; a connection is an owned,
//! scoped resource released when dropped.

use crate::error::LoaderResult;
use crate::types::{TableMetadata, Value};

/// Connection factory.
pub trait StorageEngine {
    type Connection: StorageConnection;

    /// Open a new connection.
    fn connect(&self) -> LoaderResult<Self::Connection>;

    /// Human-readable location of the database, used in messages.
    fn describe(&self) -> String;
}

/// One open connection.
pub trait StorageConnection {
    /// Names of all user tables.
    fn table_names(&mut self) -> LoaderResult<Vec<String>>;

    /// Live metadata of `table`, or `None` if it does not exist.
    fn reflect_table(&mut self, table: &str) -> LoaderResult<Option<TableMetadata>>;

    /// Insert `rows` (values in `columns` order) in a single transaction.
    ///
    /// At most `chunk_size` rows go into one statement. The first error rolls back every row of
    /// the call. Returns the number of inserted rows.
    fn insert_rows(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &mut dyn Iterator<Item = LoaderResult<Vec<Value>>>,
        chunk_size: usize,
    ) -> LoaderResult<usize>;
}
