//! Database Service - libsql connection and SQL for site trees
//!
//! This module owns the libsql database file, its schema, and the raw SQL
//! used by [`TursoStore`](super::TursoStore).
//!
//! # Schema
//!
//! - `sites`: one row per site, `id` shared with the site's root node
//! - `nodes`: tree rows `(id, site_id, parent_id, taxis, name)`
//! - `idx_nodes_siblings`: `(site_id, parent_id, taxis)` for neighbour lookups
//!
//! Taxis uniqueness is not a database constraint: a swap writes one row
//! before the other inside its transaction, so a unique index would reject
//! the intermediate state. Uniqueness is kept by the swap transaction itself.
//!
//! # Connections
//!
//! Every operation opens its own connection with `connect_with_timeout()`
//! so concurrent requests wait on the SQLite lock instead of failing.

use crate::db::error::DatabaseError;
use crate::db::events::TaxisSwap;
use crate::models::{Direction, NewNode, NodeId, ROOT_PARENT_ID};
use libsql::{Builder, Connection, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Busy timeout applied to every connection (milliseconds)
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Columns selected for every node row, in `row_to_node` order
pub(crate) const NODE_COLUMNS: &str = "id, site_id, parent_id, taxis, name";

/// Outcome of the swap transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbSwapResult {
    Swapped(TaxisSwap),
    Boundary,
    Conflict,
}

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use sitetree_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_service = DatabaseService::new(PathBuf::from("./data/sitetree.db")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };
        service.initialize_schema().await?;

        tracing::debug!("Opened site tree database at {}", service.db_path.display());
        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through `query()`.
    async fn execute_pragma(&self, conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes (idempotent)
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sites (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create sites table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                parent_id INTEGER NOT NULL,
                taxis INTEGER NOT NULL,
                name TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create nodes table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_nodes_siblings ON nodes(site_id, parent_id, taxis)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create sibling index: {}", e))
        })?;

        Ok(())
    }

    /// Get a raw connection
    ///
    /// Prefer `connect_with_timeout()` in async code.
    pub fn connect(&self) -> Result<Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with the busy timeout configured
    pub async fn connect_with_timeout(&self) -> Result<Connection, DatabaseError> {
        let conn = self.connect()?;
        self.execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .await?;
        Ok(conn)
    }

    /// Retrieve a site row `(id, name)`
    pub async fn db_get_site(&self, site_id: NodeId) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let mut rows = conn
            .query("SELECT id, name FROM sites WHERE id = ?", [site_id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute get_site query: {}", e))
            })?;
        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Retrieve a node row (see [`NODE_COLUMNS`])
    pub async fn db_get_node(&self, node_id: NodeId) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM nodes WHERE id = ?", NODE_COLUMNS),
                [node_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute get_node query: {}", e))
            })?;
        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Children of a parent ordered by `(taxis, id)`
    ///
    /// Returns the raw rows iterator; `TursoStore` converts each row.
    pub async fn db_get_children(
        &self,
        site_id: NodeId,
        parent_id: NodeId,
    ) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        conn.query(
            &format!(
                "SELECT {} FROM nodes WHERE site_id = ? AND parent_id = ? ORDER BY taxis ASC, id ASC",
                NODE_COLUMNS
            ),
            (site_id, parent_id),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_children query: {}", e))
        })
    }

    /// Insert a site and its root node in one transaction; returns the site id
    pub async fn db_create_site(&self, name: &str) -> Result<NodeId, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let result = Self::insert_site_rows(&conn, name).await;
        match result {
            Ok(site_id) => {
                Self::commit(&conn).await?;
                Ok(site_id)
            }
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn insert_site_rows(conn: &Connection, name: &str) -> Result<NodeId, DatabaseError> {
        conn.execute(
            "INSERT INTO nodes (site_id, parent_id, taxis, name) VALUES (0, ?, 1, ?)",
            (ROOT_PARENT_ID, name),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert root node: {}", e)))?;

        let site_id = conn.last_insert_rowid();

        conn.execute("UPDATE nodes SET site_id = ? WHERE id = ?", (site_id, site_id))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to assign root site: {}", e))
            })?;

        conn.execute("INSERT INTO sites (id, name) VALUES (?, ?)", (site_id, name))
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert site: {}", e)))?;

        Ok(site_id)
    }

    /// Insert a node; a missing taxis becomes max sibling taxis + 1
    ///
    /// The taxis is computed inside the INSERT so concurrent appends cannot
    /// pick the same value. Returns `None` without inserting when the taxis
    /// is missing and the last sibling already holds `i64::MAX`.
    pub async fn db_insert_node(&self, node: &NewNode) -> Result<Option<NodeId>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let inserted = conn
            .execute(
                "INSERT INTO nodes (site_id, parent_id, taxis, name)
                 SELECT ?, ?, COALESCE(?, max_taxis + 1), ?
                 FROM (SELECT COALESCE(MAX(taxis), 0) AS max_taxis FROM nodes
                       WHERE site_id = ? AND parent_id = ?)
                 WHERE ? IS NOT NULL OR max_taxis < 9223372036854775807",
                (
                    node.site_id,
                    node.parent_id,
                    node.taxis,
                    node.name.as_str(),
                    node.site_id,
                    node.parent_id,
                    node.taxis,
                ),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert node: {}", e)))?;

        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Delete a single node row; returns whether a row was removed
    pub async fn db_delete_node(&self, node_id: NodeId) -> Result<bool, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let affected = conn
            .execute("DELETE FROM nodes WHERE id = ?", [node_id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete node: {}", e)))?;
        Ok(affected > 0)
    }

    /// Exchange taxis with the adjacent sibling in one transaction
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so no other swap can
    /// interleave between reading the neighbour and writing both rows. Each
    /// UPDATE is additionally guarded by the row's observed taxis; anything
    /// other than exactly one affected row per UPDATE rolls back as a conflict.
    pub async fn db_swap_adjacent(
        &self,
        direction: Direction,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<DbSwapResult, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let result = Self::swap_in_transaction(
            &conn,
            direction,
            site_id,
            node_id,
            parent_id,
            current_taxis,
        )
        .await;

        match result {
            Ok(DbSwapResult::Swapped(swap)) => {
                Self::commit(&conn).await?;
                Ok(DbSwapResult::Swapped(swap))
            }
            other => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                other
            }
        }
    }

    async fn swap_in_transaction(
        conn: &Connection,
        direction: Direction,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<DbSwapResult, DatabaseError> {
        let observed = {
            let mut rows = conn
                .query("SELECT parent_id, taxis FROM nodes WHERE id = ?", [node_id])
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to read node {}: {}", node_id, e))
                })?;
            match rows.next().await? {
                Some(row) => Some((row.get::<i64>(0)?, row.get::<i64>(1)?)),
                None => None,
            }
        };

        if observed != Some((parent_id, current_taxis)) {
            return Ok(DbSwapResult::Conflict);
        }

        let neighbor_query = match direction {
            Direction::Up => {
                "SELECT id, taxis FROM nodes
                 WHERE site_id = ? AND parent_id = ? AND id <> ? AND taxis < ?
                 ORDER BY taxis DESC, id ASC LIMIT 1"
            }
            Direction::Down => {
                "SELECT id, taxis FROM nodes
                 WHERE site_id = ? AND parent_id = ? AND id <> ? AND taxis > ?
                 ORDER BY taxis ASC, id ASC LIMIT 1"
            }
        };

        let neighbor = {
            let mut rows = conn
                .query(neighbor_query, (site_id, parent_id, node_id, current_taxis))
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to find adjacent sibling: {}", e))
                })?;
            match rows.next().await? {
                Some(row) => Some((row.get::<i64>(0)?, row.get::<i64>(1)?)),
                None => None,
            }
        };

        let Some((neighbor_id, neighbor_taxis)) = neighbor else {
            return Ok(DbSwapResult::Boundary);
        };

        let moved = conn
            .execute(
                "UPDATE nodes SET taxis = ? WHERE id = ? AND parent_id = ? AND taxis = ?",
                (neighbor_taxis, node_id, parent_id, current_taxis),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to update taxis: {}", e)))?;

        let displaced = conn
            .execute(
                "UPDATE nodes SET taxis = ? WHERE id = ? AND parent_id = ? AND taxis = ?",
                (current_taxis, neighbor_id, parent_id, neighbor_taxis),
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to update taxis: {}", e)))?;

        if moved != 1 || displaced != 1 {
            return Ok(DbSwapResult::Conflict);
        }

        Ok(DbSwapResult::Swapped(TaxisSwap {
            site_id,
            parent_id,
            node_id,
            neighbor_id,
            node_taxis: neighbor_taxis,
            neighbor_taxis: current_taxis,
        }))
    }

    async fn commit(conn: &Connection) -> Result<(), DatabaseError> {
        if let Err(e) = conn.execute("COMMIT", ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::transaction_failed(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }
        Ok(())
    }
}
