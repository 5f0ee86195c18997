use sqlx::SqlitePool;

use crate::models::{Item, ItemInput};

/// Errors raised by the primary store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    /// A stock decrement was requested with a non-positive quantity.
    #[error("Quantity must be greater than zero, got {0}")]
    InvalidQuantity(i64),
    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateKey(db_err.message().to_string());
            }
        }
        StoreError::Database(e)
    }
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Exactly one row matched and its stock was reduced.
    Applied,
    /// No item with that id exists.
    NotFound,
    /// The item exists but holds less stock than requested.
    InsufficientStock,
}

#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &ItemInput) -> Result<Item, StoreError> {
        let result = sqlx::query("INSERT INTO items (name, category, stock) VALUES (?, ?, ?)")
            .bind(&input.name)
            .bind(&input.category)
            .bind(input.stock_or_default())
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();

        // Return the created item
        self.get_by_id(id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let item = sqlx::query_as("SELECT id, name, category, stock FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Case-sensitive substring match on the name.
    pub async fn find_by_name_contains(&self, fragment: &str) -> Result<Vec<Item>, StoreError> {
        let items = sqlx::query_as(
            "SELECT id, name, category, stock FROM items WHERE instr(name, ?) > 0 ORDER BY id",
        )
        .bind(fragment)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn find_by_category(&self, category: &str) -> Result<Vec<Item>, StoreError> {
        let items = sqlx::query_as(
            "SELECT id, name, category, stock FROM items WHERE category = ? ORDER BY id",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list(&self) -> Result<Vec<Item>, StoreError> {
        let items = sqlx::query_as("SELECT id, name, category, stock FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Overwrites name, category and stock. Returns `None` if the id is absent.
    pub async fn update(&self, id: i64, input: &ItemInput) -> Result<Option<Item>, StoreError> {
        let result = sqlx::query("UPDATE items SET name = ?, category = ?, stock = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.category)
            .bind(input.stock_or_default())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Changes name and category only. `stock` is left out of the write so a
    /// concurrent decrement is never overwritten.
    pub async fn update_details(
        &self,
        id: i64,
        name: &str,
        category: &str,
    ) -> Result<Option<Item>, StoreError> {
        let result = sqlx::query("UPDATE items SET name = ?, category = ? WHERE id = ?")
            .bind(name)
            .bind(category)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Returns `false` if there was nothing to delete.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically subtracts `qty` from the item's stock if enough is available.
    ///
    /// The check and the write are one statement, so concurrent callers are
    /// serialized by SQLite and stock can never go negative. Only when nothing
    /// matched is a second query issued, to tell a missing item apart from an
    /// understocked one.
    pub async fn decrement_stock(&self, id: i64, qty: i64) -> Result<StockDecrement, StoreError> {
        if qty <= 0 {
            return Err(StoreError::InvalidQuantity(qty));
        }

        let result =
            sqlx::query("UPDATE items SET stock = stock - ? WHERE id = ? AND stock >= ?")
                .bind(qty)
                .bind(id)
                .bind(qty)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 1 {
            return Ok(StockDecrement::Applied);
        }

        if self.exists(id).await? {
            Ok(StockDecrement::InsufficientStock)
        } else {
            Ok(StockDecrement::NotFound)
        }
    }
}
