//! # Transaction Repository
//!
//! Records transactions together with their line items, atomically.
//!
//! ## Recording Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create(NewTransaction)                             │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ├── client exists?             no ──► NotFound(Client)   ─┐         │
//! │    │                                                          │         │
//! │    ├── for each line:                                         │         │
//! │    │     product exists?          no ──► NotFound(Product) ──┤         │
//! │    │     price_line(product, qty)  (snapshot current price)   │         │
//! │    │                                                          │         │
//! │    ├── total = Σ line totals                                  │         │
//! │    ├── INSERT transactions                                    │         │
//! │    ├── INSERT transaction_products × N                        │         │
//! │    │                                                          ▼         │
//! │  COMMIT                                       ROLLBACK (drop of tx)    │
//! │                                                 nothing persisted      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Updates that replace the line list go through the same resolve-and-price
//! path inside their own database transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tienda_core::pricing::{self, PricedLine};
use tienda_core::{
    LineRequest, NewTransaction, Product, Transaction, TransactionPatch, TransactionProduct,
};

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Records a transaction with all its line items, or nothing at all.
    ///
    /// ## Errors
    /// - `NotFound { entity: "Client" }` when the client doesn't exist
    /// - `NotFound { entity: "Product" }` for the first unresolved product
    /// - `Core(..)` when a line cannot be priced
    pub async fn create(&self, new: &NewTransaction) -> DbResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        ensure_client(&mut tx, &new.client).await?;
        let lines = resolve_lines(&mut tx, &new.products).await?;

        let now = Utc::now();
        let items: Vec<TransactionProduct> =
            lines.iter().cloned().map(PricedLine::into_line_item).collect();

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            client: new.client.clone(),
            payment_method: new.payment_method,
            status: new.status,
            total_cents: pricing::transaction_total(&lines)?.cents(),
            created_at: now,
            updated_at: now,
            products: items,
        };

        debug!(id = %transaction.id, lines = transaction.products.len(), "Inserting transaction");

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, client, payment_method, status, total_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.client)
        .bind(transaction.payment_method)
        .bind(transaction.status)
        .bind(transaction.total_cents)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_lines(&mut tx, &transaction.id, &transaction.products).await?;

        tx.commit().await?;

        info!(
            id = %transaction.id,
            client = %transaction.client,
            total_cents = transaction.total_cents,
            "Transaction recorded"
        );

        Ok(transaction)
    }

    /// Gets a transaction with its line items.
    pub async fn get(&self, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_one(&mut conn, id).await
    }

    /// Lists every transaction with its line items, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Transaction>> {
        let mut conn = self.pool.acquire().await?;

        let mut headers = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, client, payment_method, status, total_cents, created_at, updated_at
            FROM transactions
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT transaction_id, id, product, product_name, quantity,
                   unit_price_cents, total_cents
            FROM transaction_products
            ORDER BY transaction_id, position
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut by_transaction: HashMap<String, Vec<TransactionProduct>> = HashMap::new();
        for row in rows {
            let (transaction_id, line) = row.split();
            by_transaction.entry(transaction_id).or_default().push(line);
        }

        for header in &mut headers {
            header.products = by_transaction.remove(&header.id).unwrap_or_default();
        }

        Ok(headers)
    }

    /// Applies `patch` to an existing transaction.
    ///
    /// When the patch carries a product list, the old lines are replaced,
    /// re-priced from current product prices, and the total recomputed.
    pub async fn update(&self, id: &str, patch: &TransactionPatch) -> DbResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let mut current = fetch_one(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))?;

        if let Some(client) = &patch.client {
            ensure_client(&mut tx, client).await?;
            current.client = client.clone();
        }
        if let Some(method) = patch.payment_method {
            current.payment_method = method;
        }
        if let Some(status) = patch.status {
            current.status = status;
        }

        if let Some(requested) = &patch.products {
            let lines = resolve_lines(&mut tx, requested).await?;
            current.total_cents = pricing::transaction_total(&lines)?.cents();
            current.products = lines.into_iter().map(PricedLine::into_line_item).collect();

            sqlx::query("DELETE FROM transaction_products WHERE transaction_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_lines(&mut tx, id, &current.products).await?;
        }

        current.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE transactions SET
                client = ?2,
                payment_method = ?3,
                status = ?4,
                total_cents = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&current.client)
        .bind(current.payment_method)
        .bind(current.status)
        .bind(current.total_cents)
        .bind(current.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = %id, total_cents = current.total_cents, "Transaction updated");
        Ok(current)
    }

    /// Deletes a transaction and its line items.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        // Lines cascade with the header; deleted explicitly so the outcome
        // does not depend on the foreign_keys pragma of the connection.
        sqlx::query("DELETE FROM transaction_products WHERE transaction_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        tx.commit().await?;

        info!(id = %id, "Transaction deleted");
        Ok(())
    }
}

// =============================================================================
// Connection-level helpers (shared by pool and transaction callers)
// =============================================================================

/// A line item row with its owning transaction id.
#[derive(sqlx::FromRow)]
struct LineRow {
    transaction_id: String,
    id: String,
    product: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    total_cents: i64,
}

impl LineRow {
    fn split(self) -> (String, TransactionProduct) {
        (
            self.transaction_id,
            TransactionProduct {
                id: self.id,
                product: self.product,
                product_name: self.product_name,
                quantity: self.quantity,
                unit_price_cents: self.unit_price_cents,
                total_cents: self.total_cents,
            },
        )
    }
}

async fn ensure_client(conn: &mut SqliteConnection, document: &str) -> DbResult<()> {
    let exists: Option<String> =
        sqlx::query_scalar("SELECT document FROM clients WHERE document = ?1")
            .bind(document)
            .fetch_optional(&mut *conn)
            .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(DbError::not_found("Client", document)),
    }
}

/// Resolves each requested product and prices the line at its current price.
async fn resolve_lines(
    conn: &mut SqliteConnection,
    requested: &[LineRequest],
) -> DbResult<Vec<PricedLine>> {
    let mut lines = Vec::with_capacity(requested.len());

    for line in requested {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(&line.product)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &line.product))?;

        lines.push(pricing::price_line(&product, line.quantity)?);
    }

    Ok(lines)
}

async fn insert_lines(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    items: &[TransactionProduct],
) -> DbResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO transaction_products (
                id, transaction_id, product, product_name,
                quantity, unit_price_cents, total_cents, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(transaction_id)
        .bind(&item.product)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_cents)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_one(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Transaction>> {
    let header = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, client, payment_method, status, total_cents, created_at, updated_at
        FROM transactions
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(mut transaction) = header else {
        return Ok(None);
    };

    transaction.products = sqlx::query_as::<_, TransactionProduct>(
        r#"
        SELECT id, product, product_name, quantity, unit_price_cents, total_cents
        FROM transaction_products
        WHERE transaction_id = ?1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(transaction))
}

// =============================================================================
// Unit Tests
// =============================================================================
