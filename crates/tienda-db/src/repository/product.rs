//! # Product Repository
//!
//! CRUD over the `products` table.
//!
//! Products can be given a short code at creation (`P1`); otherwise a UUID
//! v4 is generated. Price edits only affect future transactions: recorded
//! lines carry their own price snapshot.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tienda_core::{NewProduct, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns the stored record.
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: new
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new.name.clone(),
            description: new.description.clone(),
            price_cents: new.price_cents,
            stock: new.stock,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock, created_at, updated_at
            FROM products
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Overwrites the mutable fields of a product and bumps `updated_at`.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let mut updated = product.clone();
        updated.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                stock = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&updated.id)
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(updated.price_cents)
        .bind(updated.stock)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(updated)
    }

    /// Deletes a product.
    ///
    /// ## Errors
    /// - `NotFound` when no such product exists
    /// - `Referenced` when a transaction line still points at it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).on_delete_of("Product", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Number of products, used by the seeder.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, product};

    #[tokio::test]
    async fn test_create_with_and_without_id() {
        let db = db().await;
        let repo = db.products();

        let p1 = product(&db, "P1", 1000).await;
        assert_eq!(p1.id, "P1");

        let generated = repo
            .create(&NewProduct {
                id: None,
                name: "Tea".to_string(),
                description: Some("Green".to_string()),
                price_cents: 450,
                stock: 0,
            })
            .await
            .unwrap();
        assert!(Uuid::parse_str(&generated.id).is_ok());

        let stored = repo.get(&generated.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Tea");
        assert_eq!(stored.description.as_deref(), Some("Green"));
        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_id() {
        let db = db().await;
        product(&db, "P1", 1000).await;

        let dup = db
            .products()
            .create(&NewProduct {
                id: Some("P1".to_string()),
                name: "Again".to_string(),
                description: None,
                price_cents: 1,
                stock: 1,
            })
            .await;
        assert!(matches!(dup, Err(DbError::UniqueViolation { ref field }) if field == "id"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = db().await;
        let repo = db.products();

        let mut p1 = product(&db, "P1", 1000).await;
        p1.price_cents = 1200;
        let updated = repo.update(&p1).await.unwrap();
        assert!(updated.updated_at >= p1.created_at);
        assert_eq!(repo.get("P1").await.unwrap().unwrap().price_cents, 1200);

        repo.delete("P1").await.unwrap();
        assert!(matches!(repo.delete("P1").await, Err(DbError::NotFound { .. })));
        assert!(matches!(repo.update(&p1).await, Err(DbError::NotFound { .. })));
    }
}
