//! # Client Repository
//!
//! CRUD over the `clients` table. The document number is the key.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tienda_core::Client;

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a new client.
    ///
    /// ## Errors
    /// - `UniqueViolation { field: "document" | "email" }` for duplicates
    pub async fn create(&self, client: &Client) -> DbResult<Client> {
        debug!(document = %client.document, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (document, name, last_name, email, phone, address)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&client.document)
        .bind(&client.name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .execute(&self.pool)
        .await?;

        Ok(client.clone())
    }

    /// Gets a client by document.
    pub async fn get(&self, document: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT document, name, last_name, email, phone, address
            FROM clients
            WHERE document = ?1
            "#,
        )
        .bind(document)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Lists all clients ordered by document.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT document, name, last_name, email, phone, address
            FROM clients
            ORDER BY document
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Overwrites every mutable field of an existing client.
    pub async fn update(&self, client: &Client) -> DbResult<Client> {
        debug!(document = %client.document, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                address = ?6
            WHERE document = ?1
            "#,
        )
        .bind(&client.document)
        .bind(&client.name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", &client.document));
        }

        Ok(client.clone())
    }

    /// Deletes a client.
    ///
    /// ## Errors
    /// - `NotFound` when no such client exists
    /// - `Referenced` when transactions still point at the client
    pub async fn delete(&self, document: &str) -> DbResult<()> {
        debug!(document = %document, "Deleting client");

        let result = sqlx::query("DELETE FROM clients WHERE document = ?1")
            .bind(document)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).on_delete_of("Client", document))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", document));
        }

        Ok(())
    }

    /// Number of clients, used by the seeder.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
