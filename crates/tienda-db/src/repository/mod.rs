//! # Repository Module
//!
//! One repository per aggregate. Each holds a clone of the pool.
//!
//! ```text
//! HTTP handler
//!      │  db.transactions().create(&payload)
//!      ▼
//! TransactionRepository ──► SQL ──► SQLite
//! ```
//!
//! - [`ClientRepository`](client::ClientRepository) - client CRUD
//! - [`ProductRepository`](product::ProductRepository) - product CRUD
//! - [`TransactionRepository`](transaction::TransactionRepository) - atomic
//!   recording, update and deletion of transactions with their line items

pub mod client;
pub mod product;
pub mod transaction;

#[cfg(test)]
pub(crate) mod test_support {
    use tienda_core::{Client, NewProduct, Product};

    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn client(document: &str, email: &str) -> Client {
        Client {
            document: document.to_string(),
            name: "Ana".to_string(),
            last_name: "Gomez".to_string(),
            email: email.to_string(),
            phone: None,
            address: None,
        }
    }

    pub async fn product(db: &Database, id: &str, price_cents: i64) -> Product {
        db.products()
            .create(&NewProduct {
                id: Some(id.to_string()),
                name: format!("Product {}", id),
                description: None,
                price_cents,
                stock: 10,
            })
            .await
            .unwrap()
    }
}
