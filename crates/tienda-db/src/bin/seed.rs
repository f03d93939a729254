//! # Demo Data Seeder
//!
//! Populates an empty database with clients, products and a handful of
//! recorded transactions so the API has something to serve in development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tienda_dev.db with 20 transactions (default)
//! cargo run -p tienda-db --bin seed
//!
//! # Choose database and number of transactions
//! cargo run -p tienda-db --bin seed -- --db ./data/tienda.db --transactions 50
//! ```
//!
//! Seeding is skipped when the database already holds clients or products.

use std::env;
use tienda_core::{Client, LineRequest, NewProduct, NewTransaction, PaymentMethod, TransactionStatus};
use tienda_db::{Database, DbConfig};

/// (document, name, last name, email, phone)
const CLIENTS: &[(&str, &str, &str, &str, &str)] = &[
    ("1001", "Ana", "Gomez", "ana.gomez@example.com", "+57 300 111 2233"),
    ("1002", "Luis", "Perez", "luis.perez@example.com", "+57 301 222 3344"),
    ("1003", "Marta", "Rojas", "marta.rojas@example.com", "(604) 555-0101"),
    ("1004", "Jorge", "Diaz", "jorge.diaz@example.com", "3105550199"),
    ("1005", "Sofia", "Vargas", "sofia.vargas@example.com", "+57 315 777 8899"),
];

/// (id, name, price in cents, stock)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("CAF-250", "Coffee beans 250g", 1850, 40),
    ("CAF-500", "Coffee beans 500g", 3400, 25),
    ("TEA-GRN", "Green tea box", 950, 60),
    ("MUG-CER", "Ceramic mug", 1200, 30),
    ("FLT-V60", "Pour-over filter", 2599, 15),
    ("PAP-100", "Paper filters x100", 499, 120),
    ("GRN-MAN", "Manual grinder", 4500, 8),
    ("KTL-GOO", "Gooseneck kettle", 5900, 5),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut transactions: usize = 20;
    let mut db_path = env::var("TIENDA__DATABASE__PATH").unwrap_or_else(|_| "./tienda_dev.db".into());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--transactions" | "-t" => {
                if i + 1 < args.len() {
                    transactions = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tienda Demo Data Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --transactions <N>  Sample transactions to record (default: 20)");
                println!("  -d, --db <PATH>         Database file path (default: ./tienda_dev.db)");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tienda Demo Data Seeder");
    println!("=======================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing_clients = db.clients().count().await?;
    let existing_products = db.products().count().await?;
    if existing_clients > 0 || existing_products > 0 {
        println!(
            "⚠ Database already has {} clients and {} products, skipping seed.",
            existing_clients, existing_products
        );
        return Ok(());
    }

    for (document, name, last_name, email, phone) in CLIENTS {
        db.clients()
            .create(&Client {
                document: document.to_string(),
                name: name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                phone: Some(phone.to_string()),
                address: None,
            })
            .await?;
    }
    println!("✓ {} clients", CLIENTS.len());

    for (id, name, price_cents, stock) in PRODUCTS {
        db.products()
            .create(&NewProduct {
                id: Some(id.to_string()),
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                stock: *stock,
            })
            .await?;
    }
    println!("✓ {} products", PRODUCTS.len());

    let mut recorded = 0;
    for n in 0..transactions {
        let new = sample_transaction(n);
        match db.transactions().create(&new).await {
            Ok(_) => recorded += 1,
            Err(e) => eprintln!("Failed to record sample transaction {}: {}", n, e),
        }
    }
    println!("✓ {} transactions", recorded);

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Deterministic sample: rotates clients, payment methods and statuses, with
/// one to three lines per transaction.
fn sample_transaction(n: usize) -> NewTransaction {
    let (document, ..) = CLIENTS[n % CLIENTS.len()];
    let line_count = 1 + n % 3;

    let products = (0..line_count)
        .map(|k| {
            let (id, ..) = PRODUCTS[(n * 3 + k * 5) % PRODUCTS.len()];
            LineRequest {
                product: id.to_string(),
                quantity: 1 + ((n + k) % 4) as i64,
            }
        })
        .collect();

    NewTransaction {
        client: document.to_string(),
        payment_method: PaymentMethod::ALL[n % PaymentMethod::ALL.len()],
        status: TransactionStatus::ALL[(n * 7) % TransactionStatus::ALL.len()],
        products,
    }
}
