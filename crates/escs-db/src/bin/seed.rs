//! # Seed Data Generator
//!
//! Populates the database with students and catalog entries for development.
//!
//! ## Usage
//! ```bash
//! # 30 students, full sample catalog (default)
//! cargo run -p escs-db --bin seed
//!
//! # Custom amount
//! cargo run -p escs-db --bin seed -- --students 100
//!
//! # Specify database path
//! cargo run -p escs-db --bin seed -- --db ./data/escs.db
//! ```
//!
//! Half of the sample books go to the curated catalog and half to the legacy
//! catalog, so both resolver links have something to find.

use chrono::Utc;
use escs_core::CatalogEntry;
use escs_db::{Database, DbConfig};
use std::env;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Donald", "Edsger", "Frances", "Grace", "John", "Ken",
    "Leslie", "Margaret", "Niklaus", "Radia", "Shafi", "Tim",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Liskov", "Shannon", "Knuth", "Dijkstra", "Allen", "Hopper", "McCarthy",
    "Thompson", "Lamport", "Hamilton", "Wirth", "Perlman", "Goldwasser", "Berners-Lee",
];

/// (ISBN-13, title, author)
const BOOKS: &[(&str, &str, &str)] = &[
    ("9780140449136", "The Odyssey", "Homer"),
    ("9780441013593", "Dune", "Frank Herbert"),
    ("9780061120084", "To Kill a Mockingbird", "Harper Lee"),
    ("9780451524935", "1984", "George Orwell"),
    ("9780743273565", "The Great Gatsby", "F. Scott Fitzgerald"),
    ("9780547928227", "The Hobbit", "J. R. R. Tolkien"),
    ("9780316769488", "The Catcher in the Rye", "J. D. Salinger"),
    ("9780062315007", "The Alchemist", "Paulo Coelho"),
    ("9780439708180", "Harry Potter and the Sorcerer's Stone", "J. K. Rowling"),
    ("9780590353427", "Holes", "Louis Sachar"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 30;
    let mut db_path = String::from("./escs_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--students" | "-s" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(30);
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
                println!("ESCS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --students <N>  Number of students to create (default: 30)");
                println!("  -d, --db <PATH>     Database file path (default: ./escs_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 ESCS Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Students: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.students().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} students", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating students...");
    for n in 0..count {
        let name = format!(
            "{} {}",
            FIRST_NAMES[n % FIRST_NAMES.len()],
            LAST_NAMES[(n / FIRST_NAMES.len() + n) % LAST_NAMES.len()]
        );
        match db.students().add(&name).await {
            Ok(student) => println!("  {}  {}", student.id, student.name),
            Err(e) => eprintln!("Failed to add {}: {}", name, e),
        }
    }

    println!();
    println!("Creating catalog entries...");
    for (idx, (code, title, author)) in BOOKS.iter().enumerate() {
        let entry = CatalogEntry {
            code: code.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            cover: None,
            created_at: Utc::now(),
        };

        let result = if idx % 2 == 0 {
            db.catalog().save(&entry).await
        } else {
            db.catalog().save_legacy(&entry).await
        };
        if let Err(e) = result {
            eprintln!("Failed to save {}: {}", code, e);
        }
    }

    println!(
        "  Curated: {}  Legacy: {}",
        db.catalog().list().await?.len(),
        db.catalog().list_legacy().await?.len()
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
