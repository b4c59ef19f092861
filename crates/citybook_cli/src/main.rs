//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `citybook_core` linkage.
//! - Drive one deterministic in-memory synchronization round trip.

use citybook_core::db::open_db_in_memory;
use citybook_core::{City, CityIntent, ListView, SqliteDocumentStore, SyncedList};
use std::process::ExitCode;
use std::sync::Arc;

/// Reference presentation: prints every rendered snapshot and detail view.
struct StdoutView;

impl ListView for StdoutView {
    fn render(&self, cities: &[City]) {
        println!("list ({} cities)", cities.len());
        for city in cities {
            println!("  - {city}");
        }
    }

    fn show_details(&self, city: &City) {
        println!("details: {city}");
    }
}

fn main() -> ExitCode {
    println!("citybook_core ping={}", citybook_core::ping());
    println!("citybook_core version={}", citybook_core::core_version());

    match run_round_trip() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("round trip failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let store = Arc::new(SqliteDocumentStore::try_new(conn, "cities")?);
    let mut list = SyncedList::new(store, Arc::new(StdoutView));
    list.attach()?;

    list.apply(CityIntent::Add {
        name: "Calgary".to_string(),
        province: "AB".to_string(),
    });
    list.apply(CityIntent::Add {
        name: "Victoria".to_string(),
        province: "BC".to_string(),
    });
    list.apply(CityIntent::Select {
        target: City::new("Calgary", "AB"),
    });
    list.apply(CityIntent::Edit {
        target: City::new("Calgary", "AB"),
        name: "Cowtown".to_string(),
        province: "AB".to_string(),
    });
    list.apply(CityIntent::Delete {
        target: City::new("Victoria", "BC"),
    });

    let remaining = list.entities();
    println!(
        "final: {}",
        remaining
            .iter()
            .map(City::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    );

    list.detach();
    Ok(())
}
