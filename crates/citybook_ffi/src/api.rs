//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level city operations to Dart via FRB.
//! - Keep error semantics simple for the list-screen UI.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Envelope failures cover infrastructure only (DB open, store init);
//!   remote-mutation outcomes stay fire-and-forget, per core semantics.

use citybook_core::db::open_db;
use citybook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    City, CityIntent, ListView, SqliteDocumentStore, SyncedList,
};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

const CITIES_COLLECTION: &str = "cities";
const CITY_DB_FILE_NAME: &str = "citybook.sqlite3";
static CITY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One city row for list/detail rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityDto {
    /// City name; also the document key.
    pub name: String,
    /// Province or state label.
    pub province: String,
}

/// List response envelope for the city screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityListResponse {
    /// Whether the list could be read.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Cities in snapshot order (empty on failure).
    pub cities: Vec<CityDto>,
}

/// Generic action response envelope for city mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityActionResponse {
    /// Whether the request was forwarded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl CityActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Detail response envelope for the tap-to-view dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityDetailResponse {
    /// Whether the lookup could run.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// The city, when present in the current snapshot.
    pub city: Option<CityDto>,
}

/// Lists all cities in snapshot order.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns deterministic envelope; empty list plus message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn list_cities() -> CityListResponse {
    match with_synced_list(|list| list.entities()) {
        Ok(cities) => CityListResponse {
            ok: true,
            message: format!("{} city(ies).", cities.len()),
            cities: cities.into_iter().map(to_city_dto).collect(),
        },
        Err(err) => CityListResponse {
            ok: false,
            message: format!("list_cities failed: {err}"),
            cities: Vec::new(),
        },
    }
}

/// Adds one city from the add dialog.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - `ok=false` only for infrastructure failures; the write itself is
///   fire-and-forget and reconciled by the next list read.
#[flutter_rust_bridge::frb(sync)]
pub fn add_city(name: String, province: String) -> CityActionResponse {
    let name = name.trim().to_string();
    let province = province.trim().to_string();
    if name.is_empty() {
        return CityActionResponse::failure("City name is required.");
    }

    match with_synced_list(|list| list.apply(CityIntent::Add { name, province })) {
        Ok(()) => CityActionResponse::success("City saved."),
        Err(err) => CityActionResponse::failure(format!("add_city failed: {err}")),
    }
}

/// Updates one city from the edit dialog; renames move the document to a
/// new key.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Fails when the edited city is no longer listed.
#[flutter_rust_bridge::frb(sync)]
pub fn update_city(old_name: String, new_name: String, new_province: String) -> CityActionResponse {
    let new_name = new_name.trim().to_string();
    let new_province = new_province.trim().to_string();
    if new_name.is_empty() {
        return CityActionResponse::failure("City name is required.");
    }

    let outcome = with_synced_list(|list| match list.find(old_name.trim()) {
        Some(target) => {
            list.apply(CityIntent::Edit {
                target,
                name: new_name,
                province: new_province,
            });
            Ok(())
        }
        None => Err(format!("city not found: {}", old_name.trim())),
    });

    match outcome {
        Ok(Ok(())) => CityActionResponse::success("City updated."),
        Ok(Err(message)) => CityActionResponse::failure(message),
        Err(err) => CityActionResponse::failure(format!("update_city failed: {err}")),
    }
}

/// Deletes one city.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Deleting an absent city succeeds (the store delete is idempotent).
#[flutter_rust_bridge::frb(sync)]
pub fn delete_city(name: String) -> CityActionResponse {
    let name = name.trim().to_string();
    if name.is_empty() {
        return CityActionResponse::failure("City name is required.");
    }

    let outcome = with_synced_list(|list| {
        let target = list
            .find(&name)
            .unwrap_or_else(|| City::new(name.clone(), String::new()));
        list.apply(CityIntent::Delete { target });
    });

    match outcome {
        Ok(()) => CityActionResponse::success("City deleted."),
        Err(err) => CityActionResponse::failure(format!("delete_city failed: {err}")),
    }
}

/// Fetches one city for the detail dialog.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - `city=None` with `ok=true` when the name is not listed.
#[flutter_rust_bridge::frb(sync)]
pub fn get_city(name: String) -> CityDetailResponse {
    match with_synced_list(|list| list.find(name.trim())) {
        Ok(Some(city)) => CityDetailResponse {
            ok: true,
            message: "Found.".to_string(),
            city: Some(to_city_dto(city)),
        },
        Ok(None) => CityDetailResponse {
            ok: true,
            message: format!("city not found: {}", name.trim()),
            city: None,
        },
        Err(err) => CityDetailResponse {
            ok: false,
            message: format!("get_city failed: {err}"),
            city: None,
        },
    }
}

/// Headless view: the host UI renders from returned envelopes, not through
/// the core view seam.
struct SilentView;

impl ListView for SilentView {
    fn render(&self, _cities: &[City]) {}
    fn show_details(&self, _city: &City) {}
}

fn resolve_city_db_path() -> PathBuf {
    CITY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("CITYBOOK_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(CITY_DB_FILE_NAME)
        })
        .clone()
}

/// Opens the shared database, attaches a list to obtain the current
/// snapshot, runs `f`, and detaches before returning.
fn with_synced_list<T>(f: impl FnOnce(&SyncedList) -> T) -> Result<T, String> {
    let db_path = resolve_city_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("city DB open failed: {err}"))?;
    let store = SqliteDocumentStore::try_new(conn, CITIES_COLLECTION)
        .map_err(|err| format!("city store init failed: {err}"))?;

    let mut list = SyncedList::new(Arc::new(store), Arc::new(SilentView));
    list.attach()
        .map_err(|err| format!("city list attach failed: {err}"))?;
    let result = f(&list);
    list.detach();
    Ok(result)
}

fn to_city_dto(city: City) -> CityDto {
    CityDto {
        name: city.name,
        province: city.province,
    }
}
