// 🗄️ Budget Store - Persistence collaborator for brands and campaigns
//
// The engine never talks to SQL directly; it goes through the BudgetStore
// trait. Two implementations:
// - SqliteStore: durable store, WAL mode for crash recovery
// - MemoryStore: RwLock-protected maps for tests and demos
//
// Every save is atomic for the row it touches. Nothing above this layer
// caches spend or active-flag values across ticks; each evaluation re-reads
// fresh snapshots.

use anyhow::Context;
use chrono::{DateTime, NaiveTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, RwLock};

use crate::entities::{Brand, Campaign};
use crate::error::{ControlError, Result};

// ============================================================================
// AUDIT EVENT
// ============================================================================

/// Audit trail entry. Every state transition (spend recorded, campaign
/// toggled, counters reset) appends one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl AuditEvent {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Persistence operations the engine needs. Unknown ids surface as
/// BrandNotFound / CampaignNotFound; callers decide whether to report or
/// re-run.
pub trait BudgetStore: Send + Sync {
    fn insert_brand(&self, brand: &Brand) -> Result<()>;
    fn insert_campaign(&self, campaign: &Campaign) -> Result<()>;

    fn get_brand(&self, id: &str) -> Result<Brand>;
    fn get_brand_by_name(&self, name: &str) -> Result<Option<Brand>>;
    fn get_all_brands(&self) -> Result<Vec<Brand>>;

    fn get_campaign(&self, id: &str) -> Result<Campaign>;
    fn get_campaigns_by_brand(&self, brand_id: &str) -> Result<Vec<Campaign>>;
    fn get_campaigns_using_dayparting(&self) -> Result<Vec<Campaign>>;
    fn get_active_campaigns(&self) -> Result<Vec<Campaign>>;

    fn save_brand(&self, brand: &Brand) -> Result<()>;
    fn save_campaign(&self, campaign: &Campaign) -> Result<()>;

    fn append_event(&self, event: &AuditEvent) -> Result<()>;
    fn events_for_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<AuditEvent>>;

    /// Idempotent-import support: has this spend row been applied before?
    fn spend_marker_seen(&self, hash: &str) -> Result<bool>;
    fn record_spend_marker(&self, hash: &str) -> Result<()>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// Time-of-day column format (minute precision)
const HOUR_FORMAT: &str = "%H:%M";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open database: {:?}", path.as_ref()))?;
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Fresh in-memory database. Used by tests.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ControlError::Store("database mutex poisoned".to_string()))
    }
}

pub fn setup_database(conn: &Connection) -> anyhow::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS brands (
            id TEXT PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            daily_budget REAL NOT NULL,
            monthly_budget REAL NOT NULL,
            daily_spend REAL NOT NULL DEFAULT 0,
            monthly_spend REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS campaigns (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            brand_id TEXT NOT NULL REFERENCES brands(id),
            is_active INTEGER NOT NULL DEFAULT 1,
            use_dayparting INTEGER NOT NULL DEFAULT 0,
            start_hour TEXT,
            end_hour TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // Audit trail (every activation flip, spend, reset)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    // Imported spend rows already applied (at-least-once delivery guard)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS spend_markers (
            idempotency_hash TEXT PRIMARY KEY,
            recorded_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_campaigns_brand ON campaigns(brand_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_campaigns_dayparting ON campaigns(use_dayparting)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

fn hour_to_sql(hour: Option<NaiveTime>) -> Option<String> {
    hour.map(|h| h.format(HOUR_FORMAT).to_string())
}

fn hour_from_sql(value: Option<String>) -> Option<NaiveTime> {
    value.and_then(|s| NaiveTime::parse_from_str(&s, HOUR_FORMAT).ok())
}

fn datetime_from_sql(value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

fn row_to_brand(row: &rusqlite::Row<'_>) -> rusqlite::Result<Brand> {
    Ok(Brand {
        id: row.get(0)?,
        name: row.get(1)?,
        daily_budget: row.get(2)?,
        monthly_budget: row.get(3)?,
        daily_spend: row.get(4)?,
        monthly_spend: row.get(5)?,
        created_at: datetime_from_sql(row.get(6)?)?,
        updated_at: datetime_from_sql(row.get(7)?)?,
    })
}

fn row_to_campaign(row: &rusqlite::Row<'_>) -> rusqlite::Result<Campaign> {
    let start_hour: Option<String> = row.get(5)?;
    let end_hour: Option<String> = row.get(6)?;

    Ok(Campaign {
        id: row.get(0)?,
        name: row.get(1)?,
        brand_id: row.get(2)?,
        is_active: row.get(3)?,
        use_dayparting: row.get(4)?,
        start_hour: hour_from_sql(start_hour),
        end_hour: hour_from_sql(end_hour),
        created_at: datetime_from_sql(row.get(7)?)?,
        updated_at: datetime_from_sql(row.get(8)?)?,
    })
}

const BRAND_COLUMNS: &str =
    "id, name, daily_budget, monthly_budget, daily_spend, monthly_spend, created_at, updated_at";
const CAMPAIGN_COLUMNS: &str = "id, name, brand_id, is_active, use_dayparting, start_hour, \
     end_hour, created_at, updated_at";

impl BudgetStore for SqliteStore {
    fn insert_brand(&self, brand: &Brand) -> Result<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO brands (id, name, daily_budget, monthly_budget, daily_spend,
                                 monthly_spend, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                brand.id,
                brand.name,
                brand.daily_budget,
                brand.monthly_budget,
                brand.daily_spend,
                brand.monthly_spend,
                brand.created_at.to_rfc3339(),
                brand.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(ControlError::InvalidConfiguration(format!(
                    "brand name already in use: {}",
                    brand.name
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn insert_campaign(&self, campaign: &Campaign) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO campaigns (id, name, brand_id, is_active, use_dayparting,
                                    start_hour, end_hour, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                campaign.id,
                campaign.name,
                campaign.brand_id,
                campaign.is_active,
                campaign.use_dayparting,
                hour_to_sql(campaign.start_hour),
                hour_to_sql(campaign.end_hour),
                campaign.created_at.to_rfc3339(),
                campaign.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_brand(&self, id: &str) -> Result<Brand> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM brands WHERE id = ?1", BRAND_COLUMNS))?;
        match stmt.query_row(params![id], row_to_brand) {
            Ok(brand) => Ok(brand),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(ControlError::BrandNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_brand_by_name(&self, name: &str) -> Result<Option<Brand>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM brands WHERE name = ?1", BRAND_COLUMNS))?;
        match stmt.query_row(params![name], row_to_brand) {
            Ok(brand) => Ok(Some(brand)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_brands(&self) -> Result<Vec<Brand>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM brands ORDER BY name", BRAND_COLUMNS))?;
        let brands = stmt
            .query_map([], row_to_brand)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(brands)
    }

    fn get_campaign(&self, id: &str) -> Result<Campaign> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM campaigns WHERE id = ?1", CAMPAIGN_COLUMNS))?;
        match stmt.query_row(params![id], row_to_campaign) {
            Ok(campaign) => Ok(campaign),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(ControlError::CampaignNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_campaigns_by_brand(&self, brand_id: &str) -> Result<Vec<Campaign>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM campaigns WHERE brand_id = ?1 ORDER BY name",
            CAMPAIGN_COLUMNS
        ))?;
        let campaigns = stmt
            .query_map(params![brand_id], row_to_campaign)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(campaigns)
    }

    fn get_campaigns_using_dayparting(&self) -> Result<Vec<Campaign>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM campaigns WHERE use_dayparting = 1 ORDER BY name",
            CAMPAIGN_COLUMNS
        ))?;
        let campaigns = stmt
            .query_map([], row_to_campaign)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(campaigns)
    }

    fn get_active_campaigns(&self) -> Result<Vec<Campaign>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM campaigns WHERE is_active = 1 ORDER BY name",
            CAMPAIGN_COLUMNS
        ))?;
        let campaigns = stmt
            .query_map([], row_to_campaign)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(campaigns)
    }

    fn save_brand(&self, brand: &Brand) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE brands
             SET name = ?2, daily_budget = ?3, monthly_budget = ?4,
                 daily_spend = ?5, monthly_spend = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                brand.id,
                brand.name,
                brand.daily_budget,
                brand.monthly_budget,
                brand.daily_spend,
                brand.monthly_spend,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(ControlError::BrandNotFound(brand.id.clone()));
        }
        Ok(())
    }

    fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE campaigns
             SET name = ?2, is_active = ?3, use_dayparting = ?4,
                 start_hour = ?5, end_hour = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                campaign.id,
                campaign.name,
                campaign.is_active,
                campaign.use_dayparting,
                hour_to_sql(campaign.start_hour),
                hour_to_sql(campaign.end_hour),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(ControlError::CampaignNotFound(campaign.id.clone()));
        }
        Ok(())
    }

    fn append_event(&self, event: &AuditEvent) -> Result<()> {
        let conn = self.lock()?;
        let data_json = serde_json::to_string(&event.data)?;
        conn.execute(
            "INSERT INTO events (event_id, timestamp, event_type, entity_type,
                                 entity_id, data, actor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.event_id,
                event.timestamp.to_rfc3339(),
                event.event_type,
                event.entity_type,
                event.entity_id,
                data_json,
                event.actor,
            ],
        )?;
        Ok(())
    }

    fn events_for_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<AuditEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
             FROM events
             WHERE entity_type = ?1 AND entity_id = ?2
             ORDER BY timestamp DESC",
        )?;

        let events = stmt
            .query_map(params![entity_type, entity_id], |row| {
                let data_json: String = row.get(5)?;
                Ok(AuditEvent {
                    event_id: row.get(0)?,
                    timestamp: datetime_from_sql(row.get(1)?)?,
                    event_type: row.get(2)?,
                    entity_type: row.get(3)?,
                    entity_id: row.get(4)?,
                    data: serde_json::from_str(&data_json)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?,
                    actor: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(events)
    }

    fn spend_marker_seen(&self, hash: &str) -> Result<bool> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT 1 FROM spend_markers WHERE idempotency_hash = ?1")?;
        Ok(stmt.exists(params![hash])?)
    }

    fn record_spend_marker(&self, hash: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO spend_markers (idempotency_hash, recorded_at)
             VALUES (?1, ?2)",
            params![hash, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory store. Same contract as SqliteStore; used by unit tests and
/// demos that do not need a database file.
#[derive(Default)]
pub struct MemoryStore {
    brands: RwLock<HashMap<String, Brand>>,
    campaigns: RwLock<HashMap<String, Campaign>>,
    events: RwLock<Vec<AuditEvent>>,
    spend_markers: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BudgetStore for MemoryStore {
    fn insert_brand(&self, brand: &Brand) -> Result<()> {
        let mut brands = self.brands.write().unwrap();
        if brands.values().any(|b| b.name == brand.name) {
            return Err(ControlError::InvalidConfiguration(format!(
                "brand name already in use: {}",
                brand.name
            )));
        }
        brands.insert(brand.id.clone(), brand.clone());
        Ok(())
    }

    fn insert_campaign(&self, campaign: &Campaign) -> Result<()> {
        self.campaigns
            .write()
            .unwrap()
            .insert(campaign.id.clone(), campaign.clone());
        Ok(())
    }

    fn get_brand(&self, id: &str) -> Result<Brand> {
        self.brands
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ControlError::BrandNotFound(id.to_string()))
    }

    fn get_brand_by_name(&self, name: &str) -> Result<Option<Brand>> {
        Ok(self
            .brands
            .read()
            .unwrap()
            .values()
            .find(|b| b.name == name)
            .cloned())
    }

    fn get_all_brands(&self) -> Result<Vec<Brand>> {
        let mut brands: Vec<Brand> = self.brands.read().unwrap().values().cloned().collect();
        brands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brands)
    }

    fn get_campaign(&self, id: &str) -> Result<Campaign> {
        self.campaigns
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ControlError::CampaignNotFound(id.to_string()))
    }

    fn get_campaigns_by_brand(&self, brand_id: &str) -> Result<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .read()
            .unwrap()
            .values()
            .filter(|c| c.brand_id == brand_id)
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(campaigns)
    }

    fn get_campaigns_using_dayparting(&self) -> Result<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .read()
            .unwrap()
            .values()
            .filter(|c| c.use_dayparting)
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(campaigns)
    }

    fn get_active_campaigns(&self) -> Result<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .read()
            .unwrap()
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(campaigns)
    }

    fn save_brand(&self, brand: &Brand) -> Result<()> {
        let mut brands = self.brands.write().unwrap();
        if !brands.contains_key(&brand.id) {
            return Err(ControlError::BrandNotFound(brand.id.clone()));
        }
        let mut updated = brand.clone();
        updated.updated_at = Utc::now();
        brands.insert(brand.id.clone(), updated);
        Ok(())
    }

    fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        let mut campaigns = self.campaigns.write().unwrap();
        if !campaigns.contains_key(&campaign.id) {
            return Err(ControlError::CampaignNotFound(campaign.id.clone()));
        }
        let mut updated = campaign.clone();
        updated.updated_at = Utc::now();
        campaigns.insert(campaign.id.clone(), updated);
        Ok(())
    }

    fn append_event(&self, event: &AuditEvent) -> Result<()> {
        self.events.write().unwrap().push(event.clone());
        Ok(())
    }

    fn events_for_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<AuditEvent>> {
        let mut events: Vec<AuditEvent> = self
            .events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(events)
    }

    fn spend_marker_seen(&self, hash: &str) -> Result<bool> {
        Ok(self.spend_markers.read().unwrap().contains(hash))
    }

    fn record_spend_marker(&self, hash: &str) -> Result<()> {
        self.spend_markers.write().unwrap().insert(hash.to_string());
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn seed_brand(store: &dyn BudgetStore) -> Brand {
        let brand = Brand::new("FashionCo", 500.0, 10_000.0).unwrap();
        store.insert_brand(&brand).unwrap();
        brand
    }

    #[test]
    fn test_sqlite_brand_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let brand = seed_brand(&store);

        let loaded = store.get_brand(&brand.id).unwrap();
        assert_eq!(loaded.name, "FashionCo");
        assert_eq!(loaded.daily_budget, 500.0);
        assert_eq!(loaded.daily_spend, 0.0);

        let by_name = store.get_brand_by_name("FashionCo").unwrap();
        assert!(by_name.is_some());
        assert!(store.get_brand_by_name("Nope").unwrap().is_none());
    }

    #[test]
    fn test_sqlite_campaign_roundtrip_with_dayparting() {
        let store = SqliteStore::open_in_memory().unwrap();
        let brand = seed_brand(&store);

        let campaign =
            Campaign::with_dayparting("Night Owls", &brand.id, hm(22, 0), hm(6, 0)).unwrap();
        store.insert_campaign(&campaign).unwrap();

        let loaded = store.get_campaign(&campaign.id).unwrap();
        assert!(loaded.use_dayparting);
        assert_eq!(loaded.start_hour, Some(hm(22, 0)));
        assert_eq!(loaded.end_hour, Some(hm(6, 0)));
        assert!(loaded.is_active);
    }

    #[test]
    fn test_sqlite_unknown_ids() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert!(matches!(
            store.get_brand("missing"),
            Err(ControlError::BrandNotFound(_))
        ));
        assert!(matches!(
            store.get_campaign("missing"),
            Err(ControlError::CampaignNotFound(_))
        ));
    }

    #[test]
    fn test_sqlite_duplicate_brand_name_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed_brand(&store);

        let dup = Brand::new("FashionCo", 100.0, 1000.0).unwrap();
        assert!(matches!(
            store.insert_brand(&dup),
            Err(ControlError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_sqlite_save_brand_updates_spend() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut brand = seed_brand(&store);

        brand.daily_spend = 200.0;
        brand.monthly_spend = 200.0;
        store.save_brand(&brand).unwrap();

        let loaded = store.get_brand(&brand.id).unwrap();
        assert_eq!(loaded.daily_spend, 200.0);
        assert_eq!(loaded.monthly_spend, 200.0);
    }

    #[test]
    fn test_sqlite_dayparting_filter() {
        let store = SqliteStore::open_in_memory().unwrap();
        let brand = seed_brand(&store);

        let plain = Campaign::new("Plain", &brand.id).unwrap();
        let parted =
            Campaign::with_dayparting("Parted", &brand.id, hm(9, 0), hm(17, 0)).unwrap();
        store.insert_campaign(&plain).unwrap();
        store.insert_campaign(&parted).unwrap();

        let dayparted = store.get_campaigns_using_dayparting().unwrap();
        assert_eq!(dayparted.len(), 1);
        assert_eq!(dayparted[0].name, "Parted");

        let by_brand = store.get_campaigns_by_brand(&brand.id).unwrap();
        assert_eq!(by_brand.len(), 2);
    }

    #[test]
    fn test_sqlite_events() {
        let store = SqliteStore::open_in_memory().unwrap();

        let event = AuditEvent::new(
            "campaign_deactivated",
            "campaign",
            "c-1",
            serde_json::json!({"reason": "budget_exceeded"}),
            "activation_engine",
        );
        store.append_event(&event).unwrap();

        let events = store.events_for_entity("campaign", "c-1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "campaign_deactivated");
    }

    #[test]
    fn test_spend_markers() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert!(!store.spend_marker_seen("abc").unwrap());
        store.record_spend_marker("abc").unwrap();
        assert!(store.spend_marker_seen("abc").unwrap());

        // Recording twice is a no-op
        store.record_spend_marker("abc").unwrap();
        assert!(store.spend_marker_seen("abc").unwrap());
    }

    #[test]
    fn test_memory_store_matches_contract() {
        let store = MemoryStore::new();
        let brand = seed_brand(&store);

        let campaign = Campaign::new("Summer Sale", &brand.id).unwrap();
        store.insert_campaign(&campaign).unwrap();

        assert_eq!(store.get_all_brands().unwrap().len(), 1);
        assert_eq!(store.get_campaigns_by_brand(&brand.id).unwrap().len(), 1);
        assert_eq!(store.get_active_campaigns().unwrap().len(), 1);
        assert!(store.get_campaigns_using_dayparting().unwrap().is_empty());

        assert!(matches!(
            store.get_brand("missing"),
            Err(ControlError::BrandNotFound(_))
        ));

        let dup = Brand::new("FashionCo", 1.0, 2.0).unwrap();
        assert!(store.insert_brand(&dup).is_err());
    }
}
