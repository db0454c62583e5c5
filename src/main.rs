use anyhow::Result;
use chrono::NaiveTime;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use campaign_control::{
    apply_spend_records, load_spend_records, Brand, BudgetStore, Campaign, ControlService,
    SqliteStore,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("seed") => run_seed(),
        Some("import") => {
            let path = args.get(2).map(PathBuf::from);
            run_import(path)
        }
        Some("sweep") => run_sweep(),
        Some("status") | None => run_status(),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: campaign-control [seed | import <report.csv> | sweep | status]");
            std::process::exit(2);
        }
    }
}

fn db_path() -> PathBuf {
    env::var("CAMPAIGN_CONTROL_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("campaigns.db"))
}

fn open_service() -> Result<(ControlService, Arc<dyn BudgetStore>)> {
    let store: Arc<dyn BudgetStore> = Arc::new(SqliteStore::open(db_path())?);
    let service = ControlService::new(store.clone());
    Ok((service, store))
}

fn run_seed() -> Result<()> {
    println!("🔧 Seeding demo brands and campaigns...");

    let store: Arc<dyn BudgetStore> = Arc::new(SqliteStore::open(db_path())?);

    let fashion = Brand::new("FashionCo", 500.0, 12_000.0)?;
    let tech = Brand::new("TechGadgets", 800.0, 20_000.0)?;
    let gourmet = Brand::new("GourmetFood", 300.0, 8_000.0)?;

    for brand in [&fashion, &tech, &gourmet] {
        store.insert_brand(brand)?;
        println!("✓ Brand: {} ({})", brand.name, brand.id);
    }

    let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();

    let campaigns = vec![
        Campaign::new("Summer Sale", &fashion.id)?,
        Campaign::new("New Arrivals", &fashion.id)?,
        Campaign::with_dayparting("Business Hours Promo", &tech.id, hm(9, 0), hm(17, 0))?,
        Campaign::with_dayparting("Evening Special", &tech.id, hm(18, 0), hm(23, 0))?,
        Campaign::with_dayparting("Late Night Snacks", &gourmet.id, hm(22, 0), hm(6, 0))?,
        Campaign::new("Healthy Breakfast", &gourmet.id)?,
    ];

    for campaign in &campaigns {
        store.insert_campaign(campaign)?;
        match campaign.daypart_window() {
            Some((start, end)) => println!(
                "✓ Campaign: {} ({}-{})",
                campaign.name,
                start.format("%H:%M"),
                end.format("%H:%M")
            ),
            None => println!("✓ Campaign: {}", campaign.name),
        }
    }

    println!("\n✅ Seed complete: 3 brands, {} campaigns", campaigns.len());
    Ok(())
}

fn run_import(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => {
            eprintln!("Usage: campaign-control import <report.csv>");
            std::process::exit(2);
        }
    };

    println!("📂 Importing spend report: {}", path.display());

    let (service, _store) = open_service()?;
    let records = load_spend_records(Path::new(&path))?;
    println!("✓ Loaded {} spend rows", records.len());

    let summary = apply_spend_records(&service, &records)?;
    println!("✓ Applied: {}", summary.applied);
    println!("✓ Skipped duplicates: {}", summary.duplicates);
    if summary.rejected > 0 {
        println!("⚠ Rejected: {}", summary.rejected);
    }

    Ok(())
}

fn run_sweep() -> Result<()> {
    println!("🔍 Running budget + dayparting sweeps...");

    let (service, _store) = open_service()?;

    let budget = service.on_budget_sweep_tick()?;
    println!(
        "✓ Budget sweep: {} evaluated, {} deactivated",
        budget.evaluated, budget.deactivated
    );

    let daypart = service.on_daypart_sweep_tick()?;
    println!(
        "✓ Daypart sweep: {} evaluated, {} activated, {} deactivated",
        daypart.evaluated, daypart.activated, daypart.deactivated
    );

    Ok(())
}

fn run_status() -> Result<()> {
    let (_service, store) = open_service()?;

    let brands = store.get_all_brands()?;
    if brands.is_empty() {
        println!("No brands yet. Run: campaign-control seed");
        return Ok(());
    }

    for brand in brands {
        println!("\nBrand: {}", brand.name);
        println!(
            "  Daily:   ${:.2} spent of ${:.2}{}",
            brand.daily_spend,
            brand.daily_budget,
            if brand.is_daily_exceeded() { "  [EXCEEDED]" } else { "" }
        );
        println!(
            "  Monthly: ${:.2} spent of ${:.2}{}",
            brand.monthly_spend,
            brand.monthly_budget,
            if brand.is_monthly_exceeded() { "  [EXCEEDED]" } else { "" }
        );

        println!("  Campaigns:");
        for campaign in store.get_campaigns_by_brand(&brand.id)? {
            let state = if campaign.is_active { "ACTIVE" } else { "INACTIVE" };
            match campaign.daypart_window() {
                Some((start, end)) => println!(
                    "    - {} ({}): {}-{}",
                    campaign.name,
                    state,
                    start.format("%H:%M"),
                    end.format("%H:%M")
                ),
                None => println!("    - {} ({})", campaign.name, state),
            }
        }
    }

    Ok(())
}
