//! # Cash Desk Demo Seed
//!
//! Creates a company with an admin and an operator, records a day of sales,
//! then walks one session through open, exchange, preview and close,
//! printing each result as JSON.
//!
//! ## Usage
//! ```bash
//! # In-memory database (default)
//! cargo run -p till-engine --bin seed
//!
//! # Keep the result in a file
//! cargo run -p till-engine --bin seed -- --db ./data/till.db
//! ```

use std::env;

use chrono::Utc;
use serde::Serialize;
use till_core::{
    Company, DeclaredCount, Money, MovementTender, Operator, OperatorRole, PaymentTender, Sale,
    SalePayment, SaleRecord, SecretHasher,
};
use till_db::{Database, DbConfig};
use till_engine::{AuthorizationGate, CashDesk, CloseRequest, Identity, DEFAULT_LOG_FILTER};
use uuid::Uuid;

/// Demo admin login, doubling as the fallback manager credential.
const ADMIN_SECRET: &str = "admin-1234";

/// A day at the till: (total, change given, payments).
const SALES: &[(i64, i64, &[(PaymentTender, i64)])] = &[
    (5000, 0, &[(PaymentTender::Cash, 5000)]),
    (8000, 2000, &[(PaymentTender::Cash, 10000)]),
    (3250, 0, &[(PaymentTender::Pix, 3250)]),
    (12990, 0, &[(PaymentTender::Credit, 12990)]),
    (4500, 0, &[(PaymentTender::Cash, 2000), (PaymentTender::Debit, 2500)]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till Cash Desk Demo");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: in-memory)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    till_engine::init_tracing(DEFAULT_LOG_FILTER);

    let config = match &db_path {
        Some(path) => DbConfig::new(path),
        None => DbConfig::in_memory(),
    };
    let db = Database::new(config).await?;
    let hasher = SecretHasher::default();
    let admin_hash = hasher.hash(ADMIN_SECRET)?;
    let desk = CashDesk::new(db.clone(), AuthorizationGate::new(hasher, 4));

    println!("✓ Connected to database");

    // Company and accounts
    let now = Utc::now();
    let company = Company {
        id: Uuid::new_v4().to_string(),
        name: "Mercado Central".to_string(),
        authorization_secret_hash: None,
        created_at: now,
    };
    db.companies().insert_company(&company).await?;

    let admin = Operator {
        id: Uuid::new_v4().to_string(),
        company_id: company.id.clone(),
        name: "Bruno".to_string(),
        role: OperatorRole::Admin,
        credential_hash: Some(admin_hash),
        created_at: now,
    };
    let operator = Operator {
        id: Uuid::new_v4().to_string(),
        name: "Ana".to_string(),
        role: OperatorRole::Operator,
        credential_hash: None,
        ..admin.clone()
    };
    db.companies().insert_operator(&admin).await?;
    db.companies().insert_operator(&operator).await?;

    let me = Identity::new(&operator.id, &company.id);
    let boss = Identity::new(&admin.id, &company.id);
    println!("✓ Created company {} with admin and operator", company.name);

    // Shift
    let session = desk.open(&me, "100.00".parse()?).await?;
    print_json("Opened", &session)?;

    for (total, change, payments) in SALES {
        db.sales()
            .insert_record(&sale_record(&me, *total, *change, payments))
            .await?;
    }
    println!("✓ Recorded {} sales", SALES.len());

    desk.record_withdrawal(&me, "30.00".parse()?, MovementTender::Cash, "Bank deposit")
        .await?;

    let receipt = desk
        .exchange_electronic_for_cash(&me, "115.00".parse()?, "100.00".parse()?)
        .await?;
    print_json("Tender exchange", &receipt)?;

    print_json("Status", &desk.get_status(&me).await?)?;

    // Count comes in 5.00 short in cash
    let status = desk
        .get_status(&me)
        .await?
        .ok_or("session vanished before closing")?;
    let declared_cash = status.balances.cash - Money::from_cents(500);
    let declared_electronic = status.balances.electronic;

    let preview = desk
        .preview_close(&me, DeclaredCount::new(declared_cash, declared_electronic)?)
        .await?;
    print_json("Preview", &preview)?;

    let closed = desk
        .close(
            &me,
            CloseRequest::new(declared_cash, declared_electronic)
                .justification("5.00 note given as change twice")
                .credential(ADMIN_SECRET),
        )
        .await?;
    print_json("Closed", &closed)?;

    print_json("Audit", &desk.closed_sessions(&boss, 10).await?)?;

    println!();
    println!("✓ Demo complete!");

    Ok(())
}

fn sale_record(
    identity: &Identity,
    total: i64,
    change: i64,
    payments: &[(PaymentTender, i64)],
) -> SaleRecord {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    SaleRecord {
        sale: Sale {
            id: id.clone(),
            company_id: identity.company_id.clone(),
            operator_id: identity.operator_id.clone(),
            total_cents: total,
            change_cents: change,
            legacy_tender: None,
            notes: None,
            created_at: now,
        },
        payments: payments
            .iter()
            .map(|(tender, amount)| SalePayment {
                id: Uuid::new_v4().to_string(),
                sale_id: id.clone(),
                tender: *tender,
                amount_cents: *amount,
                created_at: now,
            })
            .collect(),
    }
}

fn print_json(title: &str, value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!();
    println!("── {title} ──");
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
