use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::models::LeadRecord;

pub fn insert_lead(conn: &Connection, record: &LeadRecord) -> anyhow::Result<()> {
    let product_interest = serde_json::to_string(&record.product_interest)?;
    let captured_at = record.captured_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO leads (id, org_id, branch_id, name, email, phone, product_interest, interest_reason, budget_expectation, lead_status, captured_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            record.id,
            record.org_id,
            record.branch_id,
            record.name,
            record.email,
            record.phone,
            product_interest,
            record.interest_reason,
            record.budget_expectation,
            record.lead_status,
            captured_at,
        ],
    )?;
    Ok(())
}

pub fn list_leads(
    conn: &Connection,
    org_id: &str,
    branch_id: &str,
) -> anyhow::Result<Vec<LeadRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, org_id, branch_id, name, email, phone, product_interest, interest_reason, budget_expectation, lead_status, captured_at
         FROM leads WHERE org_id = ?1 AND branch_id = ?2 ORDER BY captured_at DESC",
    )?;

    let rows = stmt.query_map(params![org_id, branch_id], |row| {
        let product_json: String = row.get(6)?;
        let captured_at_str: String = row.get(10)?;
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            product_json,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, String>(9)?,
            captured_at_str,
        ))
    })?;

    let mut leads = Vec::new();
    for row in rows {
        let (
            id,
            org_id,
            branch_id,
            name,
            email,
            phone,
            product_json,
            interest_reason,
            budget_expectation,
            lead_status,
            captured_at_str,
        ) = row?;

        let product_interest: Vec<String> =
            serde_json::from_str(&product_json).unwrap_or_default();
        let captured_at = NaiveDateTime::parse_from_str(&captured_at_str, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_else(|_| chrono::Utc::now().naive_utc());

        leads.push(LeadRecord {
            id,
            org_id,
            branch_id,
            name,
            email,
            phone,
            product_interest,
            interest_reason,
            budget_expectation,
            lead_status,
            captured_at,
        });
    }
    Ok(leads)
}
