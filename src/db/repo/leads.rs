//! Lead CRUD and rate-context hydration.

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::Row;

use crate::domain::{
    BuildingRateContext, CommissionRate, Lead, LeadRateContext, LeadStatus, Money, NewLead, Rate,
    RateAssignment, UnitTypeRateContext,
};

use super::{decode_decimal_column, Repository};

const LEAD_CONTEXT_SELECT: &str = r#"
    SELECT
        l.id, l.broker_id, l.total_amount, l.commission_pct, l.commission,
        l.status, l.unit_id, l.building_unit_type_id, l.building_id,
        l.base_rate_id,
        b.id AS b_id,
        br.id AS br_id, br.name AS br_name, br.percentage AS br_percentage,
        br.active AS br_active
    FROM leads l
    LEFT JOIN buildings b ON b.id = l.building_id
    LEFT JOIN commission_rates br ON br.id = b.rate_id
"#;

impl Repository {
    /// Register a new lead. Commission starts at zero until the lead is
    /// delivered or a recalculation pass resolves a rate for it.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_lead(&self, lead: &NewLead) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO leads (
                broker_id, total_amount, commission_pct, commission, status,
                unit_id, building_unit_type_id, building_id, base_rate_id
            ) VALUES (?, ?, '0', '0', ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(lead.broker_id)
        .bind(lead.total_amount.to_canonical_string())
        .bind(lead.status.as_str())
        .bind(lead.unit_id)
        .bind(lead.building_unit_type_id)
        .bind(lead.building_id)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a single lead.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_lead(&self, lead_id: i64) -> Result<Option<Lead>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, broker_id, total_amount, commission_pct, commission,
                   status, unit_id, building_unit_type_id, building_id,
                   base_rate_id
            FROM leads
            WHERE id = ?
            "#,
        )
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| lead_from_row(&row)).transpose()
    }

    /// Persist every mutable column of a lead. Used by the typed admin edit
    /// path; batch recalculation goes through `update_lead_commission`.
    ///
    /// # Errors
    /// Returns `RowNotFound` if the lead does not exist.
    pub async fn save_lead(&self, lead: &Lead) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET broker_id = ?, total_amount = ?, commission_pct = ?,
                commission = ?, status = ?, unit_id = ?,
                building_unit_type_id = ?, building_id = ?, base_rate_id = ?
            WHERE id = ?
            "#,
        )
        .bind(lead.broker_id)
        .bind(lead.total_amount.to_canonical_string())
        .bind(lead.commission_pct.to_canonical_string())
        .bind(lead.commission.to_canonical_string())
        .bind(lead.status.as_str())
        .bind(lead.unit_id)
        .bind(lead.building_unit_type_id)
        .bind(lead.building_id)
        .bind(lead.base_rate_id)
        .bind(lead.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Persist a recomputed commission and the rate record that produced it.
    ///
    /// # Errors
    /// Returns `RowNotFound` if the lead does not exist.
    pub async fn update_lead_commission(
        &self,
        lead_id: i64,
        commission: Money,
        source_rate_id: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET commission = ?, base_rate_id = ?
            WHERE id = ?
            "#,
        )
        .bind(commission.to_canonical_string())
        .bind(source_rate_id)
        .bind(lead_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Load all delivered leads hydrated with their rate context: building
    /// (with its rate) joined in one query, active unit-type assignments
    /// batched in a second.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub async fn load_delivered_leads_with_rate_context(
        &self,
    ) -> Result<Vec<LeadRateContext>, sqlx::Error> {
        let sql = format!("{} WHERE l.status = ? ORDER BY l.id", LEAD_CONTEXT_SELECT);
        let rows = sqlx::query(&sql)
            .bind(LeadStatus::Delivered.as_str())
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_contexts(&rows).await
    }

    /// Load one lead's rate context regardless of status. Used by the lead
    /// edit path to recompute commission on delivery.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub async fn load_lead_rate_context(
        &self,
        lead_id: i64,
    ) -> Result<Option<LeadRateContext>, sqlx::Error> {
        let sql = format!("{} WHERE l.id = ?", LEAD_CONTEXT_SELECT);
        let rows = sqlx::query(&sql)
            .bind(lead_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(self.hydrate_contexts(&rows).await?.into_iter().next())
    }

    async fn hydrate_contexts(
        &self,
        rows: &[sqlx::sqlite::SqliteRow],
    ) -> Result<Vec<LeadRateContext>, sqlx::Error> {
        let mut leads = Vec::with_capacity(rows.len());
        let mut unit_type_ids = Vec::new();

        for row in rows {
            let lead = lead_from_row(row)?;

            let building = match row.get::<Option<i64>, _>("b_id") {
                Some(building_id) => {
                    let rate = match row.get::<Option<i64>, _>("br_id") {
                        Some(rate_id) => Some(CommissionRate {
                            id: rate_id,
                            name: row.get("br_name"),
                            percentage: Rate::from_str(row.get::<&str, _>("br_percentage"))
                                .map_err(|e| decode_decimal_column("br_percentage", e))?,
                            active: row.get::<i64, _>("br_active") != 0,
                        }),
                        None => None,
                    };
                    Some(BuildingRateContext { building_id, rate })
                }
                None => None,
            };

            if let Some(id) = lead.building_unit_type_id {
                unit_type_ids.push(id);
            }
            leads.push((lead, building));
        }

        let assignments = self.active_assignments_for(&unit_type_ids).await?;

        Ok(leads
            .into_iter()
            .map(|(lead, building)| {
                let unit_type = lead.building_unit_type_id.map(|id| UnitTypeRateContext {
                    building_unit_type_id: id,
                    active_assignments: assignments.get(&id).cloned().unwrap_or_default(),
                });
                LeadRateContext {
                    lead,
                    unit_type,
                    building,
                }
            })
            .collect())
    }

    /// Active rate assignments for a set of unit-type links, grouped by
    /// link id, in assignment-id order.
    async fn active_assignments_for(
        &self,
        unit_type_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<RateAssignment>>, sqlx::Error> {
        if unit_type_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; unit_type_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT a.id, a.building_unit_type_id, a.active,
                   r.id AS r_id, r.name AS r_name, r.percentage AS r_percentage,
                   r.active AS r_active
            FROM rate_assignments a
            JOIN commission_rates r ON r.id = a.rate_id
            WHERE a.active = 1 AND a.building_unit_type_id IN ({})
            ORDER BY a.building_unit_type_id, a.id
            "#,
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in unit_type_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i64, Vec<RateAssignment>> = HashMap::new();
        for row in rows {
            let assignment = RateAssignment {
                id: row.get("id"),
                building_unit_type_id: row.get("building_unit_type_id"),
                rate: CommissionRate {
                    id: row.get("r_id"),
                    name: row.get("r_name"),
                    percentage: Rate::from_str(row.get::<&str, _>("r_percentage"))
                        .map_err(|e| decode_decimal_column("r_percentage", e))?,
                    active: row.get::<i64, _>("r_active") != 0,
                },
                active: row.get::<i64, _>("active") != 0,
            };
            grouped
                .entry(assignment.building_unit_type_id)
                .or_default()
                .push(assignment);
        }
        Ok(grouped)
    }
}

fn lead_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, sqlx::Error> {
    let status_str: &str = row.get("status");
    let status = LeadStatus::from_str(status_str).map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: Box::new(e),
    })?;

    Ok(Lead {
        id: row.get("id"),
        broker_id: row.get("broker_id"),
        total_amount: Money::from_str(row.get::<&str, _>("total_amount"))
            .map_err(|e| decode_decimal_column("total_amount", e))?,
        commission_pct: Rate::from_str(row.get::<&str, _>("commission_pct"))
            .map_err(|e| decode_decimal_column("commission_pct", e))?,
        commission: Money::from_str(row.get::<&str, _>("commission"))
            .map_err(|e| decode_decimal_column("commission", e))?,
        status,
        unit_id: row.get("unit_id"),
        building_unit_type_id: row.get("building_unit_type_id"),
        building_id: row.get("building_id"),
        base_rate_id: row.get("base_rate_id"),
    })
}
