//! Rate, building, assignment, and scheduled-change operations.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::domain::{
    Building, BuildingUnitType, ChangeTarget, CommissionRate, Rate, RateAssignment,
    ScheduledRateChange,
};

use super::{decode_decimal_column, Repository};

impl Repository {
    // =========================================================================
    // Commission rates
    // =========================================================================

    /// Create a rate definition. `percentage` is a fraction (0.03 = 3%).
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_commission_rate(
        &self,
        name: &str,
        percentage: Rate,
        active: bool,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO commission_rates (name, percentage, active) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(percentage.to_canonical_string())
        .bind(active as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a rate definition.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_commission_rate(
        &self,
        rate_id: i64,
    ) -> Result<Option<CommissionRate>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, name, percentage, active FROM commission_rates WHERE id = ?",
        )
        .bind(rate_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(CommissionRate {
                id: row.get("id"),
                name: row.get("name"),
                percentage: Rate::from_str(row.get::<&str, _>("percentage"))
                    .map_err(|e| decode_decimal_column("percentage", e))?,
                active: row.get::<i64, _>("active") != 0,
            })
        })
        .transpose()
    }

    // =========================================================================
    // Buildings and unit-type links
    // =========================================================================

    /// Create a building, optionally with a directly-assigned rate.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_building(
        &self,
        name: &str,
        rate_id: Option<i64>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO buildings (name, rate_id) VALUES (?, ?)")
            .bind(name)
            .bind(rate_id)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a building.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_building(&self, building_id: i64) -> Result<Option<Building>, sqlx::Error> {
        let row = sqlx::query("SELECT id, name, rate_id FROM buildings WHERE id = ?")
            .bind(building_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Building {
            id: row.get("id"),
            name: row.get("name"),
            rate_id: row.get("rate_id"),
        }))
    }

    /// Create a unit-type-within-building association.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_building_unit_type(
        &self,
        building_id: i64,
        unit_type_name: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO building_unit_types (building_id, unit_type_name) VALUES (?, ?)",
        )
        .bind(building_id)
        .bind(unit_type_name)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a unit-type link.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_building_unit_type(
        &self,
        building_unit_type_id: i64,
    ) -> Result<Option<BuildingUnitType>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, building_id, unit_type_name FROM building_unit_types WHERE id = ?",
        )
        .bind(building_unit_type_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| BuildingUnitType {
            id: row.get("id"),
            building_id: row.get("building_id"),
            unit_type_name: row.get("unit_type_name"),
        }))
    }

    /// Link a unit-type association to a rate.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_rate_assignment(
        &self,
        building_unit_type_id: i64,
        rate_id: i64,
        active: bool,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO rate_assignments (building_unit_type_id, rate_id, active) VALUES (?, ?, ?)",
        )
        .bind(building_unit_type_id)
        .bind(rate_id)
        .bind(active as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Active assignments for one unit-type link, in assignment-id order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn active_rate_assignments(
        &self,
        building_unit_type_id: i64,
    ) -> Result<Vec<RateAssignment>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.building_unit_type_id, a.active,
                   r.id AS r_id, r.name AS r_name, r.percentage AS r_percentage,
                   r.active AS r_active
            FROM rate_assignments a
            JOIN commission_rates r ON r.id = a.rate_id
            WHERE a.active = 1 AND a.building_unit_type_id = ?
            ORDER BY a.id
            "#,
        )
        .bind(building_unit_type_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(RateAssignment {
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
                })
            })
            .collect()
    }

    /// Set a building's directly-assigned rate.
    ///
    /// # Errors
    /// Returns `RowNotFound` if the building does not exist.
    pub async fn assign_building_rate(
        &self,
        building_id: i64,
        rate_id: i64,
    ) -> Result<(), sqlx::Error> {
        let result = sqlx::query("UPDATE buildings SET rate_id = ? WHERE id = ?")
            .bind(rate_id)
            .bind(building_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    /// Replace a unit-type association's active assignment with one for the
    /// given rate. Old assignments stay as inactive history.
    ///
    /// # Errors
    /// Returns `RowNotFound` if the association does not exist.
    pub async fn assign_unit_type_rate(
        &self,
        building_unit_type_id: i64,
        rate_id: i64,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM building_unit_types WHERE id = ?")
            .bind(building_unit_type_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query("UPDATE rate_assignments SET active = 0 WHERE building_unit_type_id = ?")
            .bind(building_unit_type_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO rate_assignments (building_unit_type_id, rate_id, active) VALUES (?, ?, 1)",
        )
        .bind(building_unit_type_id)
        .bind(rate_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Scheduled changes
    // =========================================================================

    /// Schedule a rate change for a future (or past) effective time.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_scheduled_change(
        &self,
        effective_at: DateTime<Utc>,
        target: ChangeTarget,
        new_rate_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let (building_id, building_unit_type_id) = match target {
            ChangeTarget::Building(id) => (Some(id), None),
            ChangeTarget::UnitType(id) => (None, Some(id)),
            ChangeTarget::Global => (None, None),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO scheduled_rate_changes
                (effective_at_ms, building_id, building_unit_type_id, new_rate_id, executed)
            VALUES (?, ?, ?, ?, 0)
            "#,
        )
        .bind(effective_at.timestamp_millis())
        .bind(building_id)
        .bind(building_unit_type_id)
        .bind(new_rate_id)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a scheduled change.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_scheduled_change(
        &self,
        change_id: i64,
    ) -> Result<Option<ScheduledRateChange>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, effective_at_ms, building_id, building_unit_type_id,
                   new_rate_id, executed
            FROM scheduled_rate_changes
            WHERE id = ?
            "#,
        )
        .bind(change_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| scheduled_change_from_row(&row)).transpose()
    }

    /// Unexecuted changes due at or before `now`, earliest-due first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn load_due_scheduled_changes(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledRateChange>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, effective_at_ms, building_id, building_unit_type_id,
                   new_rate_id, executed
            FROM scheduled_rate_changes
            WHERE executed = 0 AND effective_at_ms <= ?
            ORDER BY effective_at_ms ASC, id ASC
            "#,
        )
        .bind(now.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(scheduled_change_from_row).collect()
    }

    /// Flip a change's executed flag to true.
    ///
    /// # Errors
    /// Returns `RowNotFound` if the change does not exist.
    pub async fn mark_change_executed(&self, change_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("UPDATE scheduled_rate_changes SET executed = 1 WHERE id = ?")
            .bind(change_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}

fn scheduled_change_from_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ScheduledRateChange, sqlx::Error> {
    let effective_at_ms: i64 = row.get("effective_at_ms");
    let effective_at = DateTime::<Utc>::from_timestamp_millis(effective_at_ms).ok_or_else(|| {
        sqlx::Error::ColumnDecode {
            index: "effective_at_ms".to_string(),
            source: format!("timestamp out of range: {}", effective_at_ms).into(),
        }
    })?;

    let target = match (
        row.get::<Option<i64>, _>("building_id"),
        row.get::<Option<i64>, _>("building_unit_type_id"),
    ) {
        (Some(building_id), _) => ChangeTarget::Building(building_id),
        (None, Some(unit_type_id)) => ChangeTarget::UnitType(unit_type_id),
        (None, None) => ChangeTarget::Global,
    };

    Ok(ScheduledRateChange {
        id: row.get("id"),
        effective_at,
        target,
        new_rate_id: row.get("new_rate_id"),
        executed: row.get::<i64, _>("executed") != 0,
    })
}
