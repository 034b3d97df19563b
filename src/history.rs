use crate::calc::{Calculation, GatheringSnapshot, MaterialCost};
use crate::errors::StoreError;
use crate::storage::HistoryRepository;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One saved calculation: the normalised inputs, the derived amounts and
/// when it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    pub participant_count: i64,
    pub fee_per_person: i64,
    #[serde(default)]
    pub materials: Vec<MaterialCost>,
    pub venue_fee: i64,
    pub platform_fee_percent: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_profit: Option<i64>,
    pub total_revenue: i64,
    pub materials_cost: i64,
    pub platform_fee_amount: i64,
    pub net_profit: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fee_per_person: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(calculation: Calculation, timestamp: DateTime<Utc>) -> Self {
        let Calculation { snapshot, result } = calculation;
        let GatheringSnapshot {
            title,
            date,
            location,
            participant_count,
            fee_per_person,
            materials,
            venue_fee: _,
            platform_fee_percent,
            target_profit,
        } = snapshot;
        Self {
            title,
            date,
            location,
            participant_count,
            fee_per_person,
            materials,
            venue_fee: result.venue_fee,
            platform_fee_percent,
            target_profit,
            total_revenue: result.total_revenue,
            materials_cost: result.materials_cost,
            platform_fee_amount: result.platform_fee_amount,
            net_profit: result.net_profit,
            suggested_fee_per_person: result.suggested_fee_per_person,
            timestamp,
        }
    }
}

/// Prepend a new entry for `calculation` and persist the whole list.
/// Without a calculation the history is returned unchanged and nothing is
/// written.
pub async fn save_entry(
    repository: &HistoryRepository,
    history: &[HistoryEntry],
    calculation: Option<&Calculation>,
    timestamp: DateTime<Utc>,
) -> Result<Vec<HistoryEntry>, StoreError> {
    let Some(calculation) = calculation else {
        return Ok(history.to_vec());
    };

    let mut updated = Vec::with_capacity(history.len() + 1);
    updated.push(HistoryEntry::new(calculation.clone(), timestamp));
    updated.extend_from_slice(history);
    repository.save(&updated).await?;
    debug!(entries = updated.len(), "saved calculation to history");
    Ok(updated)
}

/// Remove the entry at `index` and persist. Out-of-range indices leave the
/// history untouched.
pub async fn delete_entry(
    repository: &HistoryRepository,
    history: &[HistoryEntry],
    index: usize,
) -> Result<Vec<HistoryEntry>, StoreError> {
    if index >= history.len() {
        return Ok(history.to_vec());
    }

    let mut updated = history.to_vec();
    updated.remove(index);
    repository.save(&updated).await?;
    debug!(index, entries = updated.len(), "deleted history entry");
    Ok(updated)
}
