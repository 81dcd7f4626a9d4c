pub mod split;

use crate::config::schema::RowDef;
use crate::model::{CategoryKey, CategoryTotal, JobRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Total for one report row; `total` is absent when no job qualified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowTotal {
    pub label: String,
    pub key: CategoryKey,
    pub total: Option<CategoryTotal>,
}

/// Sum the capacity of the most recent day's jobs among `records`.
///
/// Only records carrying both an end time and a capacity take part; the
/// representative date is the latest end date among them, and every
/// qualifying record ending that day contributes.
pub fn latest_day_total<'a, I>(key: &CategoryKey, records: I) -> Option<CategoryTotal>
where
    I: IntoIterator<Item = &'a JobRecord>,
{
    let qualifying: Vec<(NaiveDate, Decimal)> = records
        .into_iter()
        .filter_map(|r| Some((r.end_date()?, r.capacity_gb?)))
        .collect();

    let date = qualifying.iter().map(|(d, _)| *d).max()?;
    let on_date: Vec<Decimal> = qualifying
        .iter()
        .filter(|(d, _)| *d == date)
        .map(|(_, gb)| *gb)
        .collect();

    Some(CategoryTotal {
        key: key.clone(),
        date,
        total_gb: on_date.iter().sum::<Decimal>().round_dp(2),
        job_count: on_date.len(),
    })
}

/// Total for the records matching `key` (see [`CategoryKey::matches`]).
pub fn total_for_key(records: &[JobRecord], key: &CategoryKey) -> Option<CategoryTotal> {
    latest_day_total(key, records.iter().filter(|r| key.matches(r)))
}

/// Totals grouped by each record's exact key.
pub fn totals_by_key(records: &[JobRecord]) -> BTreeMap<CategoryKey, CategoryTotal> {
    let mut groups: BTreeMap<&CategoryKey, Vec<&JobRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(&record.key).or_default().push(record);
    }

    groups
        .into_iter()
        .filter_map(|(key, members)| {
            latest_day_total(key, members).map(|total| (key.clone(), total))
        })
        .collect()
}

/// Totals for each configured report row, in row order.
pub fn row_totals(records: &[JobRecord], rows: &[RowDef]) -> Vec<RowTotal> {
    rows.iter()
        .map(|row| {
            let key = CategoryKey::new(row.policy.clone(), row.instance.as_deref());
            let total = total_for_key(records, &key);
            match &total {
                Some(t) => debug!(label = %row.label, date = %t.date, total_gb = %t.total_gb, jobs = t.job_count, "row total"),
                None => debug!(label = %row.label, "no qualifying jobs for row"),
            }
            RowTotal {
                label: row.label.clone(),
                key,
                total,
            }
        })
        .collect()
}
