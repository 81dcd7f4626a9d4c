use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range of one named column inside a fixed-width line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub name: String,
    pub start: usize,
    /// Exclusive. For the last column this is the header length; data rows
    /// read the last column through to their own end-of-line.
    pub end: usize,
}

/// Which report row a job contributes to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryKey {
    pub policy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl CategoryKey {
    pub fn new(policy: impl Into<String>, instance: Option<&str>) -> Self {
        CategoryKey {
            policy: policy.into(),
            instance: instance.map(str::to_string),
        }
    }

    /// A key matches a record when the policies are equal and, if the key
    /// names an instance, the record's instance contains it (ignoring case).
    pub fn matches(&self, record: &JobRecord) -> bool {
        if record.key.policy != self.policy {
            return false;
        }
        match &self.instance {
            None => true,
            Some(wanted) => record
                .key
                .instance
                .as_deref()
                .map(|have| have.to_lowercase().contains(&wanted.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}/{}", self.policy, instance),
            None => write!(f, "{}", self.policy),
        }
    }
}

/// One accepted data row of the job export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub key: CategoryKey,
    pub client: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    /// Raw kilobyte count recovered from the line.
    pub kilobytes: Option<u64>,
    /// Capacity in GB, rounded to 2 decimals.
    pub capacity_gb: Option<Decimal>,
    pub pathname: String,
    /// 1-based line number in the export.
    pub line_number: usize,
}

impl JobRecord {
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end.map(|dt| dt.date())
    }

    /// Copy of this record filed under a different instance.
    pub fn with_instance(&self, instance: &str) -> JobRecord {
        JobRecord {
            key: CategoryKey::new(self.key.policy.clone(), Some(instance)),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub key: CategoryKey,
    /// Most recent end date among qualifying records.
    pub date: NaiveDate,
    pub total_gb: Decimal,
    pub job_count: usize,
}
