use crate::config::schema::SplitRule;
use crate::model::JobRecord;
use tracing::debug;

/// Sub-instance a split rule assigns to a kilobyte figure.
pub fn split_instance(rule: &SplitRule, kilobytes: u64) -> &str {
    rule.ranges
        .iter()
        .find(|r| r.min <= kilobytes && kilobytes < r.max)
        .map(|r| r.instance.as_str())
        .unwrap_or(&rule.default_instance)
}

/// File records of split policies under their sub-instance.
///
/// Must run before grouping. Records without a kilobyte figure keep their
/// original instance.
pub fn reclassify(records: &[JobRecord], rules: &[SplitRule]) -> Vec<JobRecord> {
    records
        .iter()
        .map(|record| {
            let rule = rules.iter().find(|r| r.policy == record.key.policy);
            match (rule, record.kilobytes) {
                (Some(rule), Some(kb)) => {
                    let instance = split_instance(rule, kb);
                    debug!(job_id = %record.job_id, kilobytes = kb, instance, "split job");
                    record.with_instance(instance)
                }
                _ => record.clone(),
            }
        })
        .collect()
}
