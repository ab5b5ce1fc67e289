//! Region and task aggregation.
//!
//! This module builds the derived tables (region totals, task totals and
//! the region×task crosstab) from a record set, plus a few rankings used
//! by the report renderers.

use crate::analysis::normalizer::{region_of, status_class_of, status_of, task_of};
use crate::models::{percent, Record, RegionSummary, Summaries, TaskSummary};
use indexmap::IndexMap;

/// Aggregate a record set into region and task summaries.
///
/// Keys keep their first-seen order, so the same input always yields the
/// same output in the same order. Empty input gives empty summaries.
pub fn aggregate(records: &[Record]) -> Summaries {
    let mut regions: IndexMap<String, RegionSummary> = IndexMap::new();
    let mut tasks: IndexMap<String, TaskSummary> = IndexMap::new();

    for record in records {
        let region = region_of(record);
        let task = task_of(record);

        let summary = regions
            .entry(region.clone())
            .or_insert_with(|| RegionSummary::new(region));
        summary.total_count += 1;
        *summary.task_counts.entry(task.clone()).or_default() += 1;
        summary.status.add(status_class_of(record));

        let task_summary = tasks
            .entry(task.clone())
            .or_insert_with(|| TaskSummary::new(task));
        task_summary.total_count += 1;
        *task_summary.statuses.entry(status_of(record)).or_default() += 1;
    }

    Summaries {
        regions: regions.into_values().collect(),
        tasks: tasks.into_values().collect(),
    }
}

/// Share of all counted records carried by `task`, as a percentage.
pub fn task_share(summaries: &Summaries, task: &TaskSummary) -> f64 {
    let total: usize = summaries.tasks.iter().map(|t| t.total_count).sum();
    percent(task.total_count, total)
}

/// Get the top N regions by record count (stable for ties).
pub fn top_regions(summaries: &Summaries, n: usize) -> Vec<&RegionSummary> {
    let mut sorted: Vec<&RegionSummary> = summaries.regions.iter().collect();
    sorted.sort_by_key(|r| std::cmp::Reverse(r.total_count));
    sorted.truncate(n);
    sorted
}

/// Get the top N tasks by record count (stable for ties).
pub fn top_tasks(summaries: &Summaries, n: usize) -> Vec<&TaskSummary> {
    let mut sorted: Vec<&TaskSummary> = summaries.tasks.iter().collect();
    sorted.sort_by_key(|t| std::cmp::Reverse(t.total_count));
    sorted.truncate(n);
    sorted
}

/// Number of distinct regions each task appears in.
pub fn regions_per_task(summaries: &Summaries) -> IndexMap<&str, usize> {
    let mut spread: IndexMap<&str, usize> = summaries
        .tasks
        .iter()
        .map(|t| (t.task.as_str(), 0))
        .collect();

    for region in &summaries.regions {
        for task in region.task_counts.keys() {
            if let Some(count) = spread.get_mut(task.as_str()) {
                *count += 1;
            }
        }
    }

    spread
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{record, Value, UNSPECIFIED};

    fn scenario_records() -> Vec<Record> {
        vec![
            record([("Region", "East"), ("Task", "Install")]),
            record([("Region", "East"), ("Task", "Repair")]),
            record([("Region", "West"), ("Task", "Install")]),
        ]
    }

    #[test]
    fn test_aggregate_scenario() {
        let summaries = aggregate(&scenario_records());

        assert_eq!(summaries.distinct_regions(), vec!["East", "West"]);
        let east = summaries.region("East").unwrap();
        assert_eq!(east.total_count, 2);
        assert_eq!(east.task_counts.get("Install"), Some(&1));
        assert_eq!(east.task_counts.get("Repair"), Some(&1));

        let west = summaries.region("West").unwrap();
        assert_eq!(west.total_count, 1);
        assert_eq!(west.task_counts.get("Install"), Some(&1));
        assert_eq!(west.task_counts.len(), 1);

        assert_eq!(summaries.distinct_tasks(), vec!["Install", "Repair"]);
        assert_eq!(summaries.task("Install").unwrap().total_count, 2);
        assert_eq!(summaries.task("Repair").unwrap().total_count, 1);
    }

    #[test]
    fn test_missing_region_counts_as_unspecified() {
        let records = vec![
            record([("Region", "East"), ("Task", "Install")]),
            record([("Task", "Repair")]),
        ];

        let summaries = aggregate(&records);
        let unspecified = summaries.region(UNSPECIFIED).unwrap();
        assert_eq!(unspecified.total_count, 1);
        assert_eq!(unspecified.task_counts.get("Repair"), Some(&1));
    }

    #[test]
    fn test_empty_input() {
        let summaries = aggregate(&[]);
        assert!(summaries.is_empty());
        assert_eq!(summaries.total_records(), 0);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let records: Vec<Record> = (0..200)
            .map(|i| {
                record([
                    ("Region", Value::from(format!("R{}", (i * 7) % 13))),
                    ("Task", Value::from(format!("T{}", (i * 3) % 11))),
                ])
            })
            .collect();

        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn test_counts_sum_to_record_count() {
        let records: Vec<Record> = (0..57)
            .map(|i| {
                let mut rec = record([("Task", Value::from(format!("T{}", i % 4)))]);
                if i % 5 != 0 {
                    rec.insert("Region".to_string(), Value::from(format!("R{}", i % 3)));
                }
                rec
            })
            .collect();

        let summaries = aggregate(&records);
        let region_total: usize = summaries.regions.iter().map(|r| r.total_count).sum();
        let task_total: usize = summaries.tasks.iter().map(|t| t.total_count).sum();
        assert_eq!(region_total, records.len());
        assert_eq!(task_total, records.len());

        for region in &summaries.regions {
            assert_eq!(region.total_count, region.task_counts.values().sum::<usize>());
            assert_eq!(region.total_count, region.status.total());
        }
        for task in &summaries.tasks {
            assert_eq!(task.total_count, task.statuses.values().sum::<usize>());
        }
    }

    #[test]
    fn test_status_breakdown() {
        let records = vec![
            record([("Region", "East"), ("Task", "Install"), ("Status", "Completed")]),
            record([("Region", "East"), ("Task", "Install"), ("Status", "Urgent")]),
            record([("Region", "East"), ("Task", "Repair"), ("Status", "Open")]),
            record([("Region", "West"), ("Task", "Install")]),
        ];
        let summaries = aggregate(&records);

        let east = summaries.region("East").unwrap();
        assert_eq!(east.status.completed, 1);
        assert_eq!(east.status.urgent, 1);
        assert_eq!(east.status.pending, 1);
        assert_eq!(summaries.region("West").unwrap().status.pending, 1);

        let install = summaries.task("Install").unwrap();
        assert_eq!(install.statuses.get("Completed"), Some(&1));
        assert_eq!(install.statuses.get("Urgent"), Some(&1));
        assert_eq!(install.statuses.get("Unknown"), Some(&1));
        assert_eq!(task_share(&summaries, install), 75.0);
    }

    #[test]
    fn test_top_regions_and_tasks() {
        let records = vec![
            record([("Region", "West"), ("Task", "Survey")]),
            record([("Region", "East"), ("Task", "Install")]),
            record([("Region", "East"), ("Task", "Install")]),
        ];
        let summaries = aggregate(&records);

        let top = top_regions(&summaries, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].region, "East");

        let tasks = top_tasks(&summaries, 5);
        assert_eq!(tasks[0].task, "Install");
        assert_eq!(tasks[1].task, "Survey");
    }

    #[test]
    fn test_regions_per_task() {
        let summaries = aggregate(&scenario_records());
        let spread = regions_per_task(&summaries);
        assert_eq!(spread.get("Install"), Some(&2));
        assert_eq!(spread.get("Repair"), Some(&1));
    }

    mod property_tests {
        use super::*;
        use crate::models::strategies::records_strategy;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn prop_counts_sum_to_record_count(records in records_strategy()) {
                let summaries = aggregate(&records);

                let region_total: usize = summaries.regions.iter().map(|r| r.total_count).sum();
                let task_total: usize = summaries.tasks.iter().map(|t| t.total_count).sum();
                prop_assert_eq!(region_total, records.len());
                prop_assert_eq!(task_total, records.len());

                for region in &summaries.regions {
                    prop_assert_eq!(region.total_count, region.task_counts.values().sum::<usize>());
                    prop_assert_eq!(region.total_count, region.status.total());
                }
                for task in &summaries.tasks {
                    prop_assert_eq!(task.total_count, task.statuses.values().sum::<usize>());
                }
            }

            #[test]
            fn prop_aggregate_is_deterministic(records in records_strategy()) {
                prop_assert_eq!(aggregate(&records), aggregate(&records.clone()));
            }

            #[test]
            fn prop_every_record_lands_in_its_cell(records in records_strategy()) {
                let summaries = aggregate(&records);
                for record in &records {
                    let region = region_of(record);
                    let task = task_of(record);
                    prop_assert!(summaries.count(&region, &task) >= 1);
                    prop_assert!(!region.trim().is_empty());
                    prop_assert!(!task.trim().is_empty());
                }
            }
        }
    }
}
