//! Aggregation of decoded readings into report artifacts.
//!
//! Aggregation is pure: same readings in, same report out, no clock or
//! store access. The time series sort is stable, so readings sharing a
//! timestamp keep their archive order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::telemetry::{Occupancy, Reading};

/// How often one occupancy category was observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    /// The category
    pub category: Occupancy,
    /// Observations in that category
    pub count: usize,
}

/// Category counts for a single calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCounts {
    /// The day
    pub day: NaiveDate,
    /// Counts over that day's readings, fixed categories first
    pub counts: Vec<CategoryCount>,
}

/// Everything `aggregate` derives from a set of readings.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// All readings, stably sorted ascending by timestamp
    pub time_series: Vec<Reading>,
    /// Counts for the five known categories, in their fixed order and
    /// including zeroes, followed by any unknown tags alphabetically
    pub category_counts: Vec<CategoryCount>,
    /// Per-day breakdown, days ascending
    pub daily_counts: Vec<DailyCounts>,
}

impl Report {
    /// Whether there were no readings at all.
    pub fn is_empty(&self) -> bool {
        self.time_series.is_empty()
    }

    /// How many readings went into the report.
    pub fn len(&self) -> usize {
        self.time_series.len()
    }

    /// The `n` newest readings, oldest of them first.
    pub fn latest(&self, n: usize) -> &[Reading] {
        let start = self.time_series.len().saturating_sub(n);
        &self.time_series[start..]
    }
}

/// Build a report from decoded readings.
pub fn aggregate(readings: &[Reading]) -> Report {
    let mut time_series = readings.to_vec();
    time_series.sort_by_key(|reading| reading.timestamp);

    let daily_counts = {
        let mut days: BTreeMap<NaiveDate, Vec<&Reading>> = BTreeMap::new();
        for reading in readings {
            days.entry(reading.timestamp.date_naive())
                .or_default()
                .push(reading);
        }
        days.into_iter()
            .map(|(day, of_day)| DailyCounts {
                day,
                counts: count_categories(of_day.iter().copied()),
            })
            .collect()
    };

    Report {
        category_counts: count_categories(readings),
        daily_counts,
        time_series,
    }
}

/// Count occupancies: the five known categories always appear, in order and
/// with explicit zeroes; unknown tags follow alphabetically.
fn count_categories<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Occupancy::FIXED
        .iter()
        .map(|category| CategoryCount {
            category: category.clone(),
            count: 0,
        })
        .collect();
    let mut other: BTreeMap<String, usize> = BTreeMap::new();

    for reading in readings {
        match counts
            .iter_mut()
            .find(|entry| entry.category == reading.occupancy)
        {
            Some(entry) => entry.count += 1,
            None => {
                if let Occupancy::Other(tag) = &reading.occupancy {
                    *other.entry(tag.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    counts.extend(other.into_iter().map(|(tag, count)| CategoryCount {
        category: Occupancy::Other(tag),
        count,
    }));
    counts
}
