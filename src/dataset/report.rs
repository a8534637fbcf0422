//! Per-category counts over a set of annotation records.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::annotation::AnnotationRecord;

const BAR_WIDTH: usize = 24;

/// Object count of one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Summary of an annotations directory.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DatasetReport {
    pub records: usize,
    pub objects: usize,
    /// Sorted by count, most frequent first; ties by name.
    pub categories: Vec<CategoryCount>,
}

impl DatasetReport {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AnnotationRecord>) -> Self {
        let mut report = DatasetReport::default();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for record in records {
            report.records += 1;
            report.objects += record.objects.len();
            for object in &record.objects {
                *counts.entry(object.name.as_str()).or_default() += 1;
            }
        }

        report.categories = counts
            .into_iter()
            .map(|(name, count)| CategoryCount {
                name: name.to_string(),
                count,
            })
            .collect();
        report
            .categories
            .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        report
    }

    pub fn count(&self, name: &str) -> usize {
        self.categories
            .iter()
            .find(|category| category.name == name)
            .map(|category| category.count)
            .unwrap_or(0)
    }
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Annotations: {} record(s), {} object(s), {} categor{}",
            self.records,
            self.objects,
            self.categories.len(),
            if self.categories.len() == 1 { "y" } else { "ies" }
        )?;
        if self.categories.is_empty() {
            return writeln!(f, "  No objects found.");
        }

        writeln!(f)?;
        let max_count = self.categories[0].count;
        for category in &self.categories {
            let pct = category.count as f64 / self.objects as f64 * 100.0;
            writeln!(
                f,
                "  {:<12} {:>7} {:>5.1}%  {}",
                category.name,
                category.count,
                pct,
                bar(category.count, max_count)
            )?;
        }
        Ok(())
    }
}

fn bar(count: usize, max_count: usize) -> String {
    if max_count == 0 {
        return String::new();
    }
    let filled = (count * BAR_WIDTH / max_count).min(BAR_WIDTH);
    "█".repeat(filled) + &"░".repeat(BAR_WIDTH - filled)
}
