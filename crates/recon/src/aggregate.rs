use std::collections::BTreeMap;

use crate::model::{field, AggregateOutput, AggregatedRow, NormalizedKey, Table};
use crate::normalize::KeyNormalizer;
use crate::numeric::coerce_quantity;

/// Group rows by normalized key and sum the measure column as an integer.
///
/// Rows rejected by `filter` are skipped. Blank or unparseable measures count
/// as 0, and a group is flagged `defaulted` only when none of its measures
/// parsed. Blank keys go to the blank-key bucket instead of a row. Group sums are
/// clamped at 0. The result depends only on the multiset of input rows, never
/// on their order.
pub fn aggregate_table<F>(
    table: &Table,
    key_col: usize,
    measure_col: usize,
    normalizer: &KeyNormalizer,
    filter: F,
) -> AggregateOutput
where
    F: Fn(&[String]) -> bool,
{
    let mut groups: BTreeMap<String, AggregatedRow> = BTreeMap::new();
    let mut out = AggregateOutput::default();

    for row in &table.rows {
        if !filter(row) {
            continue;
        }
        out.records_in_scope += 1;

        let raw_key = field(row, key_col);
        let quantity = coerce_quantity(field(row, measure_col), &mut out.coercions);

        let key = match normalizer.normalize(raw_key) {
            NormalizedKey::Sku(key) => key,
            NormalizedKey::Empty => {
                out.blank_keys.records += 1;
                out.blank_keys.measure = out.blank_keys.measure.saturating_add(quantity.value);
                continue;
            }
        };

        let display = normalizer.display(raw_key);
        let entry = groups.entry(key.clone()).or_insert_with(|| AggregatedRow {
            key,
            display_key: display.clone(),
            measure: 0,
            record_count: 0,
            defaulted: true,
        });
        entry.measure = entry.measure.saturating_add(quantity.value);
        entry.record_count += 1;
        entry.defaulted &= quantity.defaulted;
        // Smallest spelling wins so the label is order-independent
        if display < entry.display_key {
            entry.display_key = display;
        }
    }

    out.rows = groups
        .into_values()
        .map(|mut row| {
            row.measure = row.measure.max(0);
            row
        })
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str)]) -> Table {
        let mut t = Table::new(vec!["sku".into(), "qty".into()]);
        for (k, q) in rows {
            t.push_row(vec![k.to_string(), q.to_string()]);
        }
        t
    }

    fn all(_: &[String]) -> bool {
        true
    }

    #[test]
    fn basic_aggregation() {
        let t = table(&[("A1", "3"), ("a1 ", "4"), ("`A1", "1"), ("B2", "2")]);
        let out = aggregate_table(&t, 0, 1, &KeyNormalizer::default(), all);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].key, "a1");
        assert_eq!(out.rows[0].measure, 8);
        assert_eq!(out.rows[0].record_count, 3);
        assert_eq!(out.rows[0].display_key, "A1");
        assert_eq!(out.rows[1].measure, 2);
        assert_eq!(out.measure_sum(), 10);
    }

    #[test]
    fn filter_excludes_rows() {
        let t = table(&[("A1", "3"), ("A1", "100")]);
        let out = aggregate_table(&t, 0, 1, &KeyNormalizer::default(), |row| row[1] != "100");
        assert_eq!(out.records_in_scope, 1);
        assert_eq!(out.rows[0].measure, 3);
    }

    #[test]
    fn bad_measures_count_as_zero_and_flag_the_group() {
        let t = table(&[("A1", "5"), ("A2", ""), ("A3", "n/a")]);
        let out = aggregate_table(&t, 0, 1, &KeyNormalizer::default(), all);
        assert_eq!(out.rows.len(), 3);
        assert!(!out.rows[0].defaulted);
        assert!(out.rows[1].defaulted);
        assert_eq!(out.rows[1].measure, 0);
        assert!(out.rows[2].defaulted);
        assert_eq!(out.coercions.blank, 1);
        assert_eq!(out.coercions.unparseable, 1);
    }

    #[test]
    fn one_real_measure_keeps_the_group_complete() {
        let t = table(&[("A1", "10"), ("A1", ""), ("A2", ""), ("A2", "n/a")]);
        let out = aggregate_table(&t, 0, 1, &KeyNormalizer::default(), all);
        assert_eq!(out.rows[0].measure, 10);
        assert_eq!(out.rows[0].record_count, 2);
        assert!(!out.rows[0].defaulted);
        assert!(out.rows[1].defaulted);
        assert_eq!(out.coercions.total(), 3);
    }

    #[test]
    fn huge_measures_saturate() {
        let t = table(&[("A1", "1e19"), ("A1", "1e19"), ("B1", "1e19")]);
        let out = aggregate_table(&t, 0, 1, &KeyNormalizer::default(), all);
        assert_eq!(out.rows[0].measure, i64::MAX);
        assert_eq!(out.measure_sum(), i64::MAX);
    }

    #[test]
    fn blank_keys_are_bucketed_not_grouped() {
        let t = table(&[("", "4"), ("  ", "1"), ("A1", "2")]);
        let out = aggregate_table(&t, 0, 1, &KeyNormalizer::default(), all);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.blank_keys.records, 2);
        assert_eq!(out.blank_keys.measure, 5);
    }

    #[test]
    fn negative_group_sum_clamps_to_zero() {
        let t = table(&[("A1", "2"), ("A1", "-5")]);
        let out = aggregate_table(&t, 0, 1, &KeyNormalizer::default(), all);
        assert_eq!(out.rows[0].measure, 0);
    }

    #[test]
    fn ragged_row_reads_blank_measure() {
        let mut t = Table::new(vec!["sku".into(), "qty".into()]);
        t.push_row(vec!["A1".into()]);
        let out = aggregate_table(&t, 0, 1, &KeyNormalizer::default(), all);
        assert_eq!(out.rows[0].measure, 0);
        assert!(out.rows[0].defaulted);
    }
}
