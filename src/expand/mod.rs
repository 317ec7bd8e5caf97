//! Relation expander: turns one topic partition's `related_works` lists into
//! a work -> related-work table enriched with the related side's metadata.

use anyhow::{bail, Context, Result};
use log::debug;
use polars::prelude::*;

/// Separator of the serialized `related_works` list. Identifiers containing
/// it cannot be represented and are split apart.
pub const RELATED_WORKS_SEPARATOR: &str = ";";

pub const ORIGIN_COLUMNS: [&str; 4] = ["id", "date", "related_works", "primary_topic"];
pub const LOOKUP_SOURCE_COLUMNS: [&str; 3] = ["id", "date", "primary_topic"];
pub const LOOKUP_COLUMNS: [&str; 3] = [
    "related_work_id",
    "related_publication_date",
    "related_primary_topic",
];
pub const RELATION_COLUMNS: [&str; 6] = [
    "work_id",
    "publication_date",
    "primary_topic",
    "related_work_id",
    "related_publication_date",
    "related_primary_topic",
];

const RELATED_WORKS: &str = "related_works";
const RELATED_WORK_ID: &str = "related_work_id";
const ROW_ORDER: &str = "__relation_row";

fn columns(names: &[&str]) -> Vec<Expr> {
    names.iter().map(|name| col(*name)).collect()
}

/// Rename the global work -> primary topic table to the join-target schema
pub fn rename_lookup(lookup: LazyFrame) -> LazyFrame {
    lookup.rename(LOOKUP_SOURCE_COLUMNS, LOOKUP_COLUMNS, true)
}

fn has_related_works() -> Expr {
    col(RELATED_WORKS)
        .is_not_null()
        .and(col(RELATED_WORKS).neq(lit("")))
}

fn require_columns(lf: &mut LazyFrame, required: &[&str], what: &str) -> Result<()> {
    let schema = lf
        .collect_schema()
        .with_context(|| format!("Failed to resolve schema of {}", what))?;

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !schema.contains(name))
        .collect();

    if !missing.is_empty() {
        bail!("{} is missing required columns: {}", what, missing.join(", "));
    }
    Ok(())
}

/// A duplicated lookup key would fan the join out, so it is rejected.
/// Null keys never match a split identifier and are ignored.
fn ensure_unique_keys(lookup: &LazyFrame) -> Result<()> {
    let keyed = lookup.clone().filter(col(RELATED_WORK_ID).is_not_null());

    let counts = keyed
        .clone()
        .select([
            len().cast(DataType::UInt64).alias("rows"),
            col(RELATED_WORK_ID)
                .n_unique()
                .cast(DataType::UInt64)
                .alias("keys"),
        ])
        .collect()
        .context("Failed to count lookup keys")?;

    let rows = counts.column("rows")?.u64()?.get(0).unwrap_or(0);
    let keys = counts.column("keys")?.u64()?.get(0).unwrap_or(0);
    if rows == keys {
        return Ok(());
    }

    let examples = keyed
        .group_by([col(RELATED_WORK_ID)])
        .agg([len().alias("count")])
        .filter(col("count").gt(lit(1)))
        .sort([RELATED_WORK_ID], SortMultipleOptions::default())
        .limit(5)
        .collect()
        .context("Failed to collect duplicated lookup keys")?;
    let examples = examples.column(RELATED_WORK_ID)?.cast(&DataType::String)?;
    let examples: Vec<&str> = examples.str()?.into_iter().flatten().collect();

    bail!(
        "Global lookup has {} duplicated related_work_id keys ({} rows, {} unique), e.g. {}",
        rows - keys,
        rows,
        keys,
        examples.join(", ")
    )
}

/// Lazy plan for the expansion, without precondition checks.
///
/// Filters out empty lists, splits and explodes them, inner-joins on
/// `related_work_id` and restores the flattened order (origin row order, then
/// list order) before projecting to [`RELATION_COLUMNS`].
pub fn expansion_plan(origin: LazyFrame, lookup: LazyFrame) -> LazyFrame {
    origin
        .select(columns(&ORIGIN_COLUMNS))
        .filter(has_related_works())
        .with_column(col(RELATED_WORKS).str().split(lit(RELATED_WORKS_SEPARATOR)))
        .explode([col(RELATED_WORKS)])
        .rename(
            ["id", "date", RELATED_WORKS],
            ["work_id", "publication_date", RELATED_WORK_ID],
            true,
        )
        .with_row_index(ROW_ORDER, None)
        .join(
            lookup.select(columns(&LOOKUP_COLUMNS)),
            [col(RELATED_WORK_ID)],
            [col(RELATED_WORK_ID)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort([ROW_ORDER], SortMultipleOptions::default())
        .select(columns(&RELATION_COLUMNS))
}

/// Expand one origin partition against the renamed global lookup.
///
/// Related works missing from the lookup are dropped by the inner join.
/// Fails when a required column is absent or lookup keys are not unique.
pub fn expand(origin: &DataFrame, lookup: &DataFrame) -> Result<DataFrame> {
    let mut origin = origin.clone().lazy();
    let mut lookup = lookup.clone().lazy();

    require_columns(&mut origin, &ORIGIN_COLUMNS, "Origin partition")?;
    require_columns(&mut lookup, &LOOKUP_COLUMNS, "Global lookup")?;
    ensure_unique_keys(&lookup)?;

    let relation = expansion_plan(origin, lookup)
        .collect()
        .context("Failed to expand related works")?;

    debug!("Expanded relation has {} rows", relation.height());
    Ok(relation)
}

/// Total identifiers across all non-empty `related_works` lists: the
/// largest row count [`expand`] can produce for this partition.
pub fn count_references(origin: &DataFrame) -> Result<usize> {
    let counts = origin
        .clone()
        .lazy()
        .filter(has_related_works())
        .select([col(RELATED_WORKS)
            .str()
            .split(lit(RELATED_WORKS_SEPARATOR))
            .list()
            .len()
            .sum()
            .cast(DataType::UInt64)
            .alias("references")])
        .collect()
        .context("Failed to count related works")?;

    Ok(counts.column("references")?.u64()?.get(0).unwrap_or(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    type Row = (String, String, Option<String>, String, String, Option<String>);

    fn origin(rows: &[(&str, &str, Option<&str>, Option<&str>)]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("id".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            Column::new("date".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()),
            Column::new("primary_topic".into(), rows.iter().map(|r| r.2).collect::<Vec<_>>()),
            Column::new("related_works".into(), rows.iter().map(|r| r.3).collect::<Vec<_>>()),
        ])
        .unwrap()
    }

    fn lookup(rows: &[(&str, &str, Option<&str>)]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("related_work_id".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            Column::new(
                "related_publication_date".into(),
                rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            ),
            Column::new(
                "related_primary_topic".into(),
                rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            ),
        ])
        .unwrap()
    }

    fn str_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn rows(df: &DataFrame) -> Vec<Row> {
        let cols: Vec<Vec<Option<String>>> =
            RELATION_COLUMNS.iter().map(|name| str_values(df, name)).collect();
        (0..df.height())
            .map(|i| {
                (
                    cols[0][i].clone().unwrap(),
                    cols[1][i].clone().unwrap(),
                    cols[2][i].clone(),
                    cols[3][i].clone().unwrap(),
                    cols[4][i].clone().unwrap(),
                    cols[5][i].clone(),
                )
            })
            .collect()
    }

    fn row(a: &str, b: &str, c: &str, d: &str, e: &str, f: &str) -> Row {
        (
            a.to_string(),
            b.to_string(),
            Some(c.to_string()),
            d.to_string(),
            e.to_string(),
            Some(f.to_string()),
        )
    }

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dropped_reference() {
        let works = origin(&[("W1", "2020-01-01", Some("T1"), Some("W2;W3"))]);
        let known = lookup(&[("W2", "2019-01-01", Some("T9"))]);

        let relation = expand(&works, &known).unwrap();

        assert_eq!(
            rows(&relation),
            vec![row("W1", "2020-01-01", "T1", "W2", "2019-01-01", "T9")]
        );
    }

    #[test]
    fn test_multi_reference_fan_out() {
        let works = origin(&[("W1", "2020-01-01", Some("T1"), Some("A;B;C"))]);
        let known = lookup(&[
            ("A", "2001-01-01", Some("TA")),
            ("B", "2002-01-01", Some("TB")),
            ("C", "2003-01-01", None),
        ]);

        let relation = expand(&works, &known).unwrap();

        assert_eq!(relation.height(), 3);
        assert_eq!(
            str_values(&relation, "related_work_id"),
            vec![Some("A".into()), Some("B".into()), Some("C".into())]
        );
        for r in rows(&relation) {
            assert_eq!(r.0, "W1");
            assert_eq!(r.1, "2020-01-01");
            assert_eq!(r.2.as_deref(), Some("T1"));
        }
        assert_eq!(
            str_values(&relation, "related_primary_topic"),
            vec![Some("TA".into()), Some("TB".into()), None]
        );
    }

    #[test]
    fn test_empty_and_absent_lists_contribute_nothing() {
        let works = origin(&[
            ("W1", "2020-01-01", Some("T1"), Some("")),
            ("W2", "2020-02-02", Some("T1"), None),
            ("W3", "2020-03-03", None, Some("W1")),
        ]);
        let known = lookup(&[
            ("W1", "2020-01-01", Some("T1")),
            ("W2", "2020-02-02", Some("T1")),
        ]);

        let relation = expand(&works, &known).unwrap();

        assert_eq!(str_values(&relation, "work_id"), vec![Some("W3".into())]);
        assert_eq!(str_values(&relation, "primary_topic"), vec![None]);
    }

    #[test]
    fn test_columns_exact_and_ordered() {
        let mut works = origin(&[("W1", "2020-01-01", Some("T1"), Some("W2"))]);
        works
            .with_column(Column::new("title".into(), &["A title"]))
            .unwrap();
        let mut known = lookup(&[("W2", "2019-01-01", Some("T9"))]);
        known
            .with_column(Column::new("cited_by_count".into(), &[12i64]))
            .unwrap();

        let relation = expand(&works, &known).unwrap();

        assert_eq!(column_names(&relation), RELATION_COLUMNS.to_vec());
    }

    #[test]
    fn test_flatten_order_preserved() {
        let works = origin(&[
            ("W1", "2020-01-01", Some("T1"), Some("C;A")),
            ("W2", "2021-01-01", Some("T2"), Some("B;C")),
        ]);
        let known = lookup(&[
            ("A", "2001-01-01", Some("TA")),
            ("B", "2002-01-01", Some("TB")),
            ("C", "2003-01-01", Some("TC")),
        ]);

        let relation = expand(&works, &known).unwrap();

        let pairs: Vec<(String, String)> = rows(&relation)
            .into_iter()
            .map(|r| (r.0, r.3))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("W1".into(), "C".into()),
                ("W1".into(), "A".into()),
                ("W2".into(), "B".into()),
                ("W2".into(), "C".into()),
            ]
        );
    }

    #[test]
    fn test_join_values_come_from_lookup() {
        let works = origin(&[
            ("W1", "2020-01-01", Some("T1"), Some("W2")),
            ("W2", "2019-05-05", Some("T2"), Some("W1")),
        ]);
        let known = lookup(&[
            ("W1", "2020-01-01", Some("T1")),
            ("W2", "2019-05-05", Some("T2")),
        ]);

        let relation = expand(&works, &known).unwrap();

        assert_eq!(
            rows(&relation),
            vec![
                row("W1", "2020-01-01", "T1", "W2", "2019-05-05", "T2"),
                row("W2", "2019-05-05", "T2", "W1", "2020-01-01", "T1"),
            ]
        );
    }

    #[test]
    fn test_self_references_and_duplicates_kept() {
        let works = origin(&[("W1", "2020-01-01", Some("T1"), Some("W1;W2;W2"))]);
        let known = lookup(&[
            ("W1", "2020-01-01", Some("T1")),
            ("W2", "2019-01-01", Some("T9")),
        ]);

        let relation = expand(&works, &known).unwrap();

        assert_eq!(
            str_values(&relation, "related_work_id"),
            vec![Some("W1".into()), Some("W2".into()), Some("W2".into())]
        );
    }

    #[test]
    fn test_idempotent() {
        let works = origin(&[
            ("W1", "2020-01-01", Some("T1"), Some("W3;W2")),
            ("W2", "2019-01-01", Some("T1"), Some("W3;W9")),
        ]);
        let known = lookup(&[
            ("W2", "2019-01-01", Some("T1")),
            ("W3", "2018-01-01", Some("T5")),
        ]);

        let first = expand(&works, &known).unwrap();
        let second = expand(&works, &known).unwrap();

        assert!(first.equals_missing(&second));
    }

    #[test]
    fn test_row_count_bound() {
        let works = origin(&[
            ("W1", "2020-01-01", Some("T1"), Some("A;B;X")),
            ("W2", "2020-01-01", Some("T1"), Some("")),
            ("W3", "2020-01-01", Some("T1"), Some("C")),
        ]);
        let partial = lookup(&[("A", "2001-01-01", None), ("C", "2003-01-01", None)]);
        let complete = lookup(&[
            ("A", "2001-01-01", None),
            ("B", "2002-01-01", None),
            ("C", "2003-01-01", None),
            ("X", "2004-01-01", None),
        ]);

        let references = count_references(&works).unwrap();
        assert_eq!(references, 4);
        assert_eq!(expand(&works, &partial).unwrap().height(), 2);
        assert_eq!(expand(&works, &complete).unwrap().height(), references);
    }

    #[test]
    fn test_all_empty_partition_yields_empty_relation() {
        let works = origin(&[
            ("W1", "2020-01-01", Some("T1"), Some("")),
            ("W2", "2020-01-01", Some("T1"), None),
        ]);
        let known = lookup(&[("W1", "2020-01-01", Some("T1"))]);

        let relation = expand(&works, &known).unwrap();

        assert_eq!(relation.height(), 0);
        assert_eq!(column_names(&relation), RELATION_COLUMNS.to_vec());
        assert_eq!(count_references(&works).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_lookup_keys_rejected() {
        let works = origin(&[("W1", "2020-01-01", Some("T1"), Some("W2"))]);
        let known = lookup(&[
            ("W2", "2019-01-01", Some("T9")),
            ("W2", "2019-01-01", Some("T8")),
        ]);

        let err = expand(&works, &known).unwrap_err();

        assert!(err.to_string().contains("duplicated related_work_id"));
        assert!(err.to_string().contains("W2"));
    }

    #[test]
    fn test_null_lookup_keys_are_not_duplicates() {
        let works = origin(&[("W1", "2020-01-01", Some("T1"), Some("W2;W3"))]);
        let known = DataFrame::new(vec![
            Column::new("related_work_id".into(), &[Some("W2"), None, None]),
            Column::new(
                "related_publication_date".into(),
                &["2019-01-01", "2018-01-01", "2017-01-01"],
            ),
            Column::new("related_primary_topic".into(), &["T9", "T8", "T7"]),
        ])
        .unwrap();

        let relation = expand(&works, &known).unwrap();

        assert_eq!(
            rows(&relation),
            vec![row("W1", "2020-01-01", "T1", "W2", "2019-01-01", "T9")]
        );
    }

    #[test]
    fn test_duplicate_keys_reported_alongside_null_keys() {
        let works = origin(&[("W1", "2020-01-01", Some("T1"), Some("W2"))]);
        let known = DataFrame::new(vec![
            Column::new("related_work_id".into(), &[Some("W2"), None, Some("W2"), None]),
            Column::new(
                "related_publication_date".into(),
                &["2019-01-01", "2018-01-01", "2019-01-01", "2017-01-01"],
            ),
            Column::new("related_primary_topic".into(), &["T9", "T8", "T9", "T7"]),
        ])
        .unwrap();

        let err = expand(&works, &known).unwrap_err().to_string();

        assert!(err.contains("1 duplicated related_work_id keys (2 rows, 1 unique)"));
        assert!(err.contains("e.g. W2"));
    }

    #[test]
    fn test_missing_origin_column_rejected() {
        let works = DataFrame::new(vec![
            Column::new("id".into(), &["W1"]),
            Column::new("date".into(), &["2020-01-01"]),
            Column::new("related_works".into(), &["W2"]),
        ])
        .unwrap();
        let known = lookup(&[("W2", "2019-01-01", Some("T9"))]);

        let err = expand(&works, &known).unwrap_err();

        assert!(err.to_string().contains("primary_topic"));
    }

    #[test]
    fn test_unrenamed_lookup_rejected() {
        let works = origin(&[("W1", "2020-01-01", Some("T1"), Some("W2"))]);
        let raw = DataFrame::new(vec![
            Column::new("id".into(), &["W2"]),
            Column::new("date".into(), &["2019-01-01"]),
            Column::new("primary_topic".into(), &["T9"]),
        ])
        .unwrap();

        assert!(expand(&works, &raw).is_err());

        let renamed = rename_lookup(raw.lazy()).collect().unwrap();
        assert_eq!(column_names(&renamed), LOOKUP_COLUMNS.to_vec());
        assert_eq!(expand(&works, &renamed).unwrap().height(), 1);
    }
}
