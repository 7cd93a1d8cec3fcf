use chrono::NaiveDate;
use indicator_pipeline::{
    columns::{CAMARILLA, CLOSE, DAILY_CLOSE, HIGH, LOW, NARROW, ma_column},
    indicators::{IndicatorSet, with_indicators},
    keys::KeyKind,
    merge::{ColumnCopy, MergePlan, merge_coarse},
    prune::prune_incomplete,
};
use market_data_ingestor::{
    io::dataframe::{date_series, f64_values},
    models::granularity::Granularity,
};
use polars::prelude::*;
use proptest::prelude::*;
use proptest::{arbitrary::any, strategy::Strategy};

fn ohlc() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((1.0f64..500.0, 0.0f64..20.0, 0.0f64..=1.0), 1..60)
}

fn table(rows: &[(f64, f64, f64)]) -> DataFrame {
    let low: Vec<f64> = rows.iter().map(|r| r.0).collect();
    let high: Vec<f64> = rows.iter().map(|r| r.0 + r.1).collect();
    let close: Vec<f64> = rows.iter().map(|r| r.0 + r.1 * r.2).collect();
    df!(HIGH => high, LOW => low, CLOSE => close).unwrap()
}

fn narrow_values(df: &DataFrame) -> Vec<Option<i32>> {
    df.column(NARROW)
        .unwrap()
        .as_materialized_series()
        .i32()
        .unwrap()
        .into_iter()
        .collect()
}

proptest! {
    #[test]
    fn moving_average_is_mean_of_previous_closes(rows in ohlc(), window in 1usize..10) {
        let df = table(&rows);
        let closes: Vec<f64> = rows.iter().map(|r| r.0 + r.1 * r.2).collect();

        let out = with_indicators(df, &IndicatorSet::moving_averages(&[window])).unwrap();
        let ma = f64_values(&out, &ma_column(window)).unwrap();

        for (t, value) in ma.iter().enumerate() {
            if t < window {
                prop_assert!(value.is_none());
            } else {
                let expected = closes[t - window..t].iter().sum::<f64>() / window as f64;
                let actual = value.unwrap();
                prop_assert!((actual - expected).abs() <= 1e-9 * expected.abs().max(1.0));
            }
        }
    }

    #[test]
    fn indicators_never_look_ahead(
        rows in ohlc(),
        pick in any::<prop::sample::Index>(),
        replacement in (1.0f64..500.0, 0.0f64..20.0, 0.0f64..=1.0),
    ) {
        let k = pick.index(rows.len());
        let mut changed = rows.clone();
        changed[k] = replacement;

        let set = IndicatorSet { ma_windows: vec![3], ..IndicatorSet::pivots() };
        let before = with_indicators(table(&rows), &set).unwrap();
        let after = with_indicators(table(&changed), &set).unwrap();

        for name in CAMARILLA.iter().copied().chain(std::iter::once("MA 3")) {
            let a = f64_values(&before, name).unwrap();
            let b = f64_values(&after, name).unwrap();
            prop_assert_eq!(&a[..=k], &b[..=k]);
        }
        prop_assert_eq!(&narrow_values(&before)[..=k], &narrow_values(&after)[..=k]);
    }

    #[test]
    fn narrow_is_zero_or_one(rows in ohlc()) {
        let out = with_indicators(table(&rows), &IndicatorSet::pivots()).unwrap();
        let narrow = narrow_values(&out);

        prop_assert!(narrow.iter().all(|v| matches!(v, Some(0 | 1))));
        prop_assert_eq!(narrow[0], Some(0));
        if narrow.len() > 1 {
            prop_assert_eq!(narrow[1], Some(0));
        }
    }

    #[test]
    fn merging_twice_changes_nothing(
        coarse_days in prop::collection::btree_set(0u32..20, 0..20),
        fine_days in prop::collection::vec((0u32..20, 9u32..16), 1..40),
    ) {
        let day = |d: u32| NaiveDate::from_ymd_opt(2019, 3, 1 + d).unwrap();

        let coarse_dates =
            date_series(coarse_days.iter().map(|&d| day(d).and_hms_opt(0, 0, 0).unwrap())).unwrap();
        let coarse_close: Vec<f64> = coarse_days.iter().map(|&d| f64::from(d)).collect();
        let coarse = DataFrame::new(vec![
            coarse_dates.into_column(),
            Column::new(CLOSE.into(), coarse_close),
        ]).unwrap();

        let fine_stamps = fine_days.iter().map(|&(d, h)| day(d).and_hms_opt(h, 0, 0).unwrap());
        let fine_dates = date_series(fine_stamps).unwrap();
        let fine = DataFrame::new(vec![
            fine_dates.into_column(),
            Column::new(CLOSE.into(), vec![1.0; fine_days.len()]),
        ]).unwrap();

        let plan = MergePlan {
            coarse: Granularity::Daily,
            fine: Granularity::Hourly,
            key: KeyKind::Date,
            columns: vec![ColumnCopy::renamed(CLOSE, DAILY_CLOSE)],
        };

        let (once, report) = merge_coarse(fine, &coarse, &plan).unwrap();
        let (twice, _) = merge_coarse(once.clone(), &coarse, &plan).unwrap();

        prop_assert!(once.equals_missing(&twice));
        let expected_matches = fine_days.iter().filter(|(d, _)| coarse_days.contains(d)).count();
        prop_assert_eq!(report.matched_rows, expected_matches);

        let merged = f64_values(&once, DAILY_CLOSE).unwrap();
        for (&(d, _), value) in fine_days.iter().zip(&merged) {
            prop_assert_eq!(*value, coarse_days.contains(&d).then(|| f64::from(d)));
        }
    }

    #[test]
    fn pruning_keeps_exactly_the_complete_rows(
        cells in prop::collection::vec(
            (prop::option::of(-5.0f64..5.0), prop::option::of(0i64..3), any::<bool>()),
            0..40,
        ),
    ) {
        let a: Vec<Option<f64>> =
            cells.iter().map(|c| if c.2 { Some(f64::NAN) } else { c.0 }).collect();
        let b: Vec<Option<i64>> = cells.iter().map(|c| c.1).collect();
        let row: Vec<i64> = (0..cells.len() as i64).collect();
        let df = df!("a" => a.clone(), "b" => b.clone(), "row" => row).unwrap();

        let (pruned, report) = prune_incomplete(df).unwrap();

        let expected: Vec<i64> = (0..cells.len())
            .filter(|&i| a[i].is_some_and(|v| !v.is_nan()) && b[i].is_some())
            .map(|i| i as i64)
            .collect();
        let kept: Vec<i64> = pruned
            .column("row")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        prop_assert_eq!(kept, expected.clone());
        prop_assert_eq!(report.after, expected.len());
        prop_assert_eq!(report.before, cells.len());
    }
}
