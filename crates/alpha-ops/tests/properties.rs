//! Property tests for the cross-sectional operators.

use alpha_ops::{
    Ddof, Reduction, normalize, rank, rank_by_side, scale, scale_down, vector_neut, winsorize,
    zscore,
};
use approx::assert_relative_eq;
use ndarray::{Array1, Array2, ArrayView1};
use proptest::prelude::*;

fn value_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        9 => -1e3..1e3_f64,
        1 => Just(f64::NAN),
    ]
}

fn row_strategy(max_len: usize) -> impl Strategy<Value = Array1<f64>> {
    prop::collection::vec(value_strategy(), 1..max_len).prop_map(Array1::from)
}

fn panel_strategy() -> impl Strategy<Value = Array2<f64>> {
    (1usize..6, 1usize..24).prop_flat_map(|(dates, instruments)| {
        prop::collection::vec(value_strategy(), dates * instruments).prop_map(move |v| {
            Array2::from_shape_vec((dates, instruments), v).expect("length matches shape")
        })
    })
}

fn valid(row: ArrayView1<'_, f64>) -> Vec<f64> {
    row.iter().copied().filter(|v| !v.is_nan()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_shape_and_missing_preserved(x in panel_strategy()) {
        let out = rank(&x, 2).unwrap();
        prop_assert_eq!(out.shape(), x.shape());
        for (o, v) in out.iter().zip(x.iter()) {
            prop_assert_eq!(o.is_nan(), v.is_nan());
        }
    }

    #[test]
    fn test_zscore_centres_and_scales(x in row_strategy(40)) {
        let std = Reduction::Std(Ddof::Population).of_row(x.view());
        prop_assume!(std > 1.0);

        let z = zscore(&x).unwrap();
        assert_relative_eq!(Reduction::Mean.of_row(z.view()), 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            Reduction::Std(Ddof::Population).of_row(z.view()),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_normalize_centres_rows(x in panel_strategy()) {
        let out = normalize(&x, false, 0.0).unwrap();
        for row in out.rows() {
            let vals = valid(row);
            if !vals.is_empty() {
                let mean = vals.iter().sum::<f64>() / vals.len() as f64;
                prop_assert!(mean.abs() < 1e-9, "row mean {mean}");
            }
        }
    }

    #[test]
    fn test_exact_rank_in_unit_interval(x in panel_strategy()) {
        let out = rank(&x, 0).unwrap();
        for row in out.rows() {
            let ranks = valid(row);
            if ranks.is_empty() {
                continue;
            }
            let k = ranks.len() as f64;
            prop_assert!(ranks.iter().all(|&r| r > 0.0 && r <= 1.0));
            // fractional ranks 1..=k always sum to k(k+1)/2
            let total: f64 = ranks.iter().map(|r| r * k).sum();
            assert_relative_eq!(total, k * (k + 1.0) / 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_bucketed_rank_in_unit_interval(x in panel_strategy(), rate in 1u32..5) {
        let out = rank(&x, rate).unwrap();
        prop_assert!(out.iter().filter(|v| !v.is_nan()).all(|&r| r > 0.0 && r <= 1.0));
    }

    #[test]
    fn test_scale_hits_book(x in panel_strategy(), book in 0.1..10.0_f64) {
        let out = scale(&x, book, None, None).unwrap();
        for (row, src) in out.rows().into_iter().zip(x.rows()) {
            let gross: f64 = valid(src).iter().map(|v| v.abs()).sum();
            if gross > 0.0 {
                let scaled: f64 = valid(row).iter().map(|v| v.abs()).sum();
                assert_relative_eq!(scaled, book, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_scale_down_bounds(x in row_strategy(40), constant in -1.0..1.0_f64) {
        let vals = valid(x.view());
        let lo = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assume!(hi - lo > 1e-6);

        let out = valid(scale_down(&x, constant).unwrap().view());
        let out_lo = out.iter().copied().fold(f64::INFINITY, f64::min);
        let out_hi = out.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(out_lo, -constant, epsilon = 1e-9);
        assert_relative_eq!(out_hi, 1.0 - constant, epsilon = 1e-9);
    }

    #[test]
    fn test_winsorize_within_band(x in row_strategy(60), width in 0.5..5.0_f64) {
        let mean = Reduction::Mean.of_row(x.view());
        let band = Reduction::Std(Ddof::Population).of_row(x.view()) * width;
        prop_assume!(band.is_finite());

        let out = winsorize(&x, width).unwrap();
        for v in valid(out.view()) {
            prop_assert!(v >= mean - band - 1e-9 && v <= mean + band + 1e-9);
        }
    }

    #[test]
    fn test_winsorize_small_rows_unchanged(x in row_strategy(17)) {
        // at most 16 values: no population z-score reaches 4
        let out = winsorize(&x, 4.0).unwrap();
        let twice = winsorize(&out, 4.0).unwrap();
        for ((a, b), c) in x.iter().zip(out.iter()).zip(twice.iter()) {
            if a.is_nan() {
                prop_assert!(b.is_nan() && c.is_nan());
            } else {
                prop_assert_eq!(a, b);
                prop_assert_eq!(b, c);
            }
        }
    }

    #[test]
    fn test_rank_by_side_books(x in row_strategy(40)) {
        let out = rank_by_side(&x, 0, 1.0).unwrap();
        let long: f64 = valid(out.view()).iter().filter(|&&v| v > 0.0).sum();
        let short: f64 = valid(out.view()).iter().filter(|&&v| v < 0.0).sum();

        if x.iter().any(|&v| v > 0.0) {
            assert_relative_eq!(long, 1.0, epsilon = 1e-9);
        }
        if x.iter().any(|&v| v < 0.0) {
            assert_relative_eq!(short, -1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_vector_neut_orthogonal(
        pairs in prop::collection::vec((-1e2..1e2_f64, -1e2..1e2_f64), 2..40)
    ) {
        let x: Array1<f64> = pairs.iter().map(|p| p.0).collect();
        let y: Array1<f64> = pairs.iter().map(|p| p.1).collect();
        prop_assume!(y.dot(&y) > 1e-6);

        let neut = vector_neut(&x, &y).unwrap();
        let norm = x.dot(&x).sqrt() * y.dot(&y).sqrt();
        prop_assert!(neut.dot(&y).abs() <= 1e-9 * norm.max(1.0));
    }
}
