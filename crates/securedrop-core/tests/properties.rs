//! Invariants that hold for arbitrary inputs.

use std::sync::OnceLock;

use proptest::prelude::*;

use securedrop_core::features::FeatureVector;
use securedrop_core::model::{initialize_model, AnomalyModel, ModelConfig};
use securedrop_core::risk::{fuse, RiskLevel, HIGH_THRESHOLD, MEDIUM_THRESHOLD};
use securedrop_core::{assess, extract};

fn model() -> &'static AnomalyModel {
    static MODEL: OnceLock<AnomalyModel> = OnceLock::new();
    MODEL.get_or_init(|| {
        initialize_model(&ModelConfig {
            baseline_seed: Some(99),
            n_estimators: 25,
            ..ModelConfig::default()
        })
        .expect("config is valid")
    })
}

fn flag() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(1.0)]
}

prop_compose! {
    fn feature_vector()(
        entropy in 0.0f64..=8.0,
        printable_ratio in 0.0f64..=1.0,
        size_kb in 0.0f64..=10240.0,
        double_ext in flag(),
        exe_flag in flag(),
        symbol_density in 0.0f64..=1.0,
    ) -> FeatureVector {
        FeatureVector { entropy, printable_ratio, size_kb, double_ext, exe_flag, symbol_density }
    }
}

proptest! {
    #[test]
    fn extracted_features_stay_in_range(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
        name in "[a-z.]{0,16}",
    ) {
        let f = extract(&data, &name);
        prop_assert!((0.0..=8.0).contains(&f.entropy));
        prop_assert!((0.0..=1.0).contains(&f.printable_ratio));
        prop_assert!((0.0..=1.0).contains(&f.symbol_density));
        prop_assert!(f.double_ext == 0.0 || f.double_ext == 1.0);
        prop_assert!(f.exe_flag == 0.0 || f.exe_flag == 1.0);
        prop_assert_eq!(f.size_kb, data.len() as f64 / 1024.0);
    }

    #[test]
    fn mz_prefix_always_flags(rest in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut data = b"MZ".to_vec();
        data.extend(rest);
        prop_assert_eq!(extract(&data, "x").exe_flag, 1.0);
    }

    #[test]
    fn fused_score_is_bounded(raw in -10.0f64..10.0, f in feature_vector()) {
        let (score, level) = fuse(raw, &f);
        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert_eq!(level, RiskLevel::from_score(score));
    }

    #[test]
    fn model_assessment_is_bounded_and_stable(f in feature_vector()) {
        let a = assess(model(), f);
        prop_assert!((0.0..=1.0).contains(&a.risk_score));
        prop_assert_eq!(a, assess(model(), f));
    }

    #[test]
    fn level_bands_match_thresholds(score in 0.0f64..=1.0) {
        let expected = if score < MEDIUM_THRESHOLD {
            RiskLevel::Low
        } else if score < HIGH_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };
        prop_assert_eq!(RiskLevel::from_score(score), expected);
    }
}
