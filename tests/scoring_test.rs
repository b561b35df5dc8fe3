//! Integration tests for the physique scorer

mod common;

use common::{aligned_side, front_pose, reference_front};
use physique_scan::models::Category;
use physique_scan::scoring::{score_male_physique, score_physique};
use physique_scan::{Gender, Landmark, PhysiqueError, ScoringOutcome};
use proptest::prelude::*;

#[test]
fn test_reference_male_scan() {
    let analysis = score_male_physique(&reference_front(), &[], Some(180.0)).unwrap();

    // 0.4 / 0.3 = 1.333 falls in the 1.25 band: 65 + 0.0833 * 100
    assert_eq!(analysis.scores.shoulders, 73);
    assert_eq!(analysis.scores.posture, 75);
    assert_eq!(analysis.scores.arms, 85);
    assert_eq!(analysis.scores.chest, 100);
    assert_eq!(analysis.overall_score, 87);
    assert_eq!(analysis.scores.overall, analysis.overall_score);
    assert_eq!(analysis.body_type, "Elite Physique");
    assert_eq!(analysis.frame, "Athletic Frame");
}

#[test]
fn test_reference_areas_and_insight() {
    let analysis = score_male_physique(&reference_front(), &[], None).unwrap();

    assert!(analysis.growth_areas.is_empty());
    assert_eq!(analysis.strong_areas.len(), 3);
    assert_eq!(analysis.strong_areas[0].name, "Chest");
    assert_eq!(analysis.strong_areas[0].score, 100);
    assert!(analysis
        .strong_areas
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score));
    assert!(analysis.key_insight.starts_with("Your chest development is strong"));
    assert!(analysis
        .key_insight
        .ends_with("Focus on shoulder width training to enhance your frame."));
}

#[test]
fn test_zero_hip_width_uses_neutral_ratio() {
    let analysis = score_male_physique(&front_pose(0.4, 0.0), &[], None).unwrap();
    assert_eq!(analysis.scores.shoulders, 50);
    assert_eq!(analysis.frame, "Narrow Frame");
}

#[test]
fn test_wide_shoulders_are_strong() {
    let analysis = score_male_physique(&front_pose(0.45, 0.3), &[], None).unwrap();
    assert_eq!(analysis.scores.shoulders, 87);
    assert_eq!(analysis.frame, "Wide Frame");
}

#[test]
fn test_aligned_side_view_scores_posture() {
    let analysis = score_male_physique(&reference_front(), &aligned_side(), None).unwrap();
    assert_eq!(analysis.scores.posture, 100);
}

#[test]
fn test_short_front_pose_is_rejected() {
    let err = score_male_physique(&reference_front()[..20], &[], None).unwrap_err();
    assert!(matches!(
        err,
        PhysiqueError::InsufficientLandmarks {
            expected: 33,
            actual: 20,
            ..
        }
    ));
    assert!(err.is_client_error());
}

#[test]
fn test_partial_side_pose_is_rejected() {
    let side = vec![Landmark::new(0.5, 0.5); 10];
    assert!(score_male_physique(&reference_front(), &side, None).is_err());
}

#[test]
fn test_unsupported_genders_return_placeholder() {
    for (gender, message) in [
        (Gender::Female, "Female physique analysis coming soon!"),
        (Gender::NonBinary, "Non-binary physique analysis coming soon!"),
    ] {
        let outcome = score_physique(gender, &[], &[], None).unwrap();
        assert_eq!(outcome.overall_score(), 0);
        assert!(!outcome.is_supported());
        assert_eq!(
            outcome,
            ScoringOutcome::Unsupported {
                overall_score: 0,
                message: message.to_string(),
            }
        );
    }
}

fn arbitrary_pose() -> impl Strategy<Value = Vec<Landmark>> {
    prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), 33)
        .prop_map(|points| points.into_iter().map(|(x, y)| Landmark::new(x, y)).collect())
}

fn arbitrary_side() -> impl Strategy<Value = Vec<Landmark>> {
    prop_oneof![Just(Vec::new()), arbitrary_pose()]
}

proptest! {
    #[test]
    fn prop_scores_stay_in_range(front in arbitrary_pose(), side in arbitrary_side()) {
        let analysis = score_male_physique(&front, &side, None).unwrap();
        prop_assert!((0..=100).contains(&analysis.overall_score));
        for category in Category::ALL {
            prop_assert!((0..=100).contains(&analysis.scores.get(category)), "{:?}", category);
        }
    }

    #[test]
    fn prop_overall_matches_weighted_sum(front in arbitrary_pose(), side in arbitrary_side()) {
        let analysis = score_male_physique(&front, &side, None).unwrap();
        let s = analysis.scores;
        let weighted = f64::from(s.shoulders) * 0.20
            + f64::from(s.v_taper) * 0.18
            + f64::from(s.chest) * 0.15
            + f64::from(s.core) * 0.15
            + f64::from(s.symmetry) * 0.12
            + f64::from(s.posture) * 0.10
            + f64::from(s.arms) * 0.10;
        // Category scores are truncated before this sum, the overall after
        prop_assert!((f64::from(analysis.overall_score) - weighted).abs() < 1.0 + 1e-9);
    }

    #[test]
    fn prop_strong_and_growth_are_disjoint(front in arbitrary_pose(), side in arbitrary_side()) {
        let analysis = score_male_physique(&front, &side, None).unwrap();
        prop_assert!(analysis.strong_areas.len() <= 3);
        prop_assert!(analysis.growth_areas.len() <= 3);
        for strong in &analysis.strong_areas {
            prop_assert!(analysis.growth_areas.iter().all(|growth| growth.name != strong.name));
        }
    }

    #[test]
    fn prop_unsupported_genders_never_fail(
        landmarks in prop::collection::vec((any::<f64>(), any::<f64>()), 0..40),
        female in any::<bool>(),
    ) {
        let pose: Vec<Landmark> = landmarks.into_iter().map(|(x, y)| Landmark::new(x, y)).collect();
        let gender = if female { Gender::Female } else { Gender::NonBinary };
        let outcome = score_physique(gender, &pose, &pose, None).unwrap();
        prop_assert_eq!(outcome.overall_score(), 0);
    }
}
