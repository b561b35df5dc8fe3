//! End-to-end baseline and progression flow through the analysis service

mod common;

use std::sync::Barrier;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{front_pose, reference_front};
use physique_scan::config::AnalysisConfig;
use physique_scan::service::BASELINE_MESSAGE;
use physique_scan::{AnalyzeRequest, Database, Gender, Landmark, MemoryScanRepository, PhysiqueError, PhysiqueService};

const RACERS: usize = 8;

fn service() -> PhysiqueService {
    PhysiqueService::new(Box::new(MemoryScanRepository::new()), AnalysisConfig::default())
}

fn request(front: Vec<Landmark>, gender: Gender) -> AnalyzeRequest {
    AnalyzeRequest {
        front_pose: front,
        side_pose: Vec::new(),
        gender,
        height_cm: Some(180.0),
        user_id: None,
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 18, 0, 0).unwrap()
}

#[test]
fn test_first_scan_becomes_baseline() {
    let service = service();
    let report = service.analyze_at(&request(reference_front(), Gender::Male), start()).unwrap();

    assert_eq!(report.user_id, "demo_user_male");
    assert!(report.scan_id.is_some());
    let progress = report.progress.as_ref().unwrap();
    assert!(progress.is_baseline);
    assert_eq!(progress.message.as_deref(), Some(BASELINE_MESSAGE));
    assert_eq!(progress.score_change, None);
    assert_eq!(report.physique.overall_score(), 87);

    let metrics = service.repository().get_baseline_metrics("demo_user_male").unwrap();
    assert_eq!(metrics.unwrap().baseline_scan_id, report.scan_id.unwrap());
}

#[test]
fn test_second_scan_records_progress() {
    let service = service();
    service.analyze_at(&request(reference_front(), Gender::Male), start()).unwrap();

    let later = start() + Duration::days(3) + Duration::hours(5);
    let report = service
        .analyze_at(&request(front_pose(0.45, 0.3), Gender::Male), later)
        .unwrap();

    let progress = report.progress.unwrap();
    assert!(!progress.is_baseline);
    assert_eq!(progress.message, None);
    assert_eq!(progress.days_since_baseline, Some(3));
    assert_eq!(progress.score_change, Some(92 - 87));
    let deltas = progress.deltas.unwrap();
    assert_eq!(deltas.shoulders, 87 - 73);
    assert_eq!(deltas.posture, 0);

    let history = service.progression_history("demo_user_male").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].days_since_baseline, 3);
    assert_eq!(history[0].scan_id, report.scan_id.unwrap());

    let scans = service.scan_history("demo_user_male", None).unwrap();
    assert_eq!(scans.len(), 2);
    assert!(!scans[0].is_baseline);
    assert!(scans[1].is_baseline);

    let snapshot = service.metrics().snapshot();
    assert_eq!(snapshot.analyses, 2);
    assert_eq!(snapshot.baselines, 1);
    assert_eq!(snapshot.progressions, 1);
    assert_eq!(snapshot.errors, 0);
}

#[test]
fn test_unsupported_gender_is_not_stored() {
    let service = service();
    let report = service.analyze_at(&request(Vec::new(), Gender::Female), start()).unwrap();

    assert_eq!(report.user_id, "demo_user_female");
    assert_eq!(report.scan_id, None);
    assert!(report.progress.is_none());
    assert!(report.diet_plan.is_none());
    assert!(report.features.is_fallback());
    assert_eq!(report.physique.overall_score(), 0);
    assert!(service.repository().get_user("demo_user_female").unwrap().is_none());
}

#[test]
fn test_report_json_shape() {
    let service = service();
    let report = service.analyze_at(&request(reference_front(), Gender::Male), start()).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["is_baseline"], true);
    assert_eq!(value["message"], BASELINE_MESSAGE);
    assert_eq!(value["physique"]["overall_score"], 87);
    assert_eq!(value["physique"]["scores"]["shoulders"], 73);
    assert_eq!(value["diet_plan"]["calories"], 1700);
    assert_eq!(value["workout_routine"]["days"].as_array().unwrap().len(), 7);
}

#[test]
fn test_explicit_users_are_tracked_separately() {
    let service = service();
    let mut first = request(reference_front(), Gender::Male);
    first.user_id = Some("alice".to_string());
    let mut second = first.clone();
    second.user_id = Some("bob".to_string());

    let a = service.analyze_at(&first, start()).unwrap();
    let b = service.analyze_at(&second, start()).unwrap();
    assert!(a.progress.unwrap().is_baseline);
    assert!(b.progress.unwrap().is_baseline);
}

#[test]
fn test_sqlite_backed_flow() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("flow.db").display().to_string()).unwrap();
    let service = PhysiqueService::new(Box::new(db), AnalysisConfig::default());

    service.analyze_at(&request(reference_front(), Gender::Male), start()).unwrap();
    let report = service
        .analyze_at(&request(front_pose(0.45, 0.3), Gender::Male), start() + Duration::days(10))
        .unwrap();

    let progress = report.progress.unwrap();
    assert_eq!(progress.days_since_baseline, Some(10));
    assert_eq!(progress.score_change, Some(5));

    let history = service.progression_history("demo_user_male").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].deltas.overall, 5);
    assert_eq!(history[0].overall_score, 92);
}

#[test]
fn test_history_of_unknown_user_is_not_found() {
    let service = service();
    assert!(matches!(
        service.scan_history("nobody", None).unwrap_err(),
        PhysiqueError::NotFound(_)
    ));
    assert!(matches!(
        service.progression_history("nobody").unwrap_err(),
        PhysiqueError::NotFound(_)
    ));
}

/// Fire `RACERS` simultaneous first scans for one fresh user and check that
/// exactly one becomes the baseline while the rest conflict or progress.
fn race_first_scan(service: &PhysiqueService, user_id: &str) {
    let mut req = request(reference_front(), Gender::Male);
    req.user_id = Some(user_id.to_string());
    let barrier = Barrier::new(RACERS);

    let outcomes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..RACERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    service.analyze_at(&req, start())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("analysis thread panicked"))
            .collect()
    });

    let (mut baselines, mut progressions, mut conflicts) = (0, 0, 0);
    for outcome in outcomes {
        match outcome {
            Ok(report) => {
                if report.progress.expect("male scans are stored").is_baseline {
                    baselines += 1;
                } else {
                    progressions += 1;
                }
            }
            Err(PhysiqueError::BaselineConflict { user_id: contested }) => {
                assert_eq!(contested, user_id);
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error during first-scan race: {other}"),
        }
    }

    assert_eq!(baselines, 1);
    assert_eq!(baselines + progressions + conflicts, RACERS);

    let scans = service.scan_history(user_id, Some(100)).unwrap();
    assert_eq!(scans.iter().filter(|scan| scan.is_baseline).count(), 1);
    assert_eq!(scans.len(), 1 + progressions);
    assert_eq!(service.progression_history(user_id).unwrap().len(), progressions);

    let metrics = service.repository().get_baseline_metrics(user_id).unwrap().unwrap();
    let baseline = scans.iter().find(|scan| scan.is_baseline).unwrap();
    assert_eq!(metrics.baseline_scan_id, baseline.scan_id);

    let snapshot = service.metrics().snapshot();
    assert_eq!(snapshot.baselines, 1);
    assert_eq!(snapshot.progressions, progressions as u64);
    assert_eq!(snapshot.errors, conflicts as u64);
}

#[test]
fn test_concurrent_first_scans_in_memory() {
    let service = service();
    race_first_scan(&service, "racer");
}

#[test]
fn test_concurrent_first_scans_on_sqlite() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("race.db").display().to_string()).unwrap();
    let service = PhysiqueService::new(Box::new(db), AnalysisConfig::default());
    race_first_scan(&service, "racer");
}
