//! SQLite scan store tests

mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::reference_front;
use physique_scan::models::{NewScan, NewUser};
use physique_scan::scoring::score_male_physique;
use physique_scan::{Database, Gender, PhysiqueError, ScanRepository, ScoreSet};
use tempfile::TempDir;

fn open_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_url = format!("sqlite://{}", temp_dir.path().join("scans.db").display());
    let db = Database::new(&db_url).expect("Failed to create database");
    (temp_dir, db)
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 7, 30, 0).unwrap()
}

fn create_user(db: &Database, user_id: &str) {
    db.create_user(&NewUser {
        user_id: user_id.to_string(),
        gender: Gender::Male,
        height_cm: Some(178.0),
    })
    .expect("Failed to create user");
}

fn scan(user_id: &str, scan_date: DateTime<Utc>) -> NewScan {
    NewScan {
        user_id: user_id.to_string(),
        scan_date,
        front_pose: reference_front(),
        side_pose: Vec::new(),
        analysis: score_male_physique(&reference_front(), &[], None).unwrap(),
    }
}

#[test]
fn test_database_creation_and_initialization() {
    let (_dir, db) = open_db();
    let _conn = db.get_connection().expect("Failed to get database connection");
    assert!(db.get_user("nobody").unwrap().is_none());
}

#[test]
fn test_in_memory_database() {
    let db = Database::new("sqlite::memory:").expect("Failed to create database");
    create_user(&db, "mem");
    assert!(db.get_user("mem").unwrap().is_some());
}

#[test]
fn test_create_user_is_idempotent() {
    let (_dir, db) = open_db();
    let user = NewUser {
        user_id: "athlete".to_string(),
        gender: Gender::Male,
        height_cm: Some(180.5),
    };
    assert!(db.create_user(&user).unwrap());
    assert!(!db
        .create_user(&NewUser {
            height_cm: None,
            ..user.clone()
        })
        .unwrap());

    let stored = db.get_user("athlete").unwrap().unwrap();
    assert_eq!(stored.gender, Gender::Male);
    assert_eq!(stored.height_cm, Some(180.5));
}

#[test]
fn test_establish_baseline_round_trip() {
    let (_dir, db) = open_db();
    create_user(&db, "athlete");

    let baseline = scan("athlete", start());
    let scan_id = db.establish_baseline(&baseline).unwrap();

    let stored = db.get_baseline_scan("athlete").unwrap().unwrap();
    assert_eq!(stored.scan_id, scan_id);
    assert!(stored.is_baseline);
    assert_eq!(stored.scan_date, start());
    assert_eq!(stored.overall_score, baseline.analysis.overall_score);
    assert_eq!(stored.scores, baseline.analysis.scores);
    assert_eq!(stored.front_pose, baseline.front_pose);
    assert_eq!(stored.strong_areas, baseline.analysis.strong_areas);

    let metrics = db.get_baseline_metrics("athlete").unwrap().unwrap();
    assert_eq!(metrics.baseline_scan_id, scan_id);
    assert!((metrics.proportions.shoulder_hip_ratio - 0.4 / 0.3).abs() < 1e-9);
}

#[test]
fn test_second_baseline_conflicts() {
    let (_dir, db) = open_db();
    create_user(&db, "athlete");
    db.establish_baseline(&scan("athlete", start())).unwrap();

    let err = db
        .establish_baseline(&scan("athlete", start() + Duration::days(1)))
        .unwrap_err();
    assert!(matches!(err, PhysiqueError::BaselineConflict { ref user_id } if user_id == "athlete"));
    assert_eq!(db.get_user_scans("athlete", 10).unwrap().len(), 1);
}

#[test]
fn test_baseline_metrics_upsert_keeps_one_row() {
    let (_dir, db) = open_db();
    create_user(&db, "athlete");
    let first = db.establish_baseline(&scan("athlete", start())).unwrap();
    let second = db.save_scan(&scan("athlete", start() + Duration::days(2)), false).unwrap();

    db.save_baseline_metrics("athlete", second, &reference_front()).unwrap();
    let metrics = db.get_baseline_metrics("athlete").unwrap().unwrap();
    assert_ne!(first, second);
    assert_eq!(metrics.baseline_scan_id, second);
}

#[test]
fn test_scan_without_user_is_rejected() {
    let (_dir, db) = open_db();
    assert!(db.save_scan(&scan("ghost", start()), false).is_err());
}

#[test]
fn test_progression_history() {
    let (_dir, db) = open_db();
    create_user(&db, "athlete");
    let baseline = scan("athlete", start());
    db.establish_baseline(&baseline).unwrap();
    let base_scores = baseline.analysis.scores;

    let mut ids = Vec::new();
    for (days, overall) in [(21, 80), (7, 90)] {
        let id = db
            .save_scan(&scan("athlete", start() + Duration::days(days)), false)
            .unwrap();
        let current = ScoreSet {
            overall,
            ..base_scores
        };
        db.save_progression("athlete", id, &current, &base_scores, days).unwrap();
        ids.push(id);
    }

    let history = db.get_progression_history("athlete").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].days_since_baseline, 7);
    assert_eq!(history[0].scan_id, ids[1]);
    assert_eq!(history[0].deltas.overall, 90 - base_scores.overall);
    assert_eq!(history[0].deltas.shoulders, 0);
    assert_eq!(history[1].days_since_baseline, 21);
    assert_eq!(history[1].scan_date, start() + Duration::days(21));
    assert!(history.iter().all(|record| record.notes.is_none()));
}

#[test]
fn test_user_scans_newest_first_with_limit() {
    let (_dir, db) = open_db();
    create_user(&db, "athlete");
    db.establish_baseline(&scan("athlete", start())).unwrap();
    for days in 1..=4 {
        db.save_scan(&scan("athlete", start() + Duration::days(days)), false)
            .unwrap();
    }

    let scans = db.get_user_scans("athlete", 3).unwrap();
    assert_eq!(scans.len(), 3);
    assert_eq!(scans[0].scan_date, start() + Duration::days(4));
    assert!(scans.windows(2).all(|pair| pair[0].scan_date >= pair[1].scan_date));
    assert!(scans.iter().all(|s| !s.is_baseline));
}
