// ==========================================
// 导入管道集成测试（SQLite）
// ==========================================
// 测试目标: 幂等重导、旧表头映射、合并策略、演练、
//           文件级失败、行级问题、批失败隔离、导入模式
// ==========================================


use smart_import::domain::{IssueKind, RowOutcome, SkipReason};
use smart_import::importer::{EntityImporter, ImportCoordinator};
use smart_import::repository::{EntityRepository, SqliteEntityRepository};
use smart_import::{logging, EntityKind, FieldValue, ImportConfig, ImportMode, MergePolicy};
use std::sync::Arc;
use tempfile::NamedTempFile;

fn sqlite_coordinator() -> (NamedTempFile, Arc<SqliteEntityRepository>, ImportCoordinator) {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = Arc::new(SqliteEntityRepository::new(&db_path).expect("Failed to open repo"));
    let coordinator = ImportCoordinator::new(repo.clone());
    (temp_file, repo, coordinator)
}

fn school_config() -> ImportConfig {
    ImportConfig::for_kind(EntityKind::School)
}

#[tokio::test]
async fn test_legacy_school_file_imports_every_row() {
    logging::init_test();
    let (_db, repo, coordinator) = sqlite_coordinator();

    let result = coordinator
        .import_file(&test_helpers::fixture("schools_legacy.csv"), &school_config())
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.total_rows, 4);
    assert_eq!(result.inserted_rows, 4);
    assert_eq!(result.processed_rows, 4);
    assert!(result.is_reconciled());
    // 空行占用行号
    assert!(result.outcome_for_row(6).is_some());
    assert!(result.outcome_for_row(5).is_none());

    let records = repo.read_all(EntityKind::School).await.unwrap();
    let hbs = records
        .iter()
        .find(|r| r.entity.text("name") == Some("Harvard Business School"))
        .expect("HBS stored");
    assert_eq!(hbs.entity.get("ranking"), &FieldValue::Integer(5));
    assert_eq!(hbs.entity.get("qs_mba_rank"), &FieldValue::Integer(5));
    assert_eq!(hbs.entity.get("class_size"), &FieldValue::Integer(930));
    assert_eq!(hbs.entity.get("women_percentage"), &FieldValue::Percentage(45.0));
    assert_eq!(hbs.entity.get("mean_gpa"), &FieldValue::Decimal(3.7));
    assert_eq!(hbs.entity.get("gmat_gre_waiver_available"), &FieldValue::Boolean(false));
    assert_eq!(hbs.entity.text("country"), Some("USA"));
    assert_eq!(hbs.entity.text("tuition"), Some("$146,880"));
    assert!(hbs.created_at.is_some());

    let lbs = records
        .iter()
        .find(|r| r.entity.text("name") == Some("London Business School"))
        .expect("LBS stored");
    assert_eq!(lbs.entity.get("ranking"), &FieldValue::Integer(8));
    assert_eq!(lbs.entity.text("country"), Some("UK"));

    let insead = records
        .iter()
        .find(|r| r.entity.text("name") == Some("INSEAD"))
        .expect("INSEAD stored");
    assert_eq!(insead.entity.get("gmat_gre_waiver_available"), &FieldValue::Boolean(true));
    assert_eq!(insead.entity.get("mean_gpa"), &FieldValue::Null);
}

#[tokio::test]
async fn test_reimport_is_idempotent_under_every_policy() {
    logging::init_test();
    let (_db, repo, coordinator) = sqlite_coordinator();
    let path = test_helpers::fixture("schools_legacy.csv");

    let first = coordinator.import_file(&path, &school_config()).await;
    assert_eq!(first.inserted_rows, 4);

    for policy in [MergePolicy::Replace, MergePolicy::Merge, MergePolicy::Preserve] {
        let config = school_config().with_merge_policy(policy);
        let again = coordinator.import_file(&path, &config).await;

        assert!(again.success, "{:?}: {:?}", policy, again.errors);
        assert_eq!(again.inserted_rows, 0, "{:?}", policy);
        assert_eq!(again.updated_rows, 0, "{:?}", policy);
        assert_eq!(again.skipped_rows, 4, "{:?}", policy);
        assert_eq!(again.processed_rows, 0);
        assert_eq!(again.warnings.len(), 4);
        assert!(again.outcomes.iter().all(|o| o.outcome
            == RowOutcome::Skipped {
                reason: SkipReason::NoChanges
            }));
    }

    assert_eq!(repo.read_all(EntityKind::School).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_merge_policies_against_stored_records() {
    logging::init_test();

    for (policy, expected_fields) in [
        (MergePolicy::Replace, vec!["website", "women_percentage"]),
        (MergePolicy::Merge, vec!["website"]),
        (MergePolicy::Preserve, vec!["website"]),
    ] {
        let (_db, repo, coordinator) = sqlite_coordinator();
        coordinator
            .import_file(&test_helpers::fixture("schools_legacy.csv"), &school_config())
            .await;

        let config = school_config().with_merge_policy(policy);
        let result = coordinator
            .import_file(&test_helpers::fixture("schools_current.csv"), &config)
            .await;

        assert!(result.success, "{:?}: {:?}", policy, result.errors);
        assert_eq!(result.inserted_rows, 1, "{:?}", policy);
        assert_eq!(result.updated_rows, 1, "{:?}", policy);

        match result.outcome_for_row(2) {
            Some(RowOutcome::Updated { id: Some(_), delta }) => {
                assert_eq!(delta.field_names(), expected_fields, "{:?}", policy);
            }
            other => panic!("{:?}: unexpected outcome {:?}", policy, other),
        }

        let records = repo.read_all(EntityKind::School).await.unwrap();
        assert_eq!(records.len(), 5);
        let hbs = records
            .iter()
            .find(|r| r.entity.text("name") == Some("Harvard Business School"))
            .unwrap();
        assert_eq!(hbs.entity.text("website"), Some("https://www.hbs.edu"));
        let women = if policy == MergePolicy::Replace { 46.0 } else { 45.0 };
        assert_eq!(hbs.entity.get("women_percentage"), &FieldValue::Percentage(women));
        // 未提供的字段保持原值
        assert_eq!(hbs.entity.text("tuition"), Some("$146,880"));
    }
}

#[tokio::test]
async fn test_validate_only_projects_counts_without_writing() {
    logging::init_test();
    let (_db, repo, coordinator) = sqlite_coordinator();
    coordinator
        .import_file(&test_helpers::fixture("schools_legacy.csv"), &school_config())
        .await;

    let config = school_config()
        .with_merge_policy(MergePolicy::Replace)
        .with_validate_only(true);
    let dry = coordinator
        .import_file(&test_helpers::fixture("schools_current.csv"), &config)
        .await;

    assert!(dry.validate_only);
    assert_eq!(dry.inserted_rows, 1);
    assert_eq!(dry.updated_rows, 1);

    let records = repo.read_all(EntityKind::School).await.unwrap();
    assert_eq!(records.len(), 4);
    let hbs = records
        .iter()
        .find(|r| r.entity.text("name") == Some("Harvard Business School"))
        .unwrap();
    assert_eq!(hbs.entity.get("website"), &FieldValue::Null);

    // 演练结果与真实运行一致
    let real = coordinator
        .import_file(
            &test_helpers::fixture("schools_current.csv"),
            &config.clone().with_validate_only(false),
        )
        .await;
    assert_eq!(real.inserted_rows, dry.inserted_rows);
    assert_eq!(real.updated_rows, dry.updated_rows);
    assert_eq!(real.skipped_rows, dry.skipped_rows);
}

#[tokio::test]
async fn test_row_level_problems_do_not_abort_the_run() {
    logging::init_test();
    let (_db, repo, coordinator) = sqlite_coordinator();

    let result = coordinator
        .import_file(&test_helpers::fixture("schools_with_errors.csv"), &school_config())
        .await;

    assert!(!result.success);
    assert_eq!(result.total_rows, 5);
    assert_eq!(result.inserted_rows, 2);
    assert_eq!(result.failed_rows, 3);
    assert!(result.is_reconciled());

    let rows: Vec<usize> = result.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![3, 4, 5]);
    assert_eq!(result.errors[0].kind, IssueKind::RowValidation);
    assert_eq!(result.errors[0].field.as_deref(), Some("name"));
    assert_eq!(result.errors[1].kind, IssueKind::RowValidation);
    assert_eq!(result.errors[2].kind, IssueKind::RowProcessing);

    assert_eq!(repo.read_all(EntityKind::School).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_file_is_single_file_error() {
    logging::init_test();
    let (_db, repo, coordinator) = sqlite_coordinator();

    let result = coordinator
        .import_file(&test_helpers::fixture("does_not_exist.csv"), &school_config())
        .await;

    assert!(!result.success);
    assert_eq!(result.total_rows, 0);
    assert_eq!(result.processed_rows, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, IssueKind::FileParse);
    assert!(repo.read_all(EntityKind::School).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_rejection_isolated_to_one_row() {
    logging::init_test();
    let (_db, repo) = test_helpers::create_constrained_school_repo().expect("constrained repo");
    let repo = Arc::new(repo);
    let coordinator = ImportCoordinator::new(repo.clone());

    let mut content = String::from("name,location,mean_gmat\n");
    for i in 1..=10 {
        let gmat = if i == 4 { 7300 } else { 700 };
        content.push_str(&format!("School {},City {},{}\n", i, i, gmat));
    }
    let file = test_helpers::write_csv(&content).unwrap();

    let result = coordinator
        .import_file(file.path(), &school_config().with_batch_size(10))
        .await;

    assert_eq!(result.inserted_rows, 9);
    assert_eq!(result.failed_rows, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row, 5);
    assert_eq!(result.errors[0].kind, IssueKind::Write);
    assert!(result.is_reconciled());
    assert_eq!(repo.read_all(EntityKind::School).await.unwrap().len(), 9);
}

#[tokio::test]
async fn test_within_file_duplicate_merges_into_new_row() {
    logging::init_test();
    let (_db, repo, coordinator) = sqlite_coordinator();
    let file = test_helpers::write_csv(
        "name,location,class_size,website\n\
         Acme B-School,Springfield,400,\n\
         acme b-school,Springfield,450,www.acme.edu\n",
    )
    .unwrap();

    let result = coordinator.import_file(file.path(), &school_config()).await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.inserted_rows, 1);
    assert_eq!(result.updated_rows, 1);

    let records = repo.read_all(EntityKind::School).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity.get("class_size"), &FieldValue::Integer(450));
    assert_eq!(records[0].entity.text("name"), Some("Acme B-School"));
    assert_eq!(records[0].entity.text("website"), Some("https://www.acme.edu"));
}

#[tokio::test]
async fn test_import_modes_respected() {
    logging::init_test();
    let (_db, repo, coordinator) = sqlite_coordinator();
    coordinator
        .import_file(&test_helpers::fixture("schools_legacy.csv"), &school_config())
        .await;

    let insert_only = school_config().with_mode(ImportMode::Insert);
    let result = coordinator
        .import_file(&test_helpers::fixture("schools_current.csv"), &insert_only)
        .await;
    assert_eq!(result.inserted_rows, 1);
    assert_eq!(result.updated_rows, 0);
    assert_eq!(
        result.outcome_for_row(2),
        Some(&RowOutcome::Skipped {
            reason: SkipReason::ModeExcluded
        })
    );

    let records = repo.read_all(EntityKind::School).await.unwrap();
    let hbs = records
        .iter()
        .find(|r| r.entity.text("name") == Some("Harvard Business School"))
        .unwrap();
    assert_eq!(hbs.entity.get("website"), &FieldValue::Null);
}

#[tokio::test]
async fn test_scholarship_legacy_file() {
    logging::init_test();
    let (_db, repo, coordinator) = sqlite_coordinator();
    let config = ImportConfig::for_kind(EntityKind::Scholarship);

    let result = coordinator
        .import_file(&test_helpers::fixture("scholarships_legacy.csv"), &config)
        .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.inserted_rows, 3);

    let records = repo.read_all(EntityKind::Scholarship).await.unwrap();
    let chevening = records
        .iter()
        .find(|r| r.entity.text("name") == Some("Chevening Scholarship"))
        .unwrap();
    assert_eq!(chevening.entity.text("provider"), Some("UK Government"));
    assert_eq!(
        chevening.entity.text("description"),
        Some("Chevening Scholarship offered by UK Government")
    );
    assert_eq!(
        chevening.entity.text("eligibility"),
        Some("Leadership potential\nTwo years of work experience")
    );
    assert_eq!(chevening.entity.text("deadline"), Some("2024-11-05"));
    assert_eq!(chevening.entity.text("application_url"), Some("https://www.chevening.org"));
    assert_eq!(chevening.entity.text("countries"), Some("UK"));
    assert_eq!(chevening.entity.get("fully_funded"), &FieldValue::Boolean(true));

    let forte = records
        .iter()
        .find(|r| r.entity.text("name") == Some("Forte Fellowship"))
        .unwrap();
    assert_eq!(forte.entity.text("deadline"), Some("2024-10-01"));
    assert_eq!(forte.entity.text("amount"), Some("10000"));
    assert_eq!(forte.entity.get("fully_funded"), &FieldValue::Boolean(false));

    // 重导幂等
    let again = coordinator
        .import_file(&test_helpers::fixture("scholarships_legacy.csv"), &config)
        .await;
    assert_eq!(again.inserted_rows + again.updated_rows, 0);
    assert_eq!(again.skipped_rows, 3);
}
