// ==========================================
// 并发导入测试
// ==========================================
// 测试目标: 独立导入（院校 / 奖学金）可并发执行，
//           各自读取快照、互不干扰，结果顺序与提交顺序一致
// ==========================================


use smart_import::importer::{EntityImporter, ImportCoordinator};
use smart_import::repository::{EntityRepository, InMemoryEntityRepository, SqliteEntityRepository};
use smart_import::{logging, EntityKind, ImportConfig, MergePolicy};
use std::sync::Arc;
use std::time::Instant;

#[tokio::test]
async fn test_run_many_schools_and_scholarships() {
    logging::init_test();
    let (_temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let repo = Arc::new(SqliteEntityRepository::new(&db_path).expect("Failed to open repo"));
    let coordinator = ImportCoordinator::new(repo.clone());

    let jobs = vec![
        (
            test_helpers::fixture("schools_legacy.csv"),
            ImportConfig::for_kind(EntityKind::School),
        ),
        (
            test_helpers::fixture("scholarships_legacy.csv"),
            ImportConfig::for_kind(EntityKind::Scholarship).with_merge_policy(MergePolicy::Preserve),
        ),
    ];

    let start = Instant::now();
    let results = coordinator.run_many(jobs).await;
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "并发导入完成");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].kind, EntityKind::School);
    assert_eq!(results[1].kind, EntityKind::Scholarship);
    assert!(results.iter().all(|r| r.success));
    assert_ne!(results[0].run_id, results[1].run_id);

    assert_eq!(repo.read_all(EntityKind::School).await.unwrap().len(), 4);
    assert_eq!(repo.read_all(EntityKind::Scholarship).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_concurrent_runs_over_shared_repository() {
    logging::init_test();
    let repo = Arc::new(InMemoryEntityRepository::new());
    let coordinator = Arc::new(ImportCoordinator::new(repo.clone()));

    let mut handles = Vec::new();
    for i in 0..4 {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            let content = format!("name,location\nSchool {i},City {i}\nOther {i},Town {i}\n");
            let config = ImportConfig::for_kind(EntityKind::School);
            coordinator.import_bytes("batch.csv", content.as_bytes(), &config).await
        }));
    }

    for handle in handles {
        let result = handle.await.expect("task panicked");
        assert!(result.success);
        assert_eq!(result.inserted_rows, 2);
    }
    assert_eq!(repo.records(EntityKind::School).unwrap().len(), 8);
}
