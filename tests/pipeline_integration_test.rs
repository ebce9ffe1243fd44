// ==========================================
// 流水线集成测试
// ==========================================
// 覆盖: CSV 目录源 / SQLite 源 + config_kv 覆写 / CSV 与 SQLite 输出
// ==========================================


use bom_explosion::config::config_keys;
use bom_explosion::domain::LeafFilter;
use bom_explosion::importer::{open_source, ImportError, TableSource};
use bom_explosion::repository::{ExplodedBomRepository, CSV_COLUMNS};
use bom_explosion::{
    run_pipeline, ConfigOverrides, ExplosionConfig, ExplosionError, ExplosionOrchestrator,
};
use std::fs;
use test_helpers::{create_source_db, create_source_dir, d, set_global_config, write_table};

fn config_for(source: &std::path::Path, output: std::path::PathBuf) -> ExplosionConfig {
    ExplosionConfig {
        source_path: source.to_path_buf(),
        output_path: output,
        ..Default::default()
    }
}

#[test]
fn test_csv_directory_to_csv_output() {
    let source = create_source_dir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("processed").join("exploded_bom.csv");

    let report = run_pipeline(
        config_for(source.path(), output.clone()),
        &ConfigOverrides::default(),
    )
    .unwrap();

    assert_eq!(report.leaves.len(), 11);
    assert_eq!(report.unmatched_cost_count, 0);

    let content = fs::read_to_string(&output).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next().unwrap(), CSV_COLUMNS.join(","));
    assert_eq!(lines.count(), 11);
}

#[test]
fn test_sqlite_source_to_sqlite_output() {
    let (_db_file, db_path) = create_source_db().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("exploded.db");

    let report = run_pipeline(
        config_for(std::path::Path::new(&db_path), output.clone()),
        &ConfigOverrides::default(),
    )
    .unwrap();

    let repo = ExplodedBomRepository::new(output.to_str().unwrap()).unwrap();
    assert_eq!(repo.count().unwrap(), report.leaves.len());
    assert_eq!(repo.list_all().unwrap(), report.leaves);
}

#[test]
fn test_numeric_alternative_cells_still_join() {
    let (_db_file, db_path) = create_source_db().unwrap();
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "UPDATE MAST SET STLAL = 1; UPDATE STKO SET STLAL = 1.0; UPDATE STPO SET POSNR = CAST(POSNR AS INTEGER);",
    )
    .unwrap();
    drop(conn);

    let loaded = open_source(std::path::Path::new(&db_path)).unwrap();
    let orchestrator =
        ExplosionOrchestrator::from_source(loaded.as_ref(), ExplosionConfig::default()).unwrap();
    let report = orchestrator.explode(d(2021, 1, 1), false);

    assert_eq!(report.leaves.len(), 11);
    assert!(report.leaves.iter().all(|l| l.alternative == "01"));
}

#[test]
fn test_config_kv_overrides_then_cli_wins() {
    let (_db_file, db_path) = create_source_db().unwrap();
    set_global_config(&db_path, config_keys::KEY_DATE, "2019-06-01").unwrap();
    set_global_config(&db_path, config_keys::ROOT_QUANTITY, "10").unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    // config_kv 的关键日期早于全部 BOM 头 → 仅根物料终端记录
    let report = run_pipeline(
        config_for(std::path::Path::new(&db_path), out_dir.path().join("a.csv")),
        &ConfigOverrides::default(),
    )
    .unwrap();
    assert_eq!(report.key_date, d(2019, 6, 1));
    assert_eq!(report.leaves.len(), 2);
    assert!(report.leaves.iter().all(|l| l.total_quantity == 10.0));

    // 命令行关键日期优先
    let overrides = ConfigOverrides {
        key_date: Some(d(2021, 1, 1)),
        ..Default::default()
    };
    let report = run_pipeline(
        config_for(std::path::Path::new(&db_path), out_dir.path().join("b.csv")),
        &overrides,
    )
    .unwrap();
    assert_eq!(report.leaves.len(), 11);
    let mat005 = report
        .leaves
        .iter()
        .find(|l| l.root_material == "MAT001" && l.component == "MAT005" && !l.is_terminal())
        .unwrap();
    assert_eq!(mat005.total_quantity, 60.0);
}

#[test]
fn test_malformed_date_fails_at_load() {
    let source = create_source_dir().unwrap();
    write_table(
        source.path(),
        "STKO.csv",
        "MATNR,WERKS,STLNR,STLAL,STLAN,DATUV,BMENG\nMAT001,PL01,BOM001,01,1,01.01.2020,1\n",
    )
    .unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let result = run_pipeline(
        config_for(source.path(), out_dir.path().join("out.csv")),
        &ConfigOverrides::default(),
    );

    assert!(matches!(
        result,
        Err(ExplosionError::Import(ImportError::DateFormatError { .. }))
    ));
    assert!(!out_dir.path().join("out.csv").exists());
}

#[test]
fn test_missing_required_table_is_error() {
    let source = create_source_dir().unwrap();
    fs::remove_file(source.path().join("STPO.csv")).unwrap();

    let result = open_source(source.path()).unwrap().load();

    assert!(matches!(result, Err(ImportError::TableMissing(_))));
}

#[test]
fn test_missing_cost_table_leaves_costs_empty() {
    let source = create_source_dir().unwrap();
    fs::remove_file(source.path().join("MBEW.csv")).unwrap();

    let loaded = open_source(source.path()).unwrap();
    let orchestrator =
        ExplosionOrchestrator::from_source(loaded.as_ref(), ExplosionConfig::default()).unwrap();
    let report = orchestrator.explode(d(2021, 1, 1), false);

    assert!(report.leaves.iter().all(|l| l.total_cost.is_none()));
    assert_eq!(report.unmatched_cost_count, report.leaves.len());
}

#[test]
fn test_leaf_filter_selects_one_root() {
    let source = create_source_dir().unwrap();
    let loaded = open_source(source.path()).unwrap();
    let orchestrator =
        ExplosionOrchestrator::from_source(loaded.as_ref(), ExplosionConfig::default()).unwrap();
    let report = orchestrator.run();

    let filter = LeafFilter {
        material: Some("MAT002".to_string()),
        plant: Some("PL01".to_string()),
        alternative: None,
    };
    let selected = filter.apply(&report.leaves);

    assert_eq!(selected.len(), 4);
    assert!(selected.iter().all(|l| l.root_material == "MAT002"));
}
