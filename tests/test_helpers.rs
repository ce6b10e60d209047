// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、目录数据生成等功能
// ==========================================

#![allow(dead_code)]

use bom_packaging::app::AppState;
use bom_packaging::db::{init_schema, open_sqlite_connection};
use bom_packaging::domain::{Drawing, DrawingKind, Material, Part};
use bom_packaging::repository::CatalogRepository;
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建临时数据库上的 AppState
pub fn create_test_state() -> (NamedTempFile, AppState) {
    bom_packaging::logging::init_test();
    let (temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    (temp_file, state)
}

/// 打开一个独立连接（用于直接检查或篡改数据）
pub fn open_raw_conn(db_path: &str) -> Connection {
    open_sqlite_connection(db_path).unwrap()
}

// ==========================================
// 目录数据
// ==========================================

pub fn seed_drawing(repo: &CatalogRepository, project_id: &str, drawing_id: &str) {
    repo.insert_drawing(&Drawing {
        drawing_id: drawing_id.to_string(),
        project_id: project_id.to_string(),
        drawing_name: format!("図面{}", drawing_id),
        drawing_kind: DrawingKind::Detail,
        assembly_drawing_id: None,
    })
    .unwrap();
}

pub fn seed_part(repo: &CatalogRepository, drawing_id: &str, part_id: &str, quantity: f64) {
    repo.insert_part(&Part {
        drawing_id: drawing_id.to_string(),
        part_id: part_id.to_string(),
        part_name: format!("部品{}", part_id),
        quantity,
        spare_quantity: 0.0,
        manufacturer: "社内".to_string(),
    })
    .unwrap();
}

pub fn seed_material(
    repo: &CatalogRepository,
    drawing_id: &str,
    part_id: &str,
    material_id: &str,
    weight: f64,
    quantity: f64,
) {
    repo.insert_material(&Material {
        drawing_id: drawing_id.to_string(),
        part_id: part_id.to_string(),
        material_id: material_id.to_string(),
        material_name: format!("部材{}", material_id),
        weight,
        quantity,
        material_type: "SS400".to_string(),
    })
    .unwrap();
}

/// 标准场景: 项目 PJ1 下一张图纸 D1，部品 P1(3件) / P2(2件)
///
/// P1 的部材: A(重量 1.5, 数量 2)、B(重量 0.5, 数量 1)
pub fn seed_standard_project(repo: &CatalogRepository) {
    seed_drawing(repo, "PJ1", "D1");
    seed_part(repo, "D1", "P1", 3.0);
    seed_part(repo, "D1", "P2", 2.0);
    seed_material(repo, "D1", "P1", "A", 1.5, 2.0);
    seed_material(repo, "D1", "P1", "B", 0.5, 1.0);
}

pub fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}
