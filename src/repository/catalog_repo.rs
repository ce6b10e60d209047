// ==========================================
// BOM 包装管理系统 - BOM 目录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 包装核心只读目录；写入方法供目录维护方与测试夹具使用
// ==========================================

use crate::domain::catalog::{Drawing, Material, Part};
use crate::domain::types::DrawingKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// CatalogRepository - 图纸/部品/部材仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入（目录维护）
    // ==========================================

    /// 插入或更新图纸
    pub fn insert_drawing(&self, drawing: &Drawing) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO bom_drawing (
                drawing_id, project_id, drawing_name, drawing_kind, assembly_drawing_id
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(drawing_id) DO UPDATE SET
                project_id = excluded.project_id,
                drawing_name = excluded.drawing_name,
                drawing_kind = excluded.drawing_kind,
                assembly_drawing_id = excluded.assembly_drawing_id
            "#,
            params![
                drawing.drawing_id,
                drawing.project_id,
                drawing.drawing_name,
                drawing.drawing_kind.to_db_str(),
                drawing.assembly_drawing_id,
            ],
        )?;
        Ok(())
    }

    /// 插入或更新部品
    pub fn insert_part(&self, part: &Part) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO bom_part (
                drawing_id, part_id, part_name, quantity, spare_quantity, manufacturer
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(drawing_id, part_id) DO UPDATE SET
                part_name = excluded.part_name,
                quantity = excluded.quantity,
                spare_quantity = excluded.spare_quantity,
                manufacturer = excluded.manufacturer
            "#,
            params![
                part.drawing_id,
                part.part_id,
                part.part_name,
                part.quantity,
                part.spare_quantity,
                part.manufacturer,
            ],
        )?;
        Ok(())
    }

    /// 插入或更新部材
    pub fn insert_material(&self, material: &Material) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO bom_material (
                drawing_id, part_id, material_id, material_name, weight, quantity, material_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(drawing_id, part_id, material_id) DO UPDATE SET
                material_name = excluded.material_name,
                weight = excluded.weight,
                quantity = excluded.quantity,
                material_type = excluded.material_type
            "#,
            params![
                material.drawing_id,
                material.part_id,
                material.material_id,
                material.material_name,
                material.weight,
                material.quantity,
                material.material_type,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 统计项目下的图纸数量
    pub fn count_drawings_by_project(&self, project_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bom_drawing WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 查询项目下的所有图纸
    pub fn find_drawings_by_project(&self, project_id: &str) -> RepositoryResult<Vec<Drawing>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT drawing_id, project_id, drawing_name, drawing_kind, assembly_drawing_id
            FROM bom_drawing
            WHERE project_id = ?1
            ORDER BY drawing_id
            "#,
        )?;

        let drawings = stmt
            .query_map(params![project_id], map_drawing_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(drawings)
    }
}

fn map_drawing_row(row: &Row) -> SqliteResult<Drawing> {
    Ok(Drawing {
        drawing_id: row.get(0)?,
        project_id: row.get(1)?,
        drawing_name: row.get(2)?,
        drawing_kind: DrawingKind::from_str(&row.get::<_, String>(3)?),
        assembly_drawing_id: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_repo() -> (Arc<Mutex<Connection>>, CatalogRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), CatalogRepository::new(conn))
    }

    fn make_drawing(id: &str, kind: DrawingKind, parent: Option<&str>) -> Drawing {
        Drawing {
            drawing_id: id.to_string(),
            project_id: "PJ1".to_string(),
            drawing_name: format!("図面{}", id),
            drawing_kind: kind,
            assembly_drawing_id: parent.map(|s| s.to_string()),
        }
    }

    fn make_part(name: &str) -> Part {
        Part {
            drawing_id: "D1".to_string(),
            part_id: "P1".to_string(),
            part_name: name.to_string(),
            quantity: 2.0,
            spare_quantity: 1.0,
            manufacturer: "社内".to_string(),
        }
    }

    #[test]
    fn test_drawings_by_project() {
        let (_conn, repo) = setup_test_repo();
        repo.insert_drawing(&make_drawing("D2", DrawingKind::Detail, Some("A1")))
            .unwrap();
        repo.insert_drawing(&make_drawing("A1", DrawingKind::Assembly, None))
            .unwrap();
        repo.insert_drawing(&make_drawing("D1", DrawingKind::Detail, Some("A1")))
            .unwrap();

        assert_eq!(repo.count_drawings_by_project("PJ1").unwrap(), 3);
        assert_eq!(repo.count_drawings_by_project("PJ2").unwrap(), 0);

        let drawings = repo.find_drawings_by_project("PJ1").unwrap();
        let ids: Vec<&str> = drawings.iter().map(|d| d.drawing_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "D1", "D2"]);
        assert_eq!(drawings[0].drawing_kind, DrawingKind::Assembly);
        assert_eq!(drawings[1].assembly_drawing_id.as_deref(), Some("A1"));
        assert!(repo.find_drawings_by_project("PJ2").unwrap().is_empty());
    }

    #[test]
    fn test_part_upsert_keeps_materials() {
        let (conn, repo) = setup_test_repo();
        repo.insert_drawing(&make_drawing("D1", DrawingKind::Detail, None))
            .unwrap();
        repo.insert_part(&make_part("ブラケット")).unwrap();
        repo.insert_material(&Material {
            drawing_id: "D1".to_string(),
            part_id: "P1".to_string(),
            material_id: "M1".to_string(),
            material_name: "PL-9".to_string(),
            weight: 1.5,
            quantity: 2.0,
            material_type: "SS400".to_string(),
        })
        .unwrap();

        // 重新导入同一部品只更新字段，不级联删除部材
        repo.insert_part(&make_part("ブラケット改")).unwrap();

        let conn = conn.lock().unwrap();
        let name: String = conn
            .query_row(
                "SELECT part_name FROM bom_part WHERE drawing_id = 'D1' AND part_id = 'P1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, "ブラケット改");

        let materials: i64 = conn
            .query_row("SELECT COUNT(*) FROM bom_material", [], |row| row.get(0))
            .unwrap();
        assert_eq!(materials, 1);
    }
}
