// ==========================================
// BOM 包装管理系统 - 视图查询仓储
// ==========================================
// 职责: 图纸 ⟕ 部品 ⟕ 部材 ⟕ 包装单元 ⟕ 包装清单 的扁平查询
// 红线: 只读
// ==========================================

use crate::domain::types::DrawingKind;
use crate::domain::view::FlatViewRow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ViewRepository - 扁平视图仓储
// ==========================================
pub struct ViewRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ViewRepository {
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

    /// 查询项目的扁平视图（一行一部材）
    ///
    /// 全部为左外连接：无部材的部品产生部材字段为 NULL 的一行，
    /// 无部品的图纸产生部品字段为 NULL 的一行。
    ///
    /// 排序: drawing_id, part_id, material_id
    pub fn find_flat_rows(&self, project_id: &str) -> RepositoryResult<Vec<FlatViewRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                d.project_id,
                d.drawing_id,
                d.drawing_name,
                d.drawing_kind,
                d.assembly_drawing_id,

                p.part_id,
                p.part_name,
                p.quantity,
                p.spare_quantity,
                p.manufacturer,

                m.material_id,
                m.material_name,
                m.weight,
                m.quantity,
                m.material_type,

                u.unit_id,
                u.part_count,
                u.total_count,

                l.list_id,
                l.list_weight,
                l.ship_from,
                l.ship_to,
                l.image_id,
                l.project_id
            FROM bom_drawing d
            LEFT JOIN bom_part p
                ON p.drawing_id = d.drawing_id
            LEFT JOIN bom_material m
                ON m.drawing_id = p.drawing_id AND m.part_id = p.part_id
            LEFT JOIN packaging_unit u
                ON u.drawing_id = p.drawing_id AND u.part_id = p.part_id
            LEFT JOIN packaging_list l
                ON l.list_id = u.list_id
            WHERE d.project_id = ?1
            ORDER BY d.drawing_id, p.part_id, m.material_id
            "#,
        )?;

        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(FlatViewRow {
                    project_id: row.get(0)?,
                    drawing_id: row.get(1)?,
                    drawing_name: row.get(2)?,
                    drawing_kind: DrawingKind::from_str(&row.get::<_, String>(3)?),
                    assembly_drawing_id: row.get(4)?,

                    part_id: row.get(5)?,
                    part_name: row.get(6)?,
                    quantity: row.get(7)?,
                    spare_quantity: row.get(8)?,
                    manufacturer: row.get(9)?,

                    material_id: row.get(10)?,
                    material_name: row.get(11)?,
                    material_weight: row.get(12)?,
                    material_quantity: row.get(13)?,
                    material_type: row.get(14)?,

                    unit_id: row.get(15)?,
                    part_count: row.get(16)?,
                    total_count: row.get(17)?,

                    list_id: row.get(18)?,
                    list_project_id: row.get(23)?,
                    list_weight: row.get(19)?,
                    ship_from: row.get(20)?,
                    ship_to: row.get(21)?,
                    image_id: row.get(22)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }
}
