// ==========================================
// BOM 包装管理系统 - 包装单元数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 每个 (drawing_id, part_id) 最多一个包装单元（唯一约束兜底）
// ==========================================

use crate::domain::catalog::UnpackagedPart;
use crate::domain::packaging::PackagingUnit;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::ToSql;
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction,
    TransactionBehavior,
};
use std::sync::{Arc, Mutex};

/// IN 查询分块大小（低于 SQLite 默认变量上限）
const CHUNK_SIZE: usize = 500;

/// 单元重量信息（用于计算清单总重量）
#[derive(Debug, Clone, PartialEq)]
pub struct UnitWeight {
    pub unit_id: String,
    pub part_count: i64,
    pub part_weight: f64, // 部品单重（部材重量合计）
}

// ==========================================
// PackagingUnitRepository - 包装单元仓储
// ==========================================
pub struct PackagingUnitRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PackagingUnitRepository {
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

    /// 查询项目中尚未包装的部品
    ///
    /// 判定: 部品 ⟕ 包装单元 ON (drawing_id, part_id) 后单元侧为 NULL
    pub fn find_unpackaged_parts(&self, project_id: &str) -> RepositoryResult<Vec<UnpackagedPart>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT p.drawing_id, p.part_id, p.quantity
            FROM bom_part p
            INNER JOIN bom_drawing d ON d.drawing_id = p.drawing_id
            LEFT JOIN packaging_unit u
                ON u.drawing_id = p.drawing_id AND u.part_id = p.part_id
            WHERE d.project_id = ?1 AND u.unit_id IS NULL
            ORDER BY p.drawing_id, p.part_id
            "#,
        )?;

        let parts = stmt
            .query_map(params![project_id], |row| {
                Ok(UnpackagedPart {
                    drawing_id: row.get(0)?,
                    part_id: row.get(1)?,
                    quantity: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(parts)
    }

    /// 批量插入包装单元（冲突忽略）
    ///
    /// # 返回
    /// - `Ok(count)`: 实际插入的记录数；同一部品已有单元时静默跳过
    /// - `Err(UnitIdCollision)`: unit_id 已被另一个 (drawing_id, part_id) 占用，整批回滚
    ///
    /// # 红线
    /// - 必须在事务中完成（IMMEDIATE，持有写锁直到提交）
    pub fn insert_ignore_batch(&self, units: &[PackagingUnit]) -> RepositoryResult<usize> {
        if units.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let outcome = insert_units_in_tx(&tx, units);
        match outcome {
            Ok(inserted) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(inserted)
            }
            Err(e) => {
                tracing::warn!(error = %e, "包装单元批量插入失败, 回滚事务");
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!(error = %rollback_err, "事务回滚失败");
                }
                Err(e)
            }
        }
    }

    /// 按主键查询
    pub fn find_by_id(&self, unit_id: &str) -> RepositoryResult<Option<PackagingUnit>> {
        let conn = self.get_conn()?;
        let unit = conn
            .query_row(
                r#"
                SELECT unit_id, drawing_id, part_id, part_count, total_count, list_id
                FROM packaging_unit
                WHERE unit_id = ?1
                "#,
                params![unit_id],
                map_unit_row,
            )
            .optional()?;
        Ok(unit)
    }

    /// 按主键批量查询（结果按 unit_id 排序；不存在的ID不出现在结果中）
    pub fn find_by_ids(&self, unit_ids: &[String]) -> RepositoryResult<Vec<PackagingUnit>> {
        if unit_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut out = Vec::with_capacity(unit_ids.len());

        for chunk in unit_ids.chunks(CHUNK_SIZE) {
            let placeholders = std::iter::repeat("?")
                .take(chunk.len())
                .collect::<Vec<_>>()
                .join(", ");

            let sql = format!(
                r#"
                SELECT unit_id, drawing_id, part_id, part_count, total_count, list_id
                FROM packaging_unit
                WHERE unit_id IN ({})
                "#,
                placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let params_vec: Vec<&dyn ToSql> = chunk.iter().map(|s| s as &dyn ToSql).collect();
            let rows = stmt
                .query_map(params_vec.as_slice(), map_unit_row)?
                .collect::<SqliteResult<Vec<_>>>()?;
            out.extend(rows);
        }

        out.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        Ok(out)
    }

    /// 查询不属于指定项目的单元ID（图纸缺失的单元同样视为不属于）
    pub fn find_ids_outside_project(
        &self,
        project_id: &str,
        unit_ids: &[String],
    ) -> RepositoryResult<Vec<String>> {
        if unit_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut out = Vec::new();

        for chunk in unit_ids.chunks(CHUNK_SIZE) {
            let placeholders = std::iter::repeat("?")
                .take(chunk.len())
                .collect::<Vec<_>>()
                .join(", ");

            let sql = format!(
                r#"
                SELECT u.unit_id
                FROM packaging_unit u
                LEFT JOIN bom_drawing d ON d.drawing_id = u.drawing_id
                WHERE u.unit_id IN ({})
                  AND (d.project_id IS NULL OR d.project_id <> ?)
                "#,
                placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let mut params_vec: Vec<&dyn ToSql> = chunk.iter().map(|s| s as &dyn ToSql).collect();
            params_vec.push(&project_id);
            let rows = stmt
                .query_map(params_vec.as_slice(), |row| row.get::<_, String>(0))?
                .collect::<SqliteResult<Vec<_>>>()?;
            out.extend(rows);
        }

        out.sort();
        Ok(out)
    }

    /// 查询项目下尚未归属清单的包装单元（list_id 为 NULL 或空白）
    pub fn find_unassigned_by_project(&self, project_id: &str) -> RepositoryResult<Vec<PackagingUnit>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT u.unit_id, u.drawing_id, u.part_id, u.part_count, u.total_count, u.list_id
            FROM packaging_unit u
            INNER JOIN bom_drawing d ON d.drawing_id = u.drawing_id
            WHERE d.project_id = ?1
              AND (u.list_id IS NULL OR TRIM(u.list_id) = '')
            ORDER BY u.unit_id
            "#,
        )?;

        let units = stmt
            .query_map(params![project_id], map_unit_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(units)
    }

    /// 查询单元的件数与部品单重
    pub fn find_unit_weights(&self, unit_ids: &[String]) -> RepositoryResult<Vec<UnitWeight>> {
        if unit_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut out = Vec::with_capacity(unit_ids.len());

        for chunk in unit_ids.chunks(CHUNK_SIZE) {
            let placeholders = std::iter::repeat("?")
                .take(chunk.len())
                .collect::<Vec<_>>()
                .join(", ");

            let sql = format!(
                r#"
                SELECT
                    u.unit_id,
                    u.part_count,
                    COALESCE((
                        SELECT SUM(m.weight)
                        FROM bom_material m
                        WHERE m.drawing_id = u.drawing_id AND m.part_id = u.part_id
                    ), 0.0) AS part_weight
                FROM packaging_unit u
                WHERE u.unit_id IN ({})
                ORDER BY u.unit_id
                "#,
                placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let params_vec: Vec<&dyn ToSql> = chunk.iter().map(|s| s as &dyn ToSql).collect();
            let rows = stmt
                .query_map(params_vec.as_slice(), |row| {
                    Ok(UnitWeight {
                        unit_id: row.get(0)?,
                        part_count: row.get(1)?,
                        part_weight: row.get(2)?,
                    })
                })?
                .collect::<SqliteResult<Vec<_>>>()?;
            out.extend(rows);
        }

        Ok(out)
    }
}

/// 事务内逐条插入；被忽略的插入需确认是同一部品，否则视为ID冲突
fn insert_units_in_tx(tx: &Transaction, units: &[PackagingUnit]) -> RepositoryResult<usize> {
    let mut insert_stmt = tx.prepare(
        r#"
        INSERT OR IGNORE INTO packaging_unit (
            unit_id, drawing_id, part_id, part_count, total_count, list_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )?;
    let mut owner_stmt =
        tx.prepare("SELECT drawing_id, part_id FROM packaging_unit WHERE unit_id = ?1")?;

    let mut inserted = 0usize;
    for unit in units {
        let changed = insert_stmt.execute(params![
            unit.unit_id,
            unit.drawing_id,
            unit.part_id,
            unit.part_count,
            unit.total_count,
            unit.list_id,
        ])?;
        if changed > 0 {
            inserted += changed;
            continue;
        }

        let owner: Option<(String, String)> = owner_stmt
            .query_row(params![unit.unit_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;
        if let Some((drawing_id, part_id)) = owner {
            if drawing_id != unit.drawing_id || part_id != unit.part_id {
                return Err(RepositoryError::UnitIdCollision {
                    unit_id: unit.unit_id.clone(),
                    existing: format!("{}/{}", drawing_id, part_id),
                    incoming: format!("{}/{}", unit.drawing_id, unit.part_id),
                });
            }
        }
    }

    Ok(inserted)
}

pub(crate) fn map_unit_row(row: &Row) -> SqliteResult<PackagingUnit> {
    Ok(PackagingUnit {
        unit_id: row.get(0)?,
        drawing_id: row.get(1)?,
        part_id: row.get(2)?,
        part_count: row.get(3)?,
        total_count: row.get(4)?,
        list_id: row.get(5)?,
    })
}
