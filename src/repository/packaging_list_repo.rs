// ==========================================
// BOM 包装管理系统 - 包装清单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 清单创建与单元归属必须在同一事务内完成，失败则整体回滚
// ==========================================

use crate::domain::packaging::{
    is_assigned_list_id, PackagingList, PackagingListSummary, ShippingInfo,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction,
    TransactionBehavior,
};
use std::sync::{Arc, Mutex};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// PackagingListRepository - 包装清单仓储
// ==========================================
pub struct PackagingListRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PackagingListRepository {
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

    /// 创建包装清单并将单元归属到该清单（原子操作）
    ///
    /// 事务内步骤:
    /// 1. 重新读取每个单元：不存在 → NotFound；不属于 list.project_id → ValidationError；
    ///    已归属 → UnitAlreadyAssigned
    /// 2. 以 “list_id 仍为空” 为条件更新每个单元（比较并交换）
    /// 3. 插入清单行（外键在提交时检查）
    ///
    /// # 参数
    /// - `list`: 新清单
    /// - `unit_ids`: 成员单元ID（调用方保证无重复）
    ///
    /// # 返回
    /// - `Ok(count)`: 更新的单元数（等于 unit_ids.len()）
    /// - `Err`: 任一步骤失败，事务已显式回滚，无任何部分写入
    pub fn create_with_units(
        &self,
        list: &PackagingList,
        unit_ids: &[String],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        match assign_and_insert(&tx, list, unit_ids) {
            Ok(updated) => {
                tx.commit().map_err(|e| {
                    tracing::warn!(list_id = %list.list_id, error = %e, "包装清单事务提交失败");
                    RepositoryError::DatabaseTransactionError(e.to_string())
                })?;
                Ok(updated)
            }
            Err(e) => {
                tracing::warn!(list_id = %list.list_id, error = %e, "包装清单事务回滚");
                if let Err(rb) = tx.rollback() {
                    tracing::error!(list_id = %list.list_id, error = %rb, "事务回滚失败");
                }
                Err(e)
            }
        }
    }

    /// 按主键查询
    pub fn find_by_id(&self, list_id: &str) -> RepositoryResult<Option<PackagingList>> {
        let conn = self.get_conn()?;
        let list = conn
            .query_row(
                r#"
                SELECT list_id, project_id, list_weight, ship_from, ship_to, image_id, created_at
                FROM packaging_list
                WHERE list_id = ?1
                "#,
                params![list_id],
                map_list_row,
            )
            .optional()?;
        Ok(list)
    }

    /// 查询项目下的清单摘要（含成员单元数）
    pub fn find_summaries_by_project(
        &self,
        project_id: &str,
    ) -> RepositoryResult<Vec<PackagingListSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                l.list_id, l.project_id, l.list_weight, l.ship_from, l.ship_to, l.image_id, l.created_at,
                (SELECT COUNT(*) FROM packaging_unit u WHERE u.list_id = l.list_id) AS unit_count
            FROM packaging_list l
            WHERE l.project_id = ?1
            ORDER BY l.list_id
            "#,
        )?;

        let summaries = stmt
            .query_map(params![project_id], |row| {
                Ok(PackagingListSummary {
                    list: map_list_row(row)?,
                    unit_count: row.get::<_, i64>(7)? as usize,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(summaries)
    }

    /// 更新清单发货信息（不涉及成员）
    pub fn update_shipping(&self, list_id: &str, info: &ShippingInfo) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE packaging_list
            SET ship_from = ?2, ship_to = ?3, image_id = ?4
            WHERE list_id = ?1
            "#,
            params![list_id, info.ship_from, info.ship_to, info.image_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PackagingList".to_string(),
                id: list_id.to_string(),
            });
        }
        Ok(())
    }
}

/// 事务体：校验 → 更新单元 → 插入清单
fn assign_and_insert(
    tx: &Transaction,
    list: &PackagingList,
    unit_ids: &[String],
) -> RepositoryResult<usize> {
    // 1. 事务内重新校验项目与归属状态
    for unit_id in unit_ids {
        let current: Option<(Option<String>, Option<String>)> = tx
            .query_row(
                r#"
                SELECT u.list_id, d.project_id
                FROM packaging_unit u
                LEFT JOIN bom_drawing d ON d.drawing_id = u.drawing_id
                WHERE u.unit_id = ?1
                "#,
                params![unit_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match current {
            None => {
                return Err(RepositoryError::NotFound {
                    entity: "PackagingUnit".to_string(),
                    id: unit_id.clone(),
                })
            }
            Some((_, project_id)) if project_id.as_deref() != Some(list.project_id.as_str()) => {
                return Err(RepositoryError::ValidationError(format!(
                    "包装单元{}不属于项目{}",
                    unit_id, list.project_id
                )))
            }
            Some((existing, _)) if is_assigned_list_id(existing.as_deref()) => {
                return Err(RepositoryError::UnitAlreadyAssigned {
                    unit_id: unit_id.clone(),
                    list_id: existing.unwrap_or_default(),
                })
            }
            Some(_) => {}
        }
    }

    // 2. 比较并交换：只更新仍未归属的单元
    let mut updated = 0usize;
    {
        let mut stmt = tx.prepare(
            r#"
            UPDATE packaging_unit
            SET list_id = ?1
            WHERE unit_id = ?2 AND (list_id IS NULL OR TRIM(list_id) = '')
            "#,
        )?;

        for unit_id in unit_ids {
            let affected = stmt.execute(params![list.list_id, unit_id])?;
            if affected == 0 {
                return Err(RepositoryError::UnitAlreadyAssigned {
                    unit_id: unit_id.clone(),
                    list_id: String::new(),
                });
            }
            updated += affected;
        }
    }

    // 3. 插入清单
    tx.execute(
        r#"
        INSERT INTO packaging_list (
            list_id, project_id, list_weight, ship_from, ship_to, image_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            list.list_id,
            list.project_id,
            list.list_weight,
            list.ship_from,
            list.ship_to,
            list.image_id,
            list.created_at.format(DATETIME_FORMAT).to_string(),
        ],
    )
    .map_err(|e| {
        RepositoryError::DatabaseTransactionError(format!(
            "包装清单插入失败(list_id={}): {}",
            list.list_id, e
        ))
    })?;

    Ok(updated)
}

fn map_list_row(row: &Row) -> SqliteResult<PackagingList> {
    let created_at_str: String = row.get(6)?;
    Ok(PackagingList {
        list_id: row.get(0)?,
        project_id: row.get(1)?,
        list_weight: row.get(2)?,
        ship_from: row.get(3)?,
        ship_to: row.get(4)?,
        image_id: row.get(5)?,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FORMAT).map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)),
        )?,
    })
}
