// ==========================================
// 销售导入门户 - 商品目录 Repository 实现
// ==========================================
// 职责: 实现 ItemStore（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{lock_connection, DbPool};
use crate::domain::catalog::{CatalogItem, SaleRecord, Variation};
use crate::domain::types::Channel;
use crate::importer::date_parser::parse_date;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::item_repo::ItemStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

// ==========================================
// SqliteItemStore
// ==========================================
pub struct SqliteItemStore {
    pool: Arc<DbPool>,
}

impl SqliteItemStore {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - pool: 连接池（首次访问时建立连接）
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// 读取商品（item_id 为 None 时读取全部）
    fn load_items(conn: &Connection, item_id: Option<&str>) -> RepositoryResult<Vec<CatalogItem>> {
        // === 商品 ===
        let mut items = Vec::new();
        {
            let mut stmt = conn.prepare(
                r#"
                SELECT item_id, short_code, item_name, group_name, category
                FROM catalog_item
                WHERE (?1 IS NULL OR item_id = ?1)
                ORDER BY item_id
                "#,
            )?;
            let rows = stmt.query_map(params![item_id], |row| {
                Ok(CatalogItem {
                    item_id: row.get(0)?,
                    short_code: row.get(1)?,
                    name: row.get(2)?,
                    group: row.get(3)?,
                    category: row.get(4)?,
                    variations: Vec::new(),
                })
            })?;
            for row in rows {
                items.push(row?);
            }
        }

        let item_pos: HashMap<String, usize> = items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.item_id.clone(), pos))
            .collect();

        // === 规格 ===
        // (item_id, variation_index) → (商品位置, 规格位置)
        let mut variation_pos: HashMap<(String, i64), (usize, usize)> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                r#"
                SELECT item_id, variation_index, value, name, sap_code, prices_json
                FROM item_variation
                WHERE (?1 IS NULL OR item_id = ?1)
                ORDER BY item_id, variation_index
                "#,
            )?;
            let rows = stmt.query_map(params![item_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?;
            for row in rows {
                let (owner, index, value, name, sap_code, prices_json) = row?;
                let Some(&pos) = item_pos.get(&owner) else {
                    continue;
                };
                let variations = &mut items[pos].variations;
                variations.push(Variation {
                    value,
                    name,
                    prices: serde_json::from_str(&prices_json)?,
                    sap_code,
                    sales_history: Vec::new(),
                });
                variation_pos.insert((owner, index), (pos, variations.len() - 1));
            }
        }

        // === 销售历史（record_id 顺序 = 追加顺序）===
        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, item_id, variation_index, sale_date, sale_time,
                   channel, restaurant, quantity, value, category
            FROM sale_record
            WHERE (?1 IS NULL OR item_id = ?1)
            ORDER BY record_id
            "#,
        )?;
        let rows = stmt.query_map(params![item_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, String>(9)?,
            ))
        })?;

        for row in rows {
            let (record_id, owner, index, raw_date, time, raw_channel, restaurant, quantity, value, category) =
                row?;
            let Some(&(pos, vpos)) = variation_pos.get(&(owner, index)) else {
                continue;
            };

            // 历史数据可能来自其他写入方，日期/渠道无法识别的记录跳过
            let (Some(date), Some(channel)) = (parse_date(&raw_date), Channel::parse(&raw_channel))
            else {
                warn!(record_id, raw_date = %raw_date, raw_channel = %raw_channel, "销售记录日期或渠道无法识别，已跳过");
                continue;
            };

            items[pos].variations[vpos].sales_history.push(SaleRecord {
                date,
                time,
                channel,
                restaurant,
                quantity,
                value,
                category,
            });
        }

        Ok(items)
    }

    fn begin(conn: &Connection) -> RepositoryResult<Transaction<'_>> {
        conn.unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    fn commit(tx: Transaction<'_>) -> RepositoryResult<()> {
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    fn insert_sale_record(
        conn: &Connection,
        item_id: &str,
        variation_index: usize,
        record: &SaleRecord,
    ) -> rusqlite::Result<usize> {
        conn.execute(
            r#"
            INSERT INTO sale_record (
                item_id, variation_index, sale_date, sale_time, channel,
                restaurant, quantity, value, category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                item_id,
                variation_index as i64,
                record.date.format("%Y-%m-%d").to_string(),
                record.time,
                record.channel.as_str(),
                record.restaurant,
                record.quantity,
                record.value,
                record.category,
            ],
        )
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn find_all(&self) -> RepositoryResult<Vec<CatalogItem>> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;
        let _perf = crate::perf::PerfGuard::new("repo.load_catalog");
        let items = Self::load_items(&conn, None)?;
        debug!(items = items.len(), "读取商品目录");
        Ok(items)
    }

    async fn find_by_id(&self, item_id: &str) -> RepositoryResult<Option<CatalogItem>> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;
        Ok(Self::load_items(&conn, Some(item_id))?.into_iter().next())
    }

    async fn append_sale_record(
        &self,
        item_id: &str,
        variation_index: usize,
        record: &SaleRecord,
    ) -> RepositoryResult<()> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        match Self::insert_sale_record(&conn, item_id, variation_index, record) {
            Ok(_) => Ok(()),
            Err(e) => match RepositoryError::from(e) {
                RepositoryError::ForeignKeyViolation(_) => Err(RepositoryError::NotFound {
                    entity: "Variation".to_string(),
                    id: format!("{}#{}", item_id, variation_index),
                }),
                other => Err(other),
            },
        }
    }

    async fn clear_sales_history(&self, item_id: &str) -> RepositoryResult<usize> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;
        let tx = Self::begin(&conn)?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM catalog_item WHERE item_id = ?1",
                params![item_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !exists {
            return Err(RepositoryError::NotFound {
                entity: "CatalogItem".to_string(),
                id: item_id.to_string(),
            });
        }

        let deleted = tx.execute("DELETE FROM sale_record WHERE item_id = ?1", params![item_id])?;
        Self::commit(tx)?;
        Ok(deleted)
    }

    async fn insert_item(&self, item: &CatalogItem) -> RepositoryResult<()> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;
        let tx = Self::begin(&conn)?;

        tx.execute(
            r#"
            INSERT INTO catalog_item (item_id, short_code, item_name, group_name, category)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![item.item_id, item.short_code, item.name, item.group, item.category],
        )?;

        for (index, variation) in item.variations.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO item_variation (item_id, variation_index, value, name, sap_code, prices_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    item.item_id,
                    index as i64,
                    variation.value,
                    variation.name,
                    variation.sap_code,
                    serde_json::to_string(&variation.prices)?,
                ],
            )?;
            for record in &variation.sales_history {
                Self::insert_sale_record(&tx, &item.item_id, index, record)?;
            }
        }

        Self::commit(tx)?;
        Ok(())
    }

    async fn set_short_code(&self, item_id: &str, code: Option<&str>) -> RepositoryResult<()> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        let affected = conn.execute(
            "UPDATE catalog_item SET short_code = ?2 WHERE item_id = ?1",
            params![item_id, code],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CatalogItem".to_string(),
                id: item_id.to_string(),
            });
        }
        Ok(())
    }

    async fn set_variation_code(
        &self,
        item_id: &str,
        variation_index: usize,
        code: Option<&str>,
    ) -> RepositoryResult<()> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        let affected = conn.execute(
            "UPDATE item_variation SET sap_code = ?3 WHERE item_id = ?1 AND variation_index = ?2",
            params![item_id, variation_index as i64, code],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Variation".to_string(),
                id: format!("{}#{}", item_id, variation_index),
            });
        }
        debug!(item_id, variation_index, code, "规格编码已更新");
        Ok(())
    }

    async fn list_restaurants(&self) -> RepositoryResult<Vec<String>> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT TRIM(restaurant) AS name
            FROM sale_record
            WHERE TRIM(restaurant) <> ''
            ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }
}
