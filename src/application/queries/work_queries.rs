//! Work Queries

use uuid::Uuid;

/// 列出所有作品
#[derive(Debug, Clone)]
pub struct ListWorks;

/// 获取作品的章节树
#[derive(Debug, Clone)]
pub struct GetWorkTree {
    pub work_id: Uuid,
}
