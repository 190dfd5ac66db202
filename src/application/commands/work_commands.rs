//! Work Commands

use std::path::PathBuf;
use uuid::Uuid;

/// 导入电子书命令（按文件名幂等）
#[derive(Debug, Clone)]
pub struct BuildWork {
    pub path: PathBuf,
}

/// 删除作品命令
#[derive(Debug, Clone)]
pub struct DeleteWork {
    pub work_id: Uuid,
}
