//! Mention Commands

use uuid::Uuid;

/// 确保章节已做过人物提及检测
#[derive(Debug, Clone)]
pub struct EnsureMentions {
    pub chapter_id: Uuid,
    /// 章节清洗后的正文
    pub markup: String,
    /// 已处理时也重新检测
    pub force: bool,
}
