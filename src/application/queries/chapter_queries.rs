//! Chapter Queries

use uuid::Uuid;

/// 获取章节清洗后的正文
#[derive(Debug, Clone)]
pub struct GetChapterContent {
    pub chapter_id: Uuid,
}

/// 获取章节在阅读顺序中的前后章节
#[derive(Debug, Clone)]
pub struct GetNavigation {
    pub chapter_id: Uuid,
}

/// 阅读章节：正文 + 提及检测 + 高亮 + 导航
#[derive(Debug, Clone)]
pub struct ReadChapter {
    pub chapter_id: Uuid,
}

/// 用作品的人物高亮一段标记
#[derive(Debug, Clone)]
pub struct RenderHighlighted {
    pub work_id: Uuid,
    pub markup: String,
}
