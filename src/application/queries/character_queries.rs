//! Character Queries

use uuid::Uuid;

/// 列出作品的人物
#[derive(Debug, Clone)]
pub struct ListCharacters {
    pub work_id: Uuid,
}

/// 人物的提及，可限定到某一章节为止
#[derive(Debug, Clone)]
pub struct GetCharacterMentions {
    pub character_id: Uuid,
    pub up_to_chapter: Option<Uuid>,
}
