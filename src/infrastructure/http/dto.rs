//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{
    BuildWorkResponse, CharacterMentionsResponse, CharacterResponse, ChapterContentResponse,
    ChapterLink, ChapterTreeNode, MentionResponse, NavigationResponse, ReadChapterResponse,
    WorkResponse, WorkTreeResponse,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// 只带一个 ID 的请求
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ImportWorkRequest {
    /// 相对书库目录的路径
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ListCharactersRequest {
    pub work_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CharacterMentionsRequest {
    pub character_id: Uuid,
    #[serde(default)]
    pub up_to_chapter: Option<Uuid>,
}

// ============================================================================
// Work DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct WorkDto {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub filename: String,
    pub cover: Option<String>,
    pub added_at: String,
}

impl From<WorkResponse> for WorkDto {
    fn from(work: WorkResponse) -> Self {
        Self {
            id: work.id,
            title: work.title,
            author: work.author,
            filename: work.filename,
            cover: work.cover_ref,
            added_at: work.added_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportWorkDto {
    pub id: Uuid,
    pub title: String,
    pub chapters: usize,
    pub characters: usize,
    /// false 表示文件早已导入
    pub created: bool,
}

impl From<BuildWorkResponse> for ImportWorkDto {
    fn from(response: BuildWorkResponse) -> Self {
        Self {
            id: response.work_id,
            title: response.title,
            chapters: response.chapter_count,
            characters: response.character_count,
            created: response.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChapterNodeDto {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub element_type: String,
    pub label: String,
    pub number: u32,
    pub display_number: String,
    pub has_content: bool,
    pub is_processed: bool,
    pub children: Vec<ChapterNodeDto>,
}

impl From<ChapterTreeNode> for ChapterNodeDto {
    fn from(node: ChapterTreeNode) -> Self {
        Self {
            id: node.id,
            title: node.title,
            element_type: node.element_type,
            label: node.element_label,
            number: node.number,
            display_number: node.display_number,
            has_content: node.has_content,
            is_processed: node.is_processed,
            children: node.children.into_iter().map(ChapterNodeDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkTreeDto {
    pub work: WorkDto,
    pub chapters: Vec<ChapterNodeDto>,
}

impl From<WorkTreeResponse> for WorkTreeDto {
    fn from(tree: WorkTreeResponse) -> Self {
        Self {
            work: WorkDto::from(tree.work),
            chapters: tree.chapters.into_iter().map(ChapterNodeDto::from).collect(),
        }
    }
}

// ============================================================================
// Chapter DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ChapterLinkDto {
    pub id: Uuid,
    pub title: String,
}

impl From<ChapterLink> for ChapterLinkDto {
    fn from(link: ChapterLink) -> Self {
        Self {
            id: link.id,
            title: link.title,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NavigationDto {
    pub prev: Option<ChapterLinkDto>,
    pub next: Option<ChapterLinkDto>,
}

impl From<NavigationResponse> for NavigationDto {
    fn from(navigation: NavigationResponse) -> Self {
        Self {
            prev: navigation.prev.map(ChapterLinkDto::from),
            next: navigation.next.map(ChapterLinkDto::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChapterContentDto {
    pub id: Uuid,
    pub work_id: Uuid,
    pub title: String,
    pub content: String,
}

impl From<ChapterContentResponse> for ChapterContentDto {
    fn from(response: ChapterContentResponse) -> Self {
        Self {
            id: response.chapter_id,
            work_id: response.work_id,
            title: response.title,
            content: response.markup,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadChapterDto {
    pub id: Uuid,
    pub work_id: Uuid,
    pub title: String,
    /// 带人物高亮的正文
    pub content: String,
    pub navigation: NavigationDto,
}

impl From<ReadChapterResponse> for ReadChapterDto {
    fn from(response: ReadChapterResponse) -> Self {
        Self {
            id: response.chapter_id,
            work_id: response.work_id,
            title: response.title,
            content: response.markup,
            navigation: NavigationDto::from(response.navigation),
        }
    }
}

// ============================================================================
// Character DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CharacterDto {
    pub id: Uuid,
    pub work_id: Uuid,
    pub name: String,
    pub variants: Vec<String>,
}

impl From<CharacterResponse> for CharacterDto {
    fn from(character: CharacterResponse) -> Self {
        Self {
            id: character.id,
            work_id: character.work_id,
            name: character.name,
            variants: character.variants,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MentionDto {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub chapter_title: String,
    pub context: Option<String>,
}

impl From<MentionResponse> for MentionDto {
    fn from(mention: MentionResponse) -> Self {
        Self {
            id: mention.id,
            chapter_id: mention.chapter_id,
            chapter_title: mention.chapter_title,
            context: mention.context,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CharacterMentionsDto {
    pub character: CharacterDto,
    pub total: usize,
    pub mentions: Vec<MentionDto>,
}

impl From<CharacterMentionsResponse> for CharacterMentionsDto {
    fn from(response: CharacterMentionsResponse) -> Self {
        Self {
            character: CharacterDto::from(response.character),
            total: response.mentions.len(),
            mentions: response.mentions.into_iter().map(MentionDto::from).collect(),
        }
    }
}
