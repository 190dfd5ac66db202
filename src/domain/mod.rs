//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Work Context: 作品结构（目录、章节树、序号）
//! - Character Context: 人物提及检测与高亮

pub mod character;
pub mod work;

// 共享的 HTML 处理
pub mod markup;
