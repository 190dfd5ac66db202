//! Work Context - 作品结构限界上下文
//!
//! 职责:
//! - 目录扁平化与分节识别
//! - 章节树（arena）构建、类型推断、序号解析
//! - 已知不规则作品的目录修正
//! - 分节内容引用的继承

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub mod corrections;
pub mod hierarchy;
pub mod numbering;
pub mod section_links;
pub mod toc;

pub use aggregate::WorkTree;
pub use corrections::apply_corrections;
pub use entities::{ChapterNode, NewChapterNode};
pub use errors::WorkError;
pub use hierarchy::{build_from_spine, build_hierarchy, SpineEntry};
pub use section_links::resolve_section_links;
pub use toc::{normalize_outline, OutlineEntry, TocEntry};
pub use value_objects::{ElementType, HierarchyType, NodeIndex, FINAL_CHAPTER_NUMBER, UNNUMBERED};
