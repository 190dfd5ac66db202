//! Character Context - 人物限界上下文
//!
//! 职责:
//! - 名字形式与俄语变格模式生成
//! - 章节内的提及检测与上下文提取
//! - 渲染时的提及高亮

mod entities;

pub mod highlighter;
pub mod patterns;
pub mod scanner;

pub use entities::Character;
pub use highlighter::render_highlighted;
pub use patterns::{compile_all, EntityPatterns, PatternError};
pub use scanner::{clean_text_for_storage, scan_mentions, MentionCandidate};
