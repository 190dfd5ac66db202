//! Character Context - Entities

use uuid::Uuid;

use super::patterns::clean_name;

/// 人物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    id: Uuid,
    work_id: Uuid,
    name: String,
    variants: Vec<String>,
}

impl Character {
    pub fn new(work_id: Uuid, name: impl Into<String>, variants: Vec<String>) -> Self {
        Self::from_parts(Uuid::new_v4(), work_id, name, variants)
    }

    /// 从持久化记录恢复
    pub fn from_parts(
        id: Uuid,
        work_id: Uuid,
        name: impl Into<String>,
        variants: Vec<String>,
    ) -> Self {
        Self {
            id,
            work_id,
            name: name.into(),
            variants,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn work_id(&self) -> Uuid {
        self.work_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// 规范名 + 变体，清洗后按大小写去重，保持原有顺序
    pub fn name_forms(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        let mut forms = Vec::new();

        for raw in std::iter::once(&self.name).chain(self.variants.iter()) {
            let form = clean_name(raw);
            if form.is_empty() {
                continue;
            }
            let key = form.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            forms.push(form);
        }

        forms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_forms_deduplicate_case_insensitively() {
        let character = Character::new(
            Uuid::new_v4(),
            "Печорин",
            vec![
                "Григорий Александрович".to_string(),
                "печорин".to_string(),
                "«Печорин»".to_string(),
                "  ".to_string(),
            ],
        );

        assert_eq!(
            character.name_forms(),
            vec!["Печорин".to_string(), "Григорий Александрович".to_string()]
        );
    }
}
