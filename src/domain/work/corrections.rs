//! Correction Rules - 已知不规则作品的目录修正
//!
//! 少数经典作品的 EPUB 目录结构有误。修正规则以声明式表格描述，
//! 按作品标题匹配，在层级构建之前作用于扁平目录。

use super::toc::TocEntry;
use super::ElementType;

/// 标题匹配条件（小写、ё→е 后做子串匹配）
#[derive(Debug, Clone, Copy)]
pub struct TitleMatch {
    pub any_of: &'static [&'static str],
    pub none_of: &'static [&'static str],
}

impl TitleMatch {
    pub const fn any(any_of: &'static [&'static str]) -> Self {
        Self {
            any_of,
            none_of: &[],
        }
    }

    pub const fn excluding(self, none_of: &'static [&'static str]) -> Self {
        Self {
            any_of: self.any_of,
            none_of,
        }
    }

    pub fn matches(&self, title: &str) -> bool {
        let title = fold(title);
        (self.any_of.is_empty() || self.any_of.iter().any(|k| title.contains(k)))
            && !self.none_of.iter().any(|k| title.contains(k))
    }
}

fn fold(text: &str) -> String {
    text.to_lowercase().replace('ё', "е")
}

/// 单条修正操作
#[derive(Debug, Clone, Copy)]
pub enum Correction {
    /// 重命名第一个匹配项
    Relabel {
        target: TitleMatch,
        title: &'static str,
    },
    /// 为所有匹配项指定类型；is_section 为 None 时保持不变
    Classify {
        target: TitleMatch,
        element_type: ElementType,
        is_section: Option<bool>,
    },
    /// 把所有匹配 children 的项（连同子树）按原顺序移到 parent 之下
    Regroup {
        parent: TitleMatch,
        children: TitleMatch,
    },
    /// 把第一个匹配项移到 anchor 的最后一个子节点位置
    MoveToEndOf {
        target: TitleMatch,
        anchor: TitleMatch,
    },
    /// 把第一个匹配项移到整个目录的最前面
    MoveToStart { target: TitleMatch },
    /// 把第一个匹配项移到最后一个 anchor 之后（与 anchor 同级）
    MoveAfterLast {
        target: TitleMatch,
        anchor: TitleMatch,
    },
}

/// 按作品标题生效的一组修正
#[derive(Debug)]
pub struct CorrectionRule {
    pub work_marker: &'static str,
    pub corrections: &'static [Correction],
}

const BOOK_PREFACE: TitleMatch = TitleMatch::any(&["к книге"]);
const JOURNAL: TitleMatch = TitleMatch::any(&["журнал печорина"]).excluding(&["предисловие"]);

pub const CORRECTION_RULES: &[CorrectionRule] = &[
    CorrectionRule {
        work_marker: "герой нашего времени",
        corrections: &[
            Correction::Relabel {
                target: TitleMatch::any(&["предисловие"]).excluding(&["журнал"]),
                title: "Предисловие (к книге)",
            },
            Correction::Relabel {
                target: TitleMatch::any(&["предисловие"]).excluding(&["к книге"]),
                title: "Предисловие (к журналу Печорина)",
            },
            Correction::Classify {
                target: TitleMatch::any(&["предисловие ("]),
                element_type: ElementType::Preface,
                is_section: Some(false),
            },
            Correction::Classify {
                target: TitleMatch::any(&["часть первая", "часть вторая"]),
                element_type: ElementType::Part,
                is_section: Some(true),
            },
            Correction::Classify {
                target: JOURNAL,
                element_type: ElementType::Section,
                is_section: Some(true),
            },
            Correction::Classify {
                target: TitleMatch::any(&["бэла", "максим", "тамань", "княжна", "фаталист"]),
                element_type: ElementType::Chapter,
                is_section: Some(false),
            },
            Correction::Regroup {
                parent: JOURNAL,
                children: TitleMatch::any(&["к журналу печорина", "тамань"]),
            },
            Correction::Regroup {
                parent: TitleMatch::any(&["часть первая"]),
                children: TitleMatch::any(&["бэла", "максим", "журнал печорина"])
                    .excluding(&["предисловие"]),
            },
            Correction::Regroup {
                parent: TitleMatch::any(&["часть вторая"]),
                children: TitleMatch::any(&["княжна", "фаталист"]),
            },
            Correction::MoveToStart {
                target: BOOK_PREFACE,
            },
        ],
    },
    CorrectionRule {
        work_marker: "мертвые души",
        corrections: &[Correction::MoveToEndOf {
            target: TitleMatch::any(&["заключительная"]),
            anchor: TitleMatch::any(&["том второй"]),
        }],
    },
    CorrectionRule {
        work_marker: "евгений онегин",
        corrections: &[
            Correction::Classify {
                target: TitleMatch::any(&["вступление"]),
                element_type: ElementType::Introduction,
                is_section: Some(false),
            },
            Correction::Classify {
                target: TitleMatch::any(&["отрывки из путешествия онегина"]),
                element_type: ElementType::Excerpt,
                is_section: None,
            },
            Correction::MoveToStart {
                target: TitleMatch::any(&["вступление"]),
            },
            Correction::MoveAfterLast {
                target: TitleMatch::any(&["отрывки из путешествия онегина"]),
                anchor: TitleMatch::any(&["глава"]),
            },
        ],
    },
];

/// 查找与作品标题匹配的修正规则
pub fn rule_for(work_title: &str) -> Option<&'static CorrectionRule> {
    let title = fold(work_title);
    CORRECTION_RULES
        .iter()
        .find(|rule| title.contains(rule.work_marker))
}

/// 对扁平目录应用修正；没有匹配规则时原样返回
pub fn apply_corrections(work_title: &str, entries: Vec<TocEntry>) -> Vec<TocEntry> {
    let Some(rule) = rule_for(work_title) else {
        return entries;
    };

    tracing::info!(
        work_title = %work_title,
        rule = rule.work_marker,
        "Applying TOC correction rule"
    );

    let mut forest = Forest::build(entries);
    for correction in rule.corrections {
        forest.apply(correction);
    }
    forest.flatten()
}

// ============================================================================
// 目录森林
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Anchor,
    Taken,
}

#[derive(Debug)]
struct Branch {
    entry: TocEntry,
    children: Vec<Branch>,
    mark: Mark,
}

impl Branch {
    fn new(entry: TocEntry) -> Self {
        Self {
            entry,
            children: Vec::new(),
            mark: Mark::None,
        }
    }

    fn contains_mark(&self, mark: Mark) -> bool {
        self.mark == mark || self.children.iter().any(|c| c.contains_mark(mark))
    }
}

type BranchPath = Vec<usize>;

#[derive(Debug, Default)]
struct Forest {
    roots: Vec<Branch>,
}

impl Forest {
    /// 按层级还原树形：父节点是之前最近的更低层级项
    fn build(entries: Vec<TocEntry>) -> Self {
        let mut roots = Vec::new();
        let mut stack: Vec<Branch> = Vec::new();

        for entry in entries {
            while stack
                .last()
                .is_some_and(|top| top.entry.level >= entry.level)
            {
                if let Some(done) = stack.pop() {
                    attach(done, &mut stack, &mut roots);
                }
            }
            stack.push(Branch::new(entry));
        }
        while let Some(done) = stack.pop() {
            attach(done, &mut stack, &mut roots);
        }

        Self { roots }
    }

    fn flatten(self) -> Vec<TocEntry> {
        fn walk(branches: Vec<Branch>, level: usize, parent: &[usize], out: &mut Vec<TocEntry>) {
            for (i, branch) in branches.into_iter().enumerate() {
                let mut path = parent.to_vec();
                path.push(i);
                let mut entry = branch.entry;
                entry.level = level;
                entry.path = path.clone();
                out.push(entry);
                walk(branch.children, level + 1, &path, out);
            }
        }

        let mut out = Vec::new();
        walk(self.roots, 0, &[], &mut out);
        out
    }

    fn apply(&mut self, correction: &Correction) {
        match *correction {
            Correction::Relabel { target, title } => {
                if let Some(path) = self.find_first(&|b: &Branch| target.matches(&b.entry.title)) {
                    if let Some(branch) = self.get_mut(&path) {
                        branch.entry.title = title.to_string();
                    }
                }
            }
            Correction::Classify {
                target,
                element_type,
                is_section,
            } => {
                visit_mut(&mut self.roots, &mut |b| {
                    if target.matches(&b.entry.title) {
                        b.entry.element_type = Some(element_type);
                        if let Some(is_section) = is_section {
                            b.entry.is_section = is_section;
                        }
                    }
                });
            }
            Correction::Regroup { parent, children } => self.regroup(parent, children),
            Correction::MoveToEndOf { target, anchor } => {
                let Some(anchor_path) = self.find_first(&|b: &Branch| anchor.matches(&b.entry.title))
                else {
                    return;
                };
                self.mark(&anchor_path, Mark::Anchor);
                let target_path = self.find_first(&|b: &Branch| {
                    target.matches(&b.entry.title) && !b.contains_mark(Mark::Anchor)
                });
                if let Some(branch) = target_path.and_then(|p| self.detach(&p)) {
                    if let Some(anchor_path) = self.find_first(&|b: &Branch| b.mark == Mark::Anchor) {
                        if let Some(anchor) = self.get_mut(&anchor_path) {
                            anchor.children.push(branch);
                        }
                    }
                }
                self.clear_marks();
            }
            Correction::MoveToStart { target } => {
                let path = self.find_first(&|b: &Branch| target.matches(&b.entry.title));
                if let Some(branch) = path.and_then(|p| self.detach(&p)) {
                    self.roots.insert(0, branch);
                }
            }
            Correction::MoveAfterLast { target, anchor } => {
                let path = self.find_first(&|b: &Branch| target.matches(&b.entry.title));
                let Some(branch) = path.and_then(|p| self.detach(&p)) else {
                    return;
                };
                match self.find_last(&|b: &Branch| anchor.matches(&b.entry.title)) {
                    Some(mut anchor_path) => {
                        let position = anchor_path.pop().unwrap_or(0) + 1;
                        let siblings = if anchor_path.is_empty() {
                            Some(&mut self.roots)
                        } else {
                            self.get_mut(&anchor_path).map(|parent| &mut parent.children)
                        };
                        match siblings {
                            Some(siblings) => {
                                let position = position.min(siblings.len());
                                siblings.insert(position, branch);
                            }
                            None => self.roots.push(branch),
                        }
                    }
                    None => self.roots.push(branch),
                }
            }
        }
    }

    fn regroup(&mut self, parent: TitleMatch, children: TitleMatch) {
        let Some(parent_path) = self.find_first(&|b: &Branch| parent.matches(&b.entry.title)) else {
            return;
        };
        self.mark(&parent_path, Mark::Anchor);

        let mut taken = Vec::new();
        while let Some(path) = self.find_first(&|b: &Branch| {
            b.mark == Mark::None
                && children.matches(&b.entry.title)
                && !b.contains_mark(Mark::Anchor)
        }) {
            match self.detach(&path) {
                Some(mut branch) => {
                    branch.mark = Mark::Taken;
                    taken.push(branch);
                }
                None => break,
            }
        }

        if let Some(parent_path) = self.find_first(&|b: &Branch| b.mark == Mark::Anchor) {
            if let Some(parent) = self.get_mut(&parent_path) {
                parent.children.extend(taken);
            }
        }
        self.clear_marks();
    }

    fn find_first(&self, pred: &dyn Fn(&Branch) -> bool) -> Option<BranchPath> {
        fn search(branches: &[Branch], pred: &dyn Fn(&Branch) -> bool, path: &mut BranchPath) -> bool {
            for (i, branch) in branches.iter().enumerate() {
                path.push(i);
                if pred(branch) || search(&branch.children, pred, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.roots, pred, &mut path).then_some(path)
    }

    fn find_last(&self, pred: &dyn Fn(&Branch) -> bool) -> Option<BranchPath> {
        fn search(
            branches: &[Branch],
            pred: &dyn Fn(&Branch) -> bool,
            path: &mut BranchPath,
            found: &mut Option<BranchPath>,
        ) {
            for (i, branch) in branches.iter().enumerate() {
                path.push(i);
                if pred(branch) {
                    *found = Some(path.clone());
                }
                search(&branch.children, pred, path, found);
                path.pop();
            }
        }

        let mut found = None;
        search(&self.roots, pred, &mut Vec::new(), &mut found);
        found
    }

    fn get_mut(&mut self, path: &[usize]) -> Option<&mut Branch> {
        let (first, rest) = path.split_first()?;
        let mut branch = self.roots.get_mut(*first)?;
        for i in rest {
            branch = branch.children.get_mut(*i)?;
        }
        Some(branch)
    }

    fn detach(&mut self, path: &[usize]) -> Option<Branch> {
        let (last, parent) = path.split_last()?;
        let siblings = if parent.is_empty() {
            &mut self.roots
        } else {
            &mut self.get_mut(parent)?.children
        };
        (*last < siblings.len()).then(|| siblings.remove(*last))
    }

    fn mark(&mut self, path: &[usize], mark: Mark) {
        if let Some(branch) = self.get_mut(path) {
            branch.mark = mark;
        }
    }

    fn clear_marks(&mut self) {
        visit_mut(&mut self.roots, &mut |b| b.mark = Mark::None);
    }
}

fn attach(branch: Branch, stack: &mut [Branch], roots: &mut Vec<Branch>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(branch),
        None => roots.push(branch),
    }
}

fn visit_mut(branches: &mut [Branch], f: &mut dyn FnMut(&mut Branch)) {
    for branch in branches {
        f(branch);
        visit_mut(&mut branch.children, f);
    }
}
