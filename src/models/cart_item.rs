use crate::models::question::{ParsedQuestion, Question};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

/// 客户端为未入库题目生成的标识
///
/// 由固定前缀 `ocr`、题目在本次解析中的位置、创建时间（毫秒）和会话内单调递增的序号组成。
/// 序号保证同一毫秒内的多次添加也不会重复。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntheticId {
    pub batch_index: usize,
    pub created_millis: i64,
    pub seq: u64,
}

impl SyntheticId {
    pub const TAG: &'static str = "ocr";
}

impl fmt::Display for SyntheticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            Self::TAG,
            self.batch_index,
            self.created_millis,
            self.seq
        )
    }
}

/// 试卷中题目的身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionRef {
    /// 服务端分配的题目ID
    Persisted(i64),
    /// 未入库的 OCR 题目
    Synthesized(SyntheticId),
}

impl QuestionRef {
    pub fn persisted_id(&self) -> Option<i64> {
        match self {
            QuestionRef::Persisted(id) => Some(*id),
            QuestionRef::Synthesized(_) => None,
        }
    }
}

impl fmt::Display for QuestionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionRef::Persisted(id) => write!(f, "{}", id),
            QuestionRef::Synthesized(sid) => write!(f, "{}", sid),
        }
    }
}

impl Serialize for QuestionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QuestionRef::Persisted(id) => serializer.serialize_i64(*id),
            QuestionRef::Synthesized(sid) => serializer.collect_str(sid),
        }
    }
}

/// 已加入试卷的题目
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: QuestionRef,
    pub latex_content: String,
    pub tags: Vec<String>,
    pub reference_answer: Option<String>,
    pub source: Option<String>,
    pub images: Vec<String>,
}

impl CartItem {
    /// 由题库题目构造
    pub fn from_question(question: Question) -> Self {
        Self {
            id: QuestionRef::Persisted(question.id),
            latex_content: question.latex_content,
            tags: question.tags,
            reference_answer: question.reference_answer,
            source: question.source,
            images: question.image,
        }
    }

    /// 由 OCR 解析结果构造，题目内容完整内联
    pub fn from_parsed(parsed: &ParsedQuestion, id: SyntheticId) -> Self {
        Self {
            id: QuestionRef::Synthesized(id),
            latex_content: parsed.question.clone(),
            tags: parsed.tags.clone(),
            reference_answer: parsed.answer.clone(),
            source: Some(crate::models::QuestionDraft::OCR_SOURCE.to_string()),
            images: parsed.image.clone(),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self.id, QuestionRef::Synthesized(_))
    }
}

// 字段名与后端导出接口保持一致
impl Serialize for CartItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CartItem", 7)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("latex_content", &self.latex_content)?;
        state.serialize_field("tags", &self.tags)?;
        state.serialize_field(
            "reference_answer",
            self.reference_answer.as_deref().unwrap_or_default(),
        )?;
        state.serialize_field("source", self.source.as_deref().unwrap_or_default())?;
        state.serialize_field("image", &self.images)?;
        state.serialize_field("is_synthesized", &self.is_synthesized())?;
        state.end()
    }
}
