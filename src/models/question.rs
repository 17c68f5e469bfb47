use serde::{Deserialize, Deserializer, Serialize};

/// 题库中已保存的题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub latex_content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub reference_answer: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// OCR 识别并由后端拆分出来的一道题，尚未入库
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    pub question: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: Vec<String>,
}

/// 新增题目的请求体
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionDraft {
    pub latex_content: String,
    pub tags: Vec<String>,
    pub reference_answer: String,
    pub source: String,
    pub image: Vec<String>,
}

impl QuestionDraft {
    /// 批量保存 OCR 结果时使用的来源
    pub const OCR_SOURCE: &'static str = "试卷解析";

    /// 将解析结果转换为待保存的题目
    pub fn from_parsed(parsed: &ParsedQuestion) -> Self {
        Self {
            latex_content: parsed.question.clone(),
            tags: parsed.tags.clone(),
            reference_answer: parsed.answer.clone().unwrap_or_default(),
            source: Self::OCR_SOURCE.to_string(),
            image: parsed.image.clone(),
        }
    }
}

/// 自动打标结果
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutoTagResult {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub answer: String,
}

/// 图片上传结果
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedImage {
    pub filename: String,
    pub url: String,
}

/// 题目搜索条件
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub tags: Vec<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            tags: Vec::new(),
            page: 1,
            limit: 10,
        }
    }
}

impl SearchQuery {
    /// 转换为 URL 查询参数，`tags` 会重复出现
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(keyword) = self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            pairs.push(("keyword", keyword.to_string()));
        }
        for tag in &self.tags {
            pairs.push(("tags", tag.clone()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

/// 搜索结果页
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub total: usize,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
