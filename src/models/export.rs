use crate::error::ValidationError;
use crate::models::cart_item::CartItem;
use crate::models::question::Question;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 导出模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportMode {
    /// 仅试题
    #[default]
    #[serde(rename = "questions")]
    QuestionsOnly,
    /// 试题+答案
    #[serde(rename = "with-answers")]
    WithAnswers,
}

impl ExportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportMode::QuestionsOnly => "questions",
            ExportMode::WithAnswers => "with-answers",
        }
    }

    /// 中文显示名
    pub fn label(self) -> &'static str {
        match self {
            ExportMode::QuestionsOnly => "仅试题",
            ExportMode::WithAnswers => "试题+答案",
        }
    }
}

impl FromStr for ExportMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "questions" | "q" => Ok(ExportMode::QuestionsOnly),
            "with-answers" | "answers" | "a" => Ok(ExportMode::WithAnswers),
            other => Err(ValidationError::UnknownExportMode(other.to_string())),
        }
    }
}

/// 导出格式，文件扩展名与传输值一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Docx,
    Tex,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Tex => "tex",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "tex" | "latex" => Ok(ExportFormat::Tex),
            other => Err(ValidationError::UnknownExportFormat(other.to_string())),
        }
    }
}

/// 导出请求，构造后不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRequest {
    pub questions: Vec<CartItem>,
    pub title: String,
    pub mode: ExportMode,
    pub format: ExportFormat,
}

/// 导出结果：服务端渲染好的文件内容
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// 历史导出记录
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub question_ids: Vec<i64>,
    pub export_format: ExportFormat,
    pub export_mode: ExportMode,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// 重新导出时从服务端取回的记录和题目
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReExport {
    #[serde(rename = "export")]
    pub record: ExportRecord,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_wire_values() {
        assert_eq!(
            serde_json::to_value(ExportMode::WithAnswers).unwrap(),
            json!("with-answers")
        );
        assert_eq!("questions".parse::<ExportMode>().unwrap(), ExportMode::QuestionsOnly);
        assert!("everything".parse::<ExportMode>().is_err());
    }

    #[test]
    fn test_format_parse_is_case_insensitive() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("word".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert_eq!(
            "odt".parse::<ExportFormat>(),
            Err(ValidationError::UnknownExportFormat("odt".to_string()))
        );
    }

    #[test]
    fn test_re_export_payload() {
        let re_export: ReExport = serde_json::from_value(json!({
            "success": true,
            "export": {
                "id": 5,
                "title": "期中模拟",
                "question_ids": [3, 1],
                "export_format": "docx",
                "export_mode": "with-answers",
                "created_at": "2024-06-01T08:00:00"
            },
            "questions": [
                { "id": 3, "latex_content": "a", "tags": [] },
                { "id": 1, "latex_content": "b", "tags": [] }
            ]
        }))
        .unwrap();

        assert_eq!(re_export.record.export_format, ExportFormat::Docx);
        assert_eq!(re_export.record.export_mode, ExportMode::WithAnswers);
        assert_eq!(re_export.questions.len(), 2);
    }
}
