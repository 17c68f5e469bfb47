//! 题库后端接口
//!
//! 会话层只依赖这个 trait，HTTP 实现见 `QuestionBankClient`。

use crate::error::AppResult;
use crate::models::{
    AutoTagResult, ExportRecord, ExportRequest, ExportedFile, ParsedQuestion, Question,
    QuestionDraft, ReExport, SearchPage, SearchQuery, UploadedImage,
};
use std::path::Path;

/// 题库 REST 接口
#[allow(async_fn_in_trait)]
pub trait QuestionBankApi {
    /// `GET /api/tags`
    async fn list_tags(&self) -> AppResult<Vec<String>>;

    /// `GET /api/questions/:id`
    async fn get_question(&self, id: i64) -> AppResult<Question>;

    /// `GET /api/questions/:id/answer`，题目没有参考解答时后端返回失败
    async fn get_answer(&self, id: i64) -> AppResult<String>;

    /// `GET /api/questions/search`
    async fn search_questions(&self, query: &SearchQuery) -> AppResult<SearchPage>;

    /// `POST /api/questions`，返回新题目ID
    async fn create_question(&self, draft: &QuestionDraft) -> AppResult<i64>;

    /// `DELETE /api/questions/:id`
    async fn delete_question(&self, id: i64) -> AppResult<()>;

    /// `POST /api/questions/auto-tag`
    async fn auto_tag(&self, latex_content: &str, source: &str) -> AppResult<AutoTagResult>;

    /// `POST /api/upload`
    async fn upload_image(&self, path: &Path) -> AppResult<UploadedImage>;

    /// `POST /api/ocr-parse`
    async fn parse_exam(&self, path: &Path) -> AppResult<Vec<ParsedQuestion>>;

    /// `POST /api/export-paper`，成功时返回文件内容
    async fn export_paper(&self, request: &ExportRequest) -> AppResult<ExportedFile>;

    /// `GET /api/user/exports`
    async fn export_history(&self) -> AppResult<Vec<ExportRecord>>;

    /// `GET /api/user/re-export/:id`
    async fn re_export(&self, export_id: i64) -> AppResult<ReExport>;
}
