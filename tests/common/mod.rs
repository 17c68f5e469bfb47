#![allow(dead_code)]

use paper_cart::error::{AppError, AppResult};
use paper_cart::models::{
    AutoTagResult, ExportRecord, ExportRequest, ExportedFile, ParsedQuestion, Question,
    QuestionDraft, ReExport, SearchPage, SearchQuery, UploadedImage,
};
use paper_cart::{Config, QuestionBankApi, Session};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// 内存中的假后端，记录收到的请求
#[derive(Default)]
pub struct FakeApi {
    pub questions: HashMap<i64, Question>,
    pub parsed: Vec<ParsedQuestion>,
    pub history: Vec<ExportRecord>,
    pub re_exports: HashMap<i64, ReExport>,
    pub export_error: Option<String>,
    pub offline: AtomicBool,
    /// 这些内容的题目保存时会被拒绝
    pub reject_content: Vec<String>,
    pub calls: Mutex<Vec<String>>,
    pub export_requests: Mutex<Vec<ExportRequest>>,
    pub created: Mutex<Vec<QuestionDraft>>,
}

pub fn question(id: i64) -> Question {
    Question {
        id,
        latex_content: format!("第{}题: 求 $x^{}$ 的导数", id, id),
        tags: vec!["导数题".to_string()],
        reference_answer: Some(format!("答案{}", id)),
        source: Some("2024 全国卷".to_string()),
        image: vec![],
        created_at: None,
    }
}

pub fn parsed(text: &str) -> ParsedQuestion {
    ParsedQuestion {
        question: text.to_string(),
        tags: vec![],
        answer: None,
        image: vec![],
    }
}

impl FakeApi {
    pub fn with_questions(ids: &[i64]) -> Self {
        Self {
            questions: ids.iter().map(|&id| (id, question(id))).collect(),
            ..Self::default()
        }
    }

    /// 模拟网络断开
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exports(&self) -> Vec<ExportRequest> {
        self.export_requests.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) -> AppResult<()> {
        let call = call.into();
        self.calls.lock().unwrap().push(call.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::api_request_failed(
                call,
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            ));
        }
        Ok(())
    }
}

impl QuestionBankApi for FakeApi {
    async fn list_tags(&self) -> AppResult<Vec<String>> {
        self.record("GET /api/tags")?;
        Ok(vec!["数列".to_string(), "向量".to_string()])
    }

    async fn get_question(&self, id: i64) -> AppResult<Question> {
        self.record(format!("GET /api/questions/{}", id))?;
        self.questions
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::api_rejected("/api/questions", Some(404), "题目不存在"))
    }

    async fn get_answer(&self, id: i64) -> AppResult<String> {
        self.record(format!("GET /api/questions/{}/answer", id))?;
        self.questions
            .get(&id)
            .and_then(|q| q.reference_answer.clone())
            .ok_or_else(|| AppError::api_rejected("/api/questions/answer", Some(404), "参考解答不存在"))
    }

    async fn search_questions(&self, query: &SearchQuery) -> AppResult<SearchPage> {
        self.record("GET /api/questions/search")?;
        let mut questions: Vec<Question> = self
            .questions
            .values()
            .filter(|q| {
                query
                    .keyword
                    .as_deref()
                    .map_or(true, |k| q.latex_content.contains(k))
            })
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.id);
        let total = questions.len();
        Ok(SearchPage { questions, total })
    }

    async fn create_question(&self, draft: &QuestionDraft) -> AppResult<i64> {
        self.record("POST /api/questions")?;
        if self.reject_content.contains(&draft.latex_content) {
            return Err(AppError::api_rejected("/api/questions", Some(400), "题目内容不合法"));
        }
        let mut created = self.created.lock().unwrap();
        created.push(draft.clone());
        Ok(1000 + created.len() as i64)
    }

    async fn delete_question(&self, id: i64) -> AppResult<()> {
        self.record(format!("DELETE /api/questions/{}", id))
    }

    async fn auto_tag(&self, _latex_content: &str, _source: &str) -> AppResult<AutoTagResult> {
        self.record("POST /api/questions/auto-tag")?;
        Ok(AutoTagResult {
            tags: vec!["导数题".to_string()],
            answer: "略".to_string(),
        })
    }

    async fn upload_image(&self, path: &Path) -> AppResult<UploadedImage> {
        self.record("POST /api/upload")?;
        let filename = path.file_name().unwrap().to_string_lossy().to_string();
        Ok(UploadedImage {
            url: format!("/uploads/{}", filename),
            filename,
        })
    }

    async fn parse_exam(&self, _path: &Path) -> AppResult<Vec<ParsedQuestion>> {
        self.record("POST /api/ocr-parse")?;
        Ok(self.parsed.clone())
    }

    async fn export_paper(&self, request: &ExportRequest) -> AppResult<ExportedFile> {
        self.record("POST /api/export-paper")?;
        self.export_requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.export_error {
            return Err(AppError::api_rejected("/api/export-paper", Some(500), message.clone()));
        }
        Ok(ExportedFile {
            content_type: Some("application/pdf".to_string()),
            bytes: format!("{} questions", request.questions.len()).into_bytes(),
        })
    }

    async fn export_history(&self) -> AppResult<Vec<ExportRecord>> {
        self.record("GET /api/user/exports")?;
        Ok(self.history.clone())
    }

    async fn re_export(&self, export_id: i64) -> AppResult<ReExport> {
        self.record(format!("GET /api/user/re-export/{}", export_id))?;
        self.re_exports
            .get(&export_id)
            .cloned()
            .ok_or_else(|| AppError::api_rejected("/api/user/re-export", Some(404), "导出记录不存在"))
    }
}

/// 测试用会话：确认框固定返回 `answer`，下载目录在临时目录中
pub struct TestSession {
    pub dir: TempDir,
    pub session: Session<FakeApi, fn(&str) -> bool>,
}

fn yes(_: &str) -> bool {
    true
}

fn no(_: &str) -> bool {
    false
}

pub fn session_with(api: FakeApi, answer: bool) -> TestSession {
    let dir = TempDir::new().expect("create temp dir");
    let config = Config {
        download_dir: dir.path().join("downloads"),
        ..Config::default()
    };
    let confirm: fn(&str) -> bool = if answer { yes } else { no };
    TestSession {
        session: Session::new(&config, api, confirm),
        dir,
    }
}

pub fn cart_ids<C: paper_cart::Confirm>(session: &Session<FakeApi, C>) -> Vec<String> {
    session
        .cart()
        .items()
        .iter()
        .map(|item| item.id.to_string())
        .collect()
}
