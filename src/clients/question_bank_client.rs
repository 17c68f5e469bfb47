/// 题库 API 客户端
///
/// 封装所有与题库后端的 HTTP 交互，只负责编组请求和解析响应
use crate::clients::envelope::{self, parse_body, take_field};
use crate::clients::question_bank::QuestionBankApi;
use crate::config::Config;
use crate::error::{AppError, AppResult, FileError};
use crate::models::{
    AutoTagResult, ExportRecord, ExportRequest, ExportedFile, ParsedQuestion, Question,
    QuestionDraft, ReExport, SearchPage, SearchQuery, UploadedImage,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, warn};

/// 题库 HTTP 客户端
pub struct QuestionBankClient {
    http: Client,
    config: Config,
}

impl QuestionBankClient {
    /// 创建新的题库客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            config: config.clone(),
        }
    }

    /// 发送请求并返回 (状态码, JSON 响应体)
    async fn send_json(&self, endpoint: &str, request: RequestBuilder) -> AppResult<(u16, Value)> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        debug!("{} -> {} {}", endpoint, status, body);
        Ok((status, body))
    }

    /// 构建只含一个 `file` 字段的表单
    async fn file_form(path: &Path) -> AppResult<Form> {
        if !path.exists() {
            return Err(AppError::File(FileError::NotFound {
                path: path.display().to_string(),
            }));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Form::new().part("file", Part::bytes(bytes).file_name(file_name)))
    }
}

impl QuestionBankApi for QuestionBankClient {
    async fn list_tags(&self) -> AppResult<Vec<String>> {
        let endpoint = "/api/tags";
        let (status, mut body) = self
            .send_json(endpoint, self.http.get(self.config.endpoint(endpoint)))
            .await?;
        envelope::ensure_success(endpoint, Some(status), &body)?;
        take_field(endpoint, &mut body, "tags")
    }

    async fn get_question(&self, id: i64) -> AppResult<Question> {
        let endpoint = format!("/api/questions/{}", id);
        let (status, mut body) = self
            .send_json(&endpoint, self.http.get(self.config.endpoint(&endpoint)))
            .await?;
        envelope::ensure_success(&endpoint, Some(status), &body)?;
        take_field(&endpoint, &mut body, "question")
    }

    async fn get_answer(&self, id: i64) -> AppResult<String> {
        let endpoint = format!("/api/questions/{}/answer", id);
        let (status, mut body) = self
            .send_json(&endpoint, self.http.get(self.config.endpoint(&endpoint)))
            .await?;
        envelope::ensure_success(&endpoint, Some(status), &body)?;
        take_field(&endpoint, &mut body, "answer")
    }

    async fn search_questions(&self, query: &SearchQuery) -> AppResult<SearchPage> {
        let endpoint = "/api/questions/search";
        let request = self
            .http
            .get(self.config.endpoint(endpoint))
            .query(&query.to_pairs());
        let (status, body) = self.send_json(endpoint, request).await?;
        parse_body(endpoint, Some(status), body)
    }

    async fn create_question(&self, draft: &QuestionDraft) -> AppResult<i64> {
        let endpoint = "/api/questions";
        let request = self.http.post(self.config.endpoint(endpoint)).json(draft);
        let (status, mut body) = self.send_json(endpoint, request).await?;
        envelope::ensure_success(endpoint, Some(status), &body)?;
        take_field(endpoint, &mut body, "question_id")
    }

    async fn delete_question(&self, id: i64) -> AppResult<()> {
        let endpoint = format!("/api/questions/{}", id);
        let (status, body) = self
            .send_json(&endpoint, self.http.delete(self.config.endpoint(&endpoint)))
            .await?;
        envelope::ensure_success(&endpoint, Some(status), &body)
    }

    async fn auto_tag(&self, latex_content: &str, source: &str) -> AppResult<AutoTagResult> {
        let endpoint = "/api/questions/auto-tag";
        let request = self
            .http
            .post(self.config.endpoint(endpoint))
            .json(&json!({ "latex_content": latex_content, "source": source }));
        let (status, body) = self.send_json(endpoint, request).await?;
        parse_body(endpoint, Some(status), body)
    }

    async fn upload_image(&self, path: &Path) -> AppResult<UploadedImage> {
        let endpoint = "/api/upload";
        let form = Self::file_form(path).await?;
        let request = self.http.post(self.config.endpoint(endpoint)).multipart(form);
        let (status, body) = self.send_json(endpoint, request).await?;
        parse_body(endpoint, Some(status), body)
    }

    async fn parse_exam(&self, path: &Path) -> AppResult<Vec<ParsedQuestion>> {
        let endpoint = "/api/ocr-parse";
        let form = Self::file_form(path).await?;
        let request = self.http.post(self.config.endpoint(endpoint)).multipart(form);
        let (status, mut body) = self.send_json(endpoint, request).await?;
        envelope::ensure_success(endpoint, Some(status), &body)?;
        take_field(endpoint, &mut body, "questions")
    }

    async fn export_paper(&self, request: &ExportRequest) -> AppResult<ExportedFile> {
        let endpoint = "/api/export-paper";
        let response = self
            .http
            .post(self.config.endpoint(endpoint))
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            // 失败时后端返回 JSON，取不到就用状态码描述
            let message = match response.json::<Value>().await {
                Ok(body) => envelope::extract_message(&body)
                    .map(str::to_string)
                    .unwrap_or_else(|| status.to_string()),
                Err(e) => {
                    warn!("导出失败响应无法解析: {}", e);
                    status.to_string()
                }
            };
            return Err(AppError::api_rejected(endpoint, Some(status.as_u16()), message));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        debug!("导出完成: {} 字节, 类型 {:?}", bytes.len(), content_type);

        Ok(ExportedFile {
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    async fn export_history(&self) -> AppResult<Vec<ExportRecord>> {
        let endpoint = "/api/user/exports";
        let (status, mut body) = self
            .send_json(endpoint, self.http.get(self.config.endpoint(endpoint)))
            .await?;
        envelope::ensure_success(endpoint, Some(status), &body)?;
        take_field(endpoint, &mut body, "exports")
    }

    async fn re_export(&self, export_id: i64) -> AppResult<ReExport> {
        let endpoint = format!("/api/user/re-export/{}", export_id);
        let (status, body) = self
            .send_json(&endpoint, self.http.get(self.config.endpoint(&endpoint)))
            .await?;
        parse_body(&endpoint, Some(status), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartItem, ExportFormat, ExportMode};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// 只应答一次的本地后端，返回客户端和收到的原始请求
    async fn serve_once(
        status: &str,
        content_type: &str,
        body: impl Into<Vec<u8>>,
    ) -> (QuestionBankClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let head = format!("HTTP/1.1 {}\r\nContent-Type: {}\r\n", status, content_type);
        let body = body.into();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "{}Content-Length: {}\r\nConnection: close\r\n\r\n",
                head,
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        let config = Config {
            api_base_url: format!("http://{}", addr),
            ..Config::default()
        };
        let client = QuestionBankClient {
            http: Client::builder().no_proxy().build().unwrap(),
            config,
        };
        (client, server)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn export_request() -> ExportRequest {
        ExportRequest {
            questions: vec![CartItem::from_question(Question {
                id: 1,
                latex_content: "求 $\\int_0^1 x\\,dx$".to_string(),
                tags: vec![],
                reference_answer: None,
                source: None,
                image: vec![],
                created_at: None,
            })],
            title: "周测".to_string(),
            mode: ExportMode::QuestionsOnly,
            format: ExportFormat::Pdf,
        }
    }

    #[tokio::test]
    async fn test_export_returns_body_bytes() {
        let pdf = b"%PDF-1.7\n\x00\xff\xfe".to_vec();
        let (client, server) = serve_once("200 OK", "application/pdf", pdf.clone()).await;

        let file = client.export_paper(&export_request()).await.unwrap();
        assert_eq!(file.bytes, pdf);
        assert_eq!(file.content_type.as_deref(), Some("application/pdf"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/export-paper "));
        assert!(request.contains(r#""mode":"questions""#));
        assert!(request.contains(r#""format":"pdf""#));
    }

    #[tokio::test]
    async fn test_export_failure_surfaces_server_message() {
        let body = r#"{"success": false, "message": "LaTeX 编译失败"}"#;
        let (client, _server) =
            serve_once("500 Internal Server Error", "application/json", body).await;

        let err = client.export_paper(&export_request()).await.unwrap_err();
        assert_eq!(err.user_message(), "LaTeX 编译失败");
        assert!(matches!(
            err,
            AppError::Api(crate::error::ApiError::Rejected {
                status: Some(500),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_export_failure_without_json_uses_status() {
        let (client, _server) = serve_once("502 Bad Gateway", "text/html", "<h1>oops</h1>").await;

        let err = client.export_paper(&export_request()).await.unwrap_err();
        assert!(err.user_message().contains("502"));
    }

    #[tokio::test]
    async fn test_get_question_extracts_question_field() {
        let body = r#"{"success": true, "question": {
            "id": 7, "latex_content": "$1+1$", "tags": ["计算"],
            "reference_answer": "", "source": null, "image": null
        }}"#;
        let (client, server) = serve_once("200 OK", "application/json", body).await;

        let question = client.get_question(7).await.unwrap();
        assert_eq!(question.id, 7);
        assert_eq!(question.tags, ["计算"]);
        assert_eq!(question.reference_answer, None);
        assert!(question.image.is_empty());
        assert!(server.await.unwrap().starts_with("GET /api/questions/7 "));
    }

    #[tokio::test]
    async fn test_get_question_not_found() {
        let body = r#"{"success": false, "message": "题目不存在"}"#;
        let (client, _server) = serve_once("404 NOT FOUND", "application/json", body).await;

        let err = client.get_question(9).await.unwrap_err();
        assert_eq!(err.user_message(), "题目不存在");
    }

    #[tokio::test]
    async fn test_get_answer() {
        let body = r#"{"success": true, "answer": "$x=2$"}"#;
        let (client, server) = serve_once("200 OK", "application/json", body).await;

        assert_eq!(client.get_answer(3).await.unwrap(), "$x=2$");
        assert!(server.await.unwrap().starts_with("GET /api/questions/3/answer "));
    }

    #[tokio::test]
    async fn test_create_question_returns_id() {
        let body = r#"{"success": true, "question_id": 42}"#;
        let (client, server) = serve_once("200 OK", "application/json", body).await;
        let draft = QuestionDraft {
            latex_content: "新题".to_string(),
            ..QuestionDraft::default()
        };

        assert_eq!(client.create_question(&draft).await.unwrap(), 42);
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/questions "));
        assert!(request.contains(r#""latex_content":"新题""#));
    }

    #[tokio::test]
    async fn test_search_repeats_tags() {
        let body = r#"{"success": true, "questions": [], "total": 0}"#;
        let (client, server) = serve_once("200 OK", "application/json", body).await;
        let query = SearchQuery {
            keyword: Some("limit".to_string()),
            tags: vec!["algebra".to_string(), "vector".to_string()],
            ..SearchQuery::default()
        };

        let page = client.search_questions(&query).await.unwrap();
        assert_eq!(page.total, 0);
        let request = server.await.unwrap();
        assert!(request.starts_with(
            "GET /api/questions/search?keyword=limit&tags=algebra&tags=vector&page=1&limit=10 "
        ));
    }

    #[tokio::test]
    async fn test_export_history_extracts_exports() {
        let body = r#"{"success": true, "exports": [{
            "id": 5, "title": "一模", "question_ids": [3, 1],
            "export_format": "docx", "export_mode": "with-answers",
            "created_at": "2024-03-01 09:00:00"
        }]}"#;
        let (client, _server) = serve_once("200 OK", "application/json", body).await;

        let records = client.export_history().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question_ids, [3, 1]);
        assert_eq!(records[0].export_format, ExportFormat::Docx);
        assert_eq!(records[0].export_mode, ExportMode::WithAnswers);
    }
}
