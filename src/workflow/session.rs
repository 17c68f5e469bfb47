//! 会话控制器 - 流程层
//!
//! 一个会话持有页面生命周期内的全部状态：试卷篮、OCR 解析结果、标签、搜索结果、
//! 导出记录和消息栏。每个用户操作对应一个方法，失败时写入错误消息并保持原状态。

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cart::{AddOutcome, Cart, Direction};
use crate::clients::QuestionBankApi;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, ValidationError};
use crate::models::{
    AutoTagResult, CartItem, ExportFormat, ExportMode, ExportRecord, ExportRequest,
    ParsedQuestion, Question, QuestionDraft, ReExport, SearchPage, SearchQuery,
};
use crate::services::{DownloadWriter, NoticeBoard};
use crate::utils::truncate_text;
use crate::workflow::confirm::Confirm;

/// 清空试卷前的确认文案
pub const CONFIRM_CLEAR: &str = "确定要清空试卷吗？";
/// 删除题目前的确认文案
pub const CONFIRM_DELETE: &str = "确定要删除这道题目吗？此操作不可撤销。";

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 组卷会话
pub struct Session<A, C> {
    api: A,
    confirm: C,
    cart: Cart,
    parsed: Vec<ParsedQuestion>,
    uploaded_images: Vec<String>,
    available_tags: Vec<String>,
    search_results: SearchPage,
    export_history: Vec<ExportRecord>,
    pending_re_export: Option<ReExport>,
    notices: NoticeBoard,
    downloads: DownloadWriter,
}

impl<A: QuestionBankApi, C: Confirm> Session<A, C> {
    /// 创建新的会话，试卷篮为空
    pub fn new(config: &Config, api: A, confirm: C) -> Self {
        Self {
            api,
            confirm,
            cart: Cart::new(),
            parsed: Vec::new(),
            uploaded_images: Vec::new(),
            available_tags: Vec::new(),
            search_results: SearchPage::default(),
            export_history: Vec::new(),
            pending_re_export: None,
            notices: NoticeBoard::new(config.message_dismiss),
            downloads: DownloadWriter::new(&config.download_dir, &config.default_paper_title),
        }
    }

    // ========== 状态访问 ==========

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn parsed(&self) -> &[ParsedQuestion] {
        &self.parsed
    }

    pub fn uploaded_images(&self) -> &[String] {
        &self.uploaded_images
    }

    pub fn available_tags(&self) -> &[String] {
        &self.available_tags
    }

    pub fn search_results(&self) -> &SearchPage {
        &self.search_results
    }

    pub fn export_history(&self) -> &[ExportRecord] {
        &self.export_history
    }

    pub fn pending_re_export(&self) -> Option<&ReExport> {
        self.pending_re_export.as_ref()
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    /// 把错误写入消息栏后原样返回
    fn fail<T>(&mut self, action: &str, err: AppError) -> AppResult<T> {
        if err.is_validation() {
            self.notices.error(err.user_message());
        } else {
            self.notices
                .error(format!("{}失败: {}", action, err.user_message()));
        }
        Err(err)
    }

    // ========== 标签 / 录入 ==========

    /// 加载可选标签
    pub async fn load_tags(&mut self) -> AppResult<&[String]> {
        match self.api.list_tags().await {
            Ok(tags) => {
                debug!("加载到 {} 个标签", tags.len());
                self.available_tags = tags;
                Ok(&self.available_tags)
            }
            Err(e) => self.fail("加载标签", e),
        }
    }

    /// 录入一道新题，附带已上传的图片，返回新题目ID
    pub async fn submit_question(&mut self, mut draft: QuestionDraft) -> AppResult<i64> {
        if draft.latex_content.trim().is_empty() {
            return self.fail("添加", ValidationError::EmptyContent.into());
        }
        draft.image.extend(self.uploaded_images.iter().cloned());

        match self.api.create_question(&draft).await {
            Ok(id) => {
                self.uploaded_images.clear();
                self.notices.success("题目添加成功！");
                Ok(id)
            }
            Err(e) => self.fail("添加", e),
        }
    }

    /// 自动打标并生成参考解答
    pub async fn auto_tag(&mut self, latex_content: &str, source: &str) -> AppResult<AutoTagResult> {
        if latex_content.trim().is_empty() {
            return self.fail("自动打标", ValidationError::EmptyContent.into());
        }
        match self.api.auto_tag(latex_content, source).await {
            Ok(result) => {
                info!("🏷️ 自动打标: {:?}", result.tags);
                self.notices.success("自动打标完成！");
                Ok(result)
            }
            Err(e) => self.fail("自动打标", e),
        }
    }

    /// 上传题目图片，地址会在下一次录入时附带
    pub async fn upload_image(&mut self, path: &Path) -> AppResult<String> {
        match self.api.upload_image(path).await {
            Ok(uploaded) => {
                self.uploaded_images.push(uploaded.url.clone());
                self.notices.success("图片上传成功！");
                Ok(uploaded.url)
            }
            Err(e) => self.fail("图片上传", e),
        }
    }

    /// 移除一张已上传的图片
    pub fn remove_image(&mut self, url: &str) -> bool {
        let before = self.uploaded_images.len();
        self.uploaded_images.retain(|u| u != url);
        before != self.uploaded_images.len()
    }

    /// 删除题库中的题目，需要确认
    pub async fn delete_question(&mut self, id: i64) -> AppResult<bool> {
        if !self.confirm.confirm(CONFIRM_DELETE) {
            return Ok(false);
        }
        match self.api.delete_question(id).await {
            Ok(()) => {
                self.search_results.questions.retain(|q| q.id != id);
                self.notices.success("题目删除成功！");
                Ok(true)
            }
            Err(e) => self.fail("删除", e),
        }
    }

    // ========== 查看 ==========

    /// 查看题目详情
    pub async fn view_question(&mut self, id: i64) -> AppResult<Question> {
        match self.api.get_question(id).await {
            Ok(question) => Ok(question),
            Err(e) => self.fail("获取题目详情", e),
        }
    }

    /// 查看题目的参考解答
    pub async fn view_answer(&mut self, id: i64) -> AppResult<String> {
        match self.api.get_answer(id).await {
            Ok(answer) => Ok(answer),
            Err(e) => self.fail("获取解答", e),
        }
    }

    // ========== 搜索 ==========

    /// 按关键词或标签搜索
    pub async fn search(&mut self, query: &SearchQuery) -> AppResult<&SearchPage> {
        match self.api.search_questions(query).await {
            Ok(page) => {
                debug!("搜索到 {} 道题目", page.questions.len());
                self.search_results = page;
                Ok(&self.search_results)
            }
            Err(e) => self.fail("搜索", e),
        }
    }

    // ========== OCR ==========

    /// 上传试卷图片并解析题目
    pub async fn parse_exam(&mut self, path: &Path) -> AppResult<&[ParsedQuestion]> {
        match self.api.parse_exam(path).await {
            Ok(questions) => {
                self.notices
                    .success(format!("试卷解析成功！共 {} 道题目", questions.len()));
                self.parsed = questions;
                Ok(&self.parsed)
            }
            Err(e) => self.fail("试卷解析", e),
        }
    }

    /// 逐题保存解析结果，返回成功数量
    ///
    /// 单题被服务端拒绝时跳过，网络失败时中止并保留解析结果。
    pub async fn batch_save_parsed(&mut self) -> AppResult<usize> {
        if self.parsed.is_empty() {
            return self.fail("批量保存", ValidationError::NoParsedQuestions.into());
        }

        let mut saved = 0;
        for (index, parsed) in self.parsed.iter().enumerate() {
            let draft = QuestionDraft::from_parsed(parsed);
            match self.api.create_question(&draft).await {
                Ok(id) => {
                    debug!("第 {} 题已保存, ID {}", index + 1, id);
                    saved += 1;
                }
                Err(AppError::Api(ApiError::Rejected { message, .. })) => {
                    warn!("第 {} 题保存被拒绝: {}", index + 1, message);
                }
                Err(e) => return self.fail("批量保存", e),
            }
        }

        self.parsed.clear();
        self.notices
            .success(format!("成功保存 {} 道题目！", saved));
        Ok(saved)
    }

    // ========== 试卷篮 ==========

    /// 从题库取回题目并加入试卷，已存在时只给出警告
    pub async fn add_to_cart(&mut self, question_id: i64) -> AppResult<AddOutcome> {
        if self.cart.contains_persisted(question_id) {
            self.notices.warning("该题目已在试卷中");
            return Ok(AddOutcome::Duplicate(question_id));
        }

        let question = match self.api.get_question(question_id).await {
            Ok(question) => question,
            Err(e) => return self.fail("加入试卷", e),
        };

        let outcome = self.cart.add_question(question);
        self.report_add(outcome);
        Ok(outcome)
    }

    /// 把第 `index` 道解析结果加入试卷
    pub fn add_parsed_to_cart(&mut self, index: usize) -> AppResult<AddOutcome> {
        let Some(parsed) = self.parsed.get(index) else {
            let len = self.parsed.len();
            return self.fail(
                "加入试卷",
                ValidationError::IndexOutOfRange { index, len }.into(),
            );
        };
        let outcome = self.cart.add_parsed(parsed, index, now_millis());
        self.report_add(outcome);
        Ok(outcome)
    }

    /// 把全部解析结果加入试卷
    pub fn add_all_parsed_to_cart(&mut self) -> AppResult<usize> {
        if self.parsed.is_empty() {
            return self.fail("加入试卷", ValidationError::NoParsedQuestions.into());
        }
        let now = now_millis();
        for (index, parsed) in self.parsed.iter().enumerate() {
            self.cart.add_parsed(parsed, index, now);
        }
        let count = self.parsed.len();
        self.notices
            .success(format!("已加入 {} 道题目 (共 {} 题)", count, self.cart.len()));
        Ok(count)
    }

    fn report_add(&mut self, outcome: AddOutcome) {
        match outcome {
            AddOutcome::Added(id) => {
                debug!("加入试卷: {}", id);
                self.notices
                    .success(format!("题目已加入试卷 (共 {} 题)", self.cart.len()));
            }
            AddOutcome::Duplicate(_) => self.notices.warning("该题目已在试卷中"),
        }
    }

    /// 移除试卷中的第 `index` 题，越界时不做任何事
    pub fn remove(&mut self, index: usize) -> Option<CartItem> {
        self.cart.remove(index)
    }

    /// 与相邻题目交换位置
    pub fn move_item(&mut self, index: usize, direction: Direction) -> bool {
        self.cart.move_item(index, direction)
    }

    /// 确认后清空试卷篮，返回是否清空
    pub fn clear_cart(&mut self) -> bool {
        if !self.confirm.confirm(CONFIRM_CLEAR) {
            return false;
        }
        self.cart.clear();
        self.notices.success("试卷已清空");
        true
    }

    // ========== 导出 ==========

    /// 导出当前试卷，成功后返回保存的文件路径；试卷篮保持不变
    pub async fn export(
        &mut self,
        title: Option<&str>,
        mode: ExportMode,
        format: ExportFormat,
    ) -> AppResult<PathBuf> {
        if self.cart.is_empty() {
            return self.fail("导出", ValidationError::EmptyCart.into());
        }

        let request = ExportRequest {
            questions: self.cart.snapshot(),
            title: self.resolve_title(title),
            mode,
            format,
        };
        info!(
            "📤 导出试卷《{}》: {} 道题, {}, {}",
            truncate_text(&request.title, 30),
            request.questions.len(),
            mode.label(),
            format
        );

        match self.submit_export(&request).await {
            Ok(path) => {
                self.notices.success("试卷导出成功！");
                Ok(path)
            }
            Err(e) => self.fail("导出", e),
        }
    }

    async fn submit_export(&self, request: &ExportRequest) -> AppResult<PathBuf> {
        let file = self.api.export_paper(request).await?;
        self.downloads
            .save(&request.title, request.format, now_millis(), &file.bytes)
            .await
    }

    fn resolve_title(&self, title: Option<&str>) -> String {
        title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.downloads.default_title())
            .to_string()
    }

    // ========== 导出记录 ==========

    /// 加载当前用户的导出记录
    pub async fn load_export_history(&mut self) -> AppResult<&[ExportRecord]> {
        match self.api.export_history().await {
            Ok(records) => {
                self.export_history = records;
                Ok(&self.export_history)
            }
            Err(e) => self.fail("加载导出记录", e),
        }
    }

    /// 取回一条导出记录的题目，准备重新导出
    pub async fn open_re_export(&mut self, export_id: i64) -> AppResult<&ReExport> {
        match self.api.re_export(export_id).await {
            Ok(re_export) => Ok(self.pending_re_export.insert(re_export)),
            Err(e) => self.fail("加载导出数据", e),
        }
    }

    /// 放弃待重新导出的记录
    pub fn close_re_export(&mut self) {
        self.pending_re_export = None;
    }

    /// 重新导出，未指定的参数沿用原记录
    pub async fn re_export(
        &mut self,
        title: Option<&str>,
        mode: Option<ExportMode>,
        format: Option<ExportFormat>,
    ) -> AppResult<PathBuf> {
        let Some(pending) = self.pending_re_export.as_ref() else {
            return self.fail("重新导出", ValidationError::NoPendingReExport.into());
        };
        if pending.questions.is_empty() {
            return self.fail("重新导出", ValidationError::NothingToReExport.into());
        }

        let request = ExportRequest {
            questions: pending
                .questions
                .iter()
                .cloned()
                .map(CartItem::from_question)
                .collect(),
            title: self.resolve_title(title.or(Some(pending.record.title.as_str()))),
            mode: mode.unwrap_or(pending.record.export_mode),
            format: format.unwrap_or(pending.record.export_format),
        };

        match self.submit_export(&request).await {
            Ok(path) => {
                self.pending_re_export = None;
                self.notices.success("重新导出成功！");
                Ok(path)
            }
            Err(e) => self.fail("重新导出", e),
        }
    }
}
