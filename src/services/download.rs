/// 导出文件保存服务
///
/// 把后端渲染好的试卷写入下载目录，文件名为 `<标题>_<毫秒时间戳>.<格式>`
/// 标题原样保留，只替换路径分隔符、Windows 保留字符和控制字符
use crate::error::{AppError, AppResult};
use crate::models::ExportFormat;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]+"#).expect("文件名正则有效"))
}

/// 下载写入服务
#[derive(Debug, Clone)]
pub struct DownloadWriter {
    dir: PathBuf,
    default_title: String,
}

impl DownloadWriter {
    pub fn new(dir: impl Into<PathBuf>, default_title: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_title: default_title.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 标题为空时使用的默认标题
    pub fn default_title(&self) -> &str {
        &self.default_title
    }

    /// 生成文件名，标题中不能出现在文件名里的字符替换为下划线
    pub fn file_name(&self, title: &str, format: ExportFormat, millis: i64) -> String {
        format!("{}_{}.{}", self.stem(title), millis, format.extension())
    }

    fn stem(&self, title: &str) -> String {
        let cleaned = unsafe_chars().replace_all(title.trim(), "_");
        let cleaned = cleaned.trim_matches('_');
        if cleaned.is_empty() {
            self.default_title.clone()
        } else {
            cleaned.to_string()
        }
    }

    /// 保存文件，返回完整路径
    pub async fn save(
        &self,
        title: &str,
        format: ExportFormat,
        millis: i64,
        bytes: &[u8],
    ) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.dir.display().to_string(), e))?;

        // 同一毫秒内重复导出时追加序号，不覆盖已有文件
        let mut path = self.dir.join(self.file_name(title, format, millis));
        let mut copy = 1;
        while tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?
        {
            path = self.dir.join(format!(
                "{}_{}({}).{}",
                self.stem(title),
                millis,
                copy,
                format.extension()
            ));
            copy += 1;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        info!("📄 已保存: {} ({} 字节)", path.display(), bytes.len());
        Ok(path)
    }
}
