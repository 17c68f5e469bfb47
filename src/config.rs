use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 题库后端地址
    pub api_base_url: String,
    /// 导出文件保存目录
    pub download_dir: PathBuf,
    /// 未填写标题时的默认试卷标题
    pub default_paper_title: String,
    /// 提示消息自动消失的时间
    pub message_dismiss: Duration,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5001".to_string(),
            download_dir: PathBuf::from("downloads"),
            default_paper_title: "数学试卷".to_string(),
            message_dismiss: Duration::from_secs(3),
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件中允许出现的字段，全部可选
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_base_url: Option<String>,
    download_dir: Option<PathBuf>,
    default_paper_title: Option<String>,
    message_dismiss_secs: Option<u64>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 只从环境变量读取，未设置或无法解析的项使用默认值
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// 先读取 `PAPER_CART_CONFIG` 指向的 TOML 文件（如果有），再用环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("PAPER_CART_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.overlay_env())
    }

    /// 从 TOML 文件读取配置
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::Config(ConfigError::TomlParseFailed { source, .. }) => {
                AppError::Config(ConfigError::TomlParseFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
            other => other,
        })
    }

    /// 解析 TOML 文本，缺省字段取默认值
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();
        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or(default.api_base_url),
            download_dir: file.download_dir.unwrap_or(default.download_dir),
            default_paper_title: file
                .default_paper_title
                .unwrap_or(default.default_paper_title),
            message_dismiss: file
                .message_dismiss_secs
                .map(Duration::from_secs)
                .unwrap_or(default.message_dismiss),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }

    fn overlay_env(self) -> Self {
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(self.api_base_url),
            download_dir: std::env::var("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.download_dir),
            default_paper_title: std::env::var("DEFAULT_PAPER_TITLE")
                .unwrap_or(self.default_paper_title),
            message_dismiss: std::env::var("MESSAGE_DISMISS_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(self.message_dismiss),
            verbose_logging: std::env::var("VERBOSE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.verbose_logging),
        }
    }

    /// 拼接完整的接口地址
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
