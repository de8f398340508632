use thiserror::Error;

use crate::models::{ChoiceId, QuestionId, TestId, VersionId};

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 前置条件校验失败（在任何打乱工作开始之前）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 存储层错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 前置条件错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 题库为空
    #[error("测试 {test_id} 没有题目，请先添加题目再生成版本")]
    EmptyBank { test_id: TestId },
    /// 版本数量超出范围
    #[error("版本数量 {requested} 超出范围 [1, {max}]")]
    VersionCountOutOfRange { requested: u32, max: u32 },
    /// 每版题目数无效
    #[error("每个版本的题目数量无效: {requested}")]
    InvalidQuestionsPerVersion { requested: usize },
    /// 未知题型
    #[error("未知题型: {tag}")]
    UnknownQuestionType { tag: String },
    /// 题目 ID 重复
    #[error("题目 ID {question_id} 重复")]
    DuplicateQuestion { question_id: QuestionId },
    /// 选项 ID 重复
    #[error("选项 ID {choice_id} 重复 (题目 {question_id})")]
    DuplicateChoice {
        question_id: QuestionId,
        choice_id: ChoiceId,
    },
}

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 测试不存在
    #[error("测试不存在: {test_id}")]
    TestNotFound { test_id: TestId },
    /// 版本不存在
    #[error("版本不存在: {version_id}")]
    VersionNotFound { version_id: VersionId },
    /// 写入失败
    #[error("写入 {table} 失败: {reason}")]
    WriteFailed { table: &'static str, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 序列化失败
    #[error("JSON序列化失败: {source}")]
    JsonFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值不合法
    #[error("配置项 {name} 不合法: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::JsonFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建存储写入错误
    pub fn write_failed(table: &'static str, reason: impl Into<String>) -> Self {
        AppError::Store(StoreError::WriteFailed {
            table,
            reason: reason.into(),
        })
    }

    /// 是否为前置条件错误（调用方应展示给用户）
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
