pub mod loaders;
pub mod question;
pub mod version;

/// 测试（试卷）ID
pub type TestId = i64;
/// 题目 ID
pub type QuestionId = i64;
/// 选项 ID
pub type ChoiceId = i64;
/// 版本 ID
pub type VersionId = i64;

pub use loaders::{load_all_bank_files, load_bank_file};
pub use question::{
    AnswerChoice, AnswerLink, CorrectAnswer, Question, QuestionBank, QuestionKind, QuestionType,
};
pub use version::{
    AnswerKey, AnswerKeyEntry, ChoiceSlot, GeneratedVersion, KeyAnswer, KeyWarning,
    KeyWarningReason, MaterializedVersion, OrderedChoice, OrderedQuestion, PersistedQuestion,
    PersistedVersion, PreviewChoice, PreviewQuestion, QuestionSlot, VersionPreview, VersionRecord,
    VersionSummary,
};
