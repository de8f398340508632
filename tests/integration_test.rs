use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use exam_shuffle::error::{AppError, AppResult, StoreError, ValidationError};
use exam_shuffle::infrastructure::{ManualClock, MemoryStore, VersionStore};
use exam_shuffle::models::{
    AnswerChoice, ChoiceSlot, CorrectAnswer, KeyAnswer, PersistedVersion, Question, QuestionBank,
    QuestionSlot, QuestionType, TestId, VersionId, VersionRecord, VersionSummary,
};
use exam_shuffle::{Config, VersionService};

const TEST_ID: TestId = 1;
const ESSAY_ANSWER: &str = "光合作用把光能转化为化学能";

fn choice(id: i64, text: &str) -> AnswerChoice {
    AnswerChoice {
        id,
        text: text.to_string(),
        image_url: None,
    }
}

/// 第 1 部分：A、B 两道三选一选择题；第 2 部分：C 一道论述题
fn two_part_bank() -> QuestionBank {
    let mut bank = QuestionBank::new(TEST_ID, "生物期中");
    bank.questions = vec![
        Question {
            id: 1,
            text: "A: 叶绿体的主要功能?".to_string(),
            question_type: QuestionType::MultipleChoice,
            part: Some(1),
            choices: vec![choice(10, "呼吸"), choice(11, "光合作用"), choice(12, "分裂")],
        },
        Question {
            id: 2,
            text: "B: 细胞的能量工厂?".to_string(),
            question_type: QuestionType::MultipleChoice,
            part: Some(1),
            choices: vec![
                choice(20, "线粒体"),
                choice(21, "核糖体"),
                choice(22, "高尔基体"),
            ],
        },
        Question {
            id: 3,
            text: "C: 论述光合作用的意义".to_string(),
            question_type: QuestionType::Essay,
            part: Some(2),
            choices: vec![],
        },
    ];
    bank.set_answer(1, CorrectAnswer::ChoiceId(11));
    bank.set_answer(2, CorrectAnswer::ChoiceId(20));
    bank.set_answer(3, CorrectAnswer::Text(ESSAY_ANSWER.to_string()));
    bank
}

fn seeded_config(seed: u64) -> Config {
    Config {
        rng_seed: Some(seed),
        ..Config::default()
    }
}

async fn service_with_bank(seed: u64) -> VersionService<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.put_bank(two_part_bank()).await;
    VersionService::new(store, &seeded_config(seed))
}

#[tokio::test]
async fn test_end_to_end_two_parts() {
    let service = service_with_bank(2024).await;

    let generated = service.generate_versions(TEST_ID, 5, None).await.unwrap();
    assert_eq!(generated.len(), 5);

    let mut a_orders = HashSet::new();
    for version in &generated {
        assert_eq!(version.question_count, 3);

        let persisted = service.store().load_version(version.id).await.unwrap();
        let ids: Vec<_> = persisted.questions.iter().map(|q| q.question_id).collect();
        assert_eq!(
            ids[..2].iter().copied().collect::<HashSet<_>>(),
            HashSet::from([1, 2]),
            "A 和 B 必须占据第 1-2 位"
        );
        assert_eq!(ids[2], 3, "C 必须在第 3 位");

        let a = persisted.questions.iter().find(|q| q.question_id == 1).unwrap();
        let a_choice_ids: Vec<_> = a.choices.iter().map(|c| c.choice_id).collect();
        let mut sorted = a_choice_ids.clone();
        sorted.sort();
        assert_eq!(sorted, vec![10, 11, 12]);
        a_orders.insert(a_choice_ids);

        let b = persisted.questions.iter().find(|q| q.question_id == 2).unwrap();
        let mut b_choice_ids: Vec<_> = b.choices.iter().map(|c| c.choice_id).collect();
        b_choice_ids.sort();
        assert_eq!(b_choice_ids, vec![20, 21, 22]);
        let b_orders: Vec<_> = b.choices.iter().map(|c| c.choice_order).collect();
        assert_eq!(b_orders, vec![1, 2, 3]);

        let c = persisted.questions.iter().find(|q| q.question_id == 3).unwrap();
        assert!(c.choices.is_empty());

        let key = service.answer_key(version.id).await.unwrap();
        assert!(key.warnings.is_empty());
        assert_eq!(
            key.entry_for(3).unwrap().answer,
            KeyAnswer::Text(ESSAY_ANSWER.to_string())
        );
    }

    assert!(a_orders.len() > 1, "5 个版本的选项顺序不应完全相同");
}

#[tokio::test]
async fn test_version_numbering_continues_from_max() {
    let service = service_with_bank(1).await;

    let first = service.generate_versions(TEST_ID, 3, None).await.unwrap();
    assert_eq!(
        first.iter().map(|v| v.version_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let more = service.generate_versions(TEST_ID, 2, None).await.unwrap();
    assert_eq!(
        more.iter().map(|v| v.version_number).collect::<Vec<_>>(),
        vec![4, 5]
    );

    let listed: Vec<_> = service
        .list_versions(TEST_ID)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    assert_eq!(listed, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_answer_key_round_trip_letter() {
    let store = Arc::new(MemoryStore::new());
    let mut bank = QuestionBank::new(TEST_ID, "字母");
    bank.questions.push(Question {
        id: 1,
        text: "哪个正确?".to_string(),
        question_type: QuestionType::MultipleChoice,
        part: None,
        choices: vec![choice(100, "X"), choice(101, "Y"), choice(102, "Z")],
    });
    bank.set_answer(1, CorrectAnswer::ChoiceId(101));
    store.put_bank(bank).await;

    // 持久化顺序为 [Z, X, Y]
    let record = store.create_version(TEST_ID).await.unwrap();
    store
        .save_question_order(record.id, &[QuestionSlot { question_id: 1, question_order: 1 }])
        .await
        .unwrap();
    store
        .save_choice_order(
            record.id,
            &[
                ChoiceSlot { question_id: 1, choice_id: 102, choice_order: 1 },
                ChoiceSlot { question_id: 1, choice_id: 100, choice_order: 2 },
                ChoiceSlot { question_id: 1, choice_id: 101, choice_order: 3 },
            ],
        )
        .await
        .unwrap();

    let service = VersionService::new(store, &Config::default());
    let key = service.answer_key(record.id).await.unwrap();

    assert_eq!(key.entry_for(1).unwrap().answer, KeyAnswer::Letter("C".to_string()));

    let preview = service.get_version(record.id).await.unwrap();
    let letters: Vec<_> = preview.questions[0]
        .choices
        .iter()
        .map(|c| (c.letter.as_str(), c.text.as_str()))
        .collect();
    assert_eq!(letters, vec![("A", "Z"), ("B", "X"), ("C", "Y")]);
}

#[tokio::test]
async fn test_preview_letters_match_answer_key() {
    let service = service_with_bank(7).await;
    let generated = service.generate_versions(TEST_ID, 3, None).await.unwrap();

    for version in generated {
        let preview = service.get_version(version.id).await.unwrap();
        let key = service.answer_key(version.id).await.unwrap();
        assert_eq!(preview.test_title, "生物期中");
        assert_eq!(preview.version_number, version.version_number);

        let a = preview.questions.iter().find(|q| q.question_id == 1).unwrap();
        let correct = a.choices.iter().find(|c| c.choice_id == 11).unwrap();
        assert_eq!(
            key.entry_for(a.question_number).unwrap().answer,
            KeyAnswer::Letter(correct.letter.clone())
        );
    }
}

#[tokio::test]
async fn test_rejects_out_of_range_counts_and_empty_bank() {
    let service = service_with_bank(1).await;

    for count in [0, 101] {
        let err = service.generate_versions(TEST_ID, count, None).await.unwrap_err();
        assert!(err.is_validation());
    }

    let err = service
        .generate_versions(TEST_ID, 1, Some(0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::InvalidQuestionsPerVersion { requested: 0 })
    ));

    service.store().put_bank(QuestionBank::new(5, "空测试")).await;
    let err = service.generate_versions(5, 2, None).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::EmptyBank { test_id: 5 })
    ));
    assert!(service.list_versions(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_test_is_store_error() {
    let service = service_with_bank(1).await;
    let err = service.generate_versions(42, 1, None).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Store(StoreError::TestNotFound { test_id: 42 })
    ));
}

#[tokio::test]
async fn test_delete_version_removes_everything() {
    let service = service_with_bank(3).await;
    let generated = service.generate_versions(TEST_ID, 2, None).await.unwrap();
    let doomed = generated[0].id;

    service.delete_version(doomed).await.unwrap();

    assert!(matches!(
        service.get_version(doomed).await,
        Err(AppError::Store(StoreError::VersionNotFound { .. }))
    ));
    assert!(service.answer_key(doomed).await.is_err());
    assert!(service.delete_version(doomed).await.is_err());

    let remaining = service.list_versions(TEST_ID).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, generated[1].id);
}

#[tokio::test]
async fn test_bank_cache_invalidation() {
    let store = Arc::new(MemoryStore::new());
    store.put_bank(two_part_bank()).await;
    let clock = Arc::new(ManualClock::new());
    let service = VersionService::with_clock(store.clone(), &seeded_config(9), clock.clone());

    let version = service.generate_versions(TEST_ID, 1, None).await.unwrap()[0].id;
    let essay_answer = |key: &exam_shuffle::models::AnswerKey| {
        key.entry_for(3).map(|e| e.answer.clone())
    };

    store
        .update_bank(TEST_ID, |bank| {
            bank.set_answer(3, CorrectAnswer::Text("修订后的答案".to_string()))
        })
        .await
        .unwrap();

    // 缓存未过期，仍读到旧题库
    let key = service.answer_key(version).await.unwrap();
    assert_eq!(essay_answer(&key), Some(KeyAnswer::Text(ESSAY_ANSWER.to_string())));

    service.invalidate_bank(TEST_ID);
    let key = service.answer_key(version).await.unwrap();
    assert_eq!(essay_answer(&key), Some(KeyAnswer::Text("修订后的答案".to_string())));

    store
        .update_bank(TEST_ID, |bank| {
            bank.set_answer(3, CorrectAnswer::Text("第三版答案".to_string()))
        })
        .await
        .unwrap();
    clock.advance(Duration::from_secs(301));
    let key = service.answer_key(version).await.unwrap();
    assert_eq!(essay_answer(&key), Some(KeyAnswer::Text("第三版答案".to_string())));
}

#[tokio::test]
async fn test_answer_key_warns_when_choice_removed_after_generation() {
    let store = Arc::new(MemoryStore::new());
    store.put_bank(two_part_bank()).await;
    let service = VersionService::new(store.clone(), &seeded_config(4));
    let version = service.generate_versions(TEST_ID, 1, None).await.unwrap()[0].id;

    // 题目 2 的标准答案改指向一个本版本中不存在的选项
    store
        .update_bank(TEST_ID, |bank| {
            bank.questions[1].choices.push(choice(23, "新增选项"));
            bank.set_answer(2, CorrectAnswer::ChoiceId(23));
        })
        .await
        .unwrap();
    service.invalidate_bank(TEST_ID);

    let key = service.answer_key(version).await.unwrap();
    assert_eq!(key.entries.len(), 2);
    assert_eq!(key.warnings.len(), 1);
    assert_eq!(key.warnings[0].question_id, 2);
}

/// 在指定的第 N 次 `create_version` / `save_choice_order` 调用时失败的存储
struct FlakyStore {
    inner: MemoryStore,
    create_calls: AtomicUsize,
    choice_calls: AtomicUsize,
    fail_create_on: HashSet<usize>,
    fail_choice_on: HashSet<usize>,
}

impl FlakyStore {
    fn new(fail_create_on: &[usize], fail_choice_on: &[usize]) -> Self {
        Self {
            inner: MemoryStore::new(),
            create_calls: AtomicUsize::new(0),
            choice_calls: AtomicUsize::new(0),
            fail_create_on: fail_create_on.iter().copied().collect(),
            fail_choice_on: fail_choice_on.iter().copied().collect(),
        }
    }
}

#[async_trait]
impl VersionStore for FlakyStore {
    async fn load_bank(&self, test_id: TestId) -> AppResult<QuestionBank> {
        self.inner.load_bank(test_id).await
    }

    async fn create_version(&self, test_id: TestId) -> AppResult<VersionRecord> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_create_on.contains(&call) {
            return Err(AppError::write_failed("test_versions", "连接中断"));
        }
        self.inner.create_version(test_id).await
    }

    async fn save_question_order(
        &self,
        version_id: VersionId,
        slots: &[QuestionSlot],
    ) -> AppResult<()> {
        self.inner.save_question_order(version_id, slots).await
    }

    async fn save_choice_order(
        &self,
        version_id: VersionId,
        slots: &[ChoiceSlot],
    ) -> AppResult<()> {
        let call = self.choice_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_choice_on.contains(&call) {
            return Err(AppError::write_failed("test_versions_answer_choices", "连接中断"));
        }
        self.inner.save_choice_order(version_id, slots).await
    }

    async fn list_versions(&self, test_id: TestId) -> AppResult<Vec<VersionSummary>> {
        self.inner.list_versions(test_id).await
    }

    async fn load_version(&self, version_id: VersionId) -> AppResult<PersistedVersion> {
        self.inner.load_version(version_id).await
    }

    async fn delete_version(&self, version_id: VersionId) -> AppResult<()> {
        self.inner.delete_version(version_id).await
    }
}

#[tokio::test]
async fn test_failed_trials_are_rolled_back_and_skipped() {
    let store = Arc::new(FlakyStore::new(&[], &[2, 4]));
    store.inner.put_bank(two_part_bank()).await;
    let service = VersionService::new(store.clone(), &seeded_config(5));

    let generated = service.generate_versions(TEST_ID, 4, None).await.unwrap();

    assert_eq!(generated.len(), 2, "失败的试验被跳过");
    assert_eq!(
        generated.iter().map(|v| v.version_number).collect::<Vec<_>>(),
        vec![1, 2]
    );

    // 不存在只写了一半的版本
    let listed = service.list_versions(TEST_ID).await.unwrap();
    assert_eq!(listed.len(), 2);
    for summary in listed {
        let version = service.store().load_version(summary.id).await.unwrap();
        let a = version.questions.iter().find(|q| q.question_id == 1).unwrap();
        assert_eq!(a.choices.len(), 3);
        let key = service.answer_key(summary.id).await.unwrap();
        assert!(key.warnings.is_empty());
    }
}

#[tokio::test]
async fn test_failed_version_record_skips_only_that_trial() {
    let store = Arc::new(FlakyStore::new(&[2], &[]));
    store.inner.put_bank(two_part_bank()).await;
    let service = VersionService::new(store.clone(), &seeded_config(6));

    let generated = service.generate_versions(TEST_ID, 3, None).await.unwrap();

    assert_eq!(
        generated.iter().map(|v| v.version_number).collect::<Vec<_>>(),
        vec![1, 2]
    );
    let listed: Vec<_> = service
        .list_versions(TEST_ID)
        .await
        .unwrap()
        .iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(listed, generated.iter().map(|v| v.id).collect::<Vec<_>>());
    for version in &generated {
        assert_eq!(version.question_count, 3);
        assert!(service.answer_key(version.id).await.unwrap().warnings.is_empty());
    }
}
