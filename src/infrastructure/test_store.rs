//! 试卷存储 - 基础设施层
//!
//! 转换流水线只通过 `TestRepository` 与存储交互，具体后端可替换。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, StorageError};
use crate::models::{Question, Test};

/// 外部试卷存储接口
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// 创建空试卷，返回试卷 ID
    async fn create_test(&self, section: &str, name: &str, source_label: &str)
        -> AppResult<String>;

    /// 向试卷追加题目
    async fn add_questions(
        &self,
        section: &str,
        test_id: &str,
        questions: Vec<Question>,
    ) -> AppResult<()>;

    /// 删除试卷（追加题目失败时清理）
    async fn delete_test(&self, section: &str, test_id: &str) -> AppResult<()>;
}

/// 每套试卷一个 JSON 文件：`<root>/<section>/<test_id>.json`
#[derive(Debug, Clone)]
pub struct JsonTestRepository {
    root: PathBuf,
}

impl JsonTestRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn test_path(&self, section: &str, test_id: &str) -> PathBuf {
        self.root.join(section).join(format!("{}.json", test_id))
    }

    /// 读取已保存的试卷
    pub async fn load_test(&self, section: &str, test_id: &str) -> AppResult<Test> {
        let path = self.test_path(section, test_id);
        if !path.exists() {
            return Err(AppError::Storage(StorageError::TestNotFound {
                section: section.to_string(),
                test_id: test_id.to_string(),
            }));
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::storage_io(path.display().to_string(), e))?;
        serde_json::from_str(&content).map_err(|source| {
            AppError::Storage(StorageError::Serialize {
                path: path.display().to_string(),
                source,
            })
        })
    }

    async fn save_test(&self, section: &str, test: &Test) -> AppResult<()> {
        let path = self.test_path(section, &test.id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage_io(parent.display().to_string(), e))?;
        }

        let content = serde_json::to_string_pretty(test).map_err(|source| {
            AppError::Storage(StorageError::Serialize {
                path: path.display().to_string(),
                source,
            })
        })?;
        write_atomically(&path, content.as_bytes()).await
    }
}

/// 先写临时文件再重命名
async fn write_atomically(path: &Path, content: &[u8]) -> AppResult<()> {
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)
        .await
        .map_err(|e| AppError::storage_io(tmp_path.display().to_string(), e))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::storage_io(path.display().to_string(), e))
}

#[async_trait]
impl TestRepository for JsonTestRepository {
    async fn create_test(
        &self,
        section: &str,
        name: &str,
        source_label: &str,
    ) -> AppResult<String> {
        let test = Test {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            questions: Vec::new(),
            source_text: Some(source_label.to_string()),
        };
        self.save_test(section, &test).await?;
        info!("✓ 已创建试卷: {} ({})", test.name, test.id);
        Ok(test.id)
    }

    async fn add_questions(
        &self,
        section: &str,
        test_id: &str,
        questions: Vec<Question>,
    ) -> AppResult<()> {
        let mut test = self.load_test(section, test_id).await?;
        debug!("试卷 {} 追加 {} 道题", test_id, questions.len());
        test.questions.extend(questions);
        self.save_test(section, &test).await
    }

    async fn delete_test(&self, section: &str, test_id: &str) -> AppResult<()> {
        let path = self.test_path(section, test_id);
        if !path.exists() {
            return Err(AppError::Storage(StorageError::TestNotFound {
                section: section.to_string(),
                test_id: test_id.to_string(),
            }));
        }
        fs::remove_file(&path)
            .await
            .map_err(|e| AppError::storage_io(path.display().to_string(), e))?;
        info!("🗑️ 已删除试卷: {}/{}", section, test_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerLetter;

    #[tokio::test]
    async fn test_create_append_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonTestRepository::new(dir.path());

        let id = repo
            .create_test("physics", "Unit 3", "Unit 3 - final.pdf")
            .await
            .unwrap();
        repo.add_questions(
            "physics",
            &id,
            vec![Question::new("q1".into(), "v1".into(), AnswerLetter::Beh)],
        )
        .await
        .unwrap();
        repo.add_questions(
            "physics",
            &id,
            vec![Question::new("q2".into(), "v2".into(), AnswerLetter::Dal)],
        )
        .await
        .unwrap();

        let test = repo.load_test("physics", &id).await.unwrap();
        assert_eq!(test.name, "Unit 3");
        assert_eq!(test.source_text.as_deref(), Some("Unit 3 - final.pdf"));
        assert_eq!(test.questions.len(), 2);
        assert_eq!(test.questions[1].correct_answer, AnswerLetter::Dal);

        repo.delete_test("physics", &id).await.unwrap();
        assert!(repo.load_test("physics", &id).await.is_err());
    }

    #[tokio::test]
    async fn test_add_to_unknown_test_fails() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonTestRepository::new(dir.path());
        let err = repo
            .add_questions("s", "missing", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Storage(StorageError::TestNotFound { .. })
        ));
        tokio_test::assert_err!(repo.delete_test("s", "missing").await);
    }
}
