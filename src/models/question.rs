use serde::{Deserialize, Serialize};

/// 题目文本占位符（题干以图片形式保存）
pub const QUESTION_PLACEHOLDER: &str = "السؤال في الصورة";

/// 四个标准选项字母
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerLetter {
    #[serde(rename = "أ")]
    Alef,
    #[serde(rename = "ب")]
    Beh,
    #[serde(rename = "ج")]
    Jeem,
    #[serde(rename = "د")]
    Dal,
}

impl AnswerLetter {
    /// 选项固定顺序
    pub const ALL: [AnswerLetter; 4] = [
        AnswerLetter::Alef,
        AnswerLetter::Beh,
        AnswerLetter::Jeem,
        AnswerLetter::Dal,
    ];

    /// 无法识别答案时的兜底选项
    pub const FALLBACK: AnswerLetter = AnswerLetter::Alef;

    pub fn as_char(self) -> char {
        match self {
            AnswerLetter::Alef => 'أ',
            AnswerLetter::Beh => 'ب',
            AnswerLetter::Jeem => 'ج',
            AnswerLetter::Dal => 'د',
        }
    }
}

impl std::fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// 从一页试卷中提取出的选择题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_text: String,
    /// 题目区域截图（data URL）
    pub question_image: String,
    /// 答案区域截图，供人工核对
    pub verification_image: String,
    pub options: [AnswerLetter; 4],
    pub correct_answer: AnswerLetter,
}

impl Question {
    pub fn new(
        question_image: String,
        verification_image: String,
        correct_answer: AnswerLetter,
    ) -> Self {
        Self {
            question_text: QUESTION_PLACEHOLDER.to_string(),
            question_image,
            verification_image,
            options: AnswerLetter::ALL,
            correct_answer,
        }
    }
}

/// 一份源文档对应一套试卷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// 来源文件名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl std::fmt::Display for Test {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{} 道题]", self.name, self.questions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_uses_fixed_options() {
        let q = Question::new("q".into(), "a".into(), AnswerLetter::Jeem);
        assert_eq!(q.options, AnswerLetter::ALL);
        assert_eq!(q.question_text, QUESTION_PLACEHOLDER);
    }

    #[test]
    fn test_answer_letter_serializes_as_arabic() {
        let q = Question::new("q".into(), "a".into(), AnswerLetter::Beh);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["correctAnswer"], "ب");
        assert_eq!(json["options"][3], "د");
        assert_eq!(json["verificationImage"], "a");
    }
}
