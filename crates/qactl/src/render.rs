//! Reply rendering
//!
//! Turns engine outcomes into chat reply text. Stored answers keep their
//! escapes; they are only unescaped here, at display time.

use crate::command::{CommandSpec, COMMANDS};
use qa_common::{Answer, Provenance, UpsertOutcome};

/// Prefix a body with a reply marker for `message_id`
pub fn reply(message_id: &str, body: &str) -> String {
    format!("[CQ:reply,id={}]{}", message_id, body)
}

/// Restore characters escaped at storage time
pub fn unescape(text: &str) -> String {
    // &amp; last so "&amp;#91;" stays a literal "&#91;"
    text.replace("\\n", "\n")
        .replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&#44;", ",")
        .replace("&amp;", "&")
}

/// Body for an answer, None when nothing should be sent
pub fn render_answer(answer: &Answer, show_confidence: bool) -> Option<String> {
    match answer {
        Answer::Matched(result) => {
            let mut body = unescape(&result.answer);
            if show_confidence && result.provenance != Provenance::Exact {
                body.push_str(&format!(
                    "\n(匹配问题: {} | 匹配度 {:.0}% | {})",
                    result.question,
                    result.score * 100.0,
                    result.provenance.as_str()
                ));
            }
            Some(body)
        }
        Answer::Suggested(suggestion) => {
            let mut body = format!("识别到关键词「{}」，你可能想问:\n", suggestion.keyword);
            for (i, question) in suggestion.questions.iter().enumerate() {
                body.push_str(&format!("{}. {}\n", i + 1, question));
            }
            body.push_str("如有需要请发送上述问题");
            Some(body)
        }
        Answer::Disabled | Answer::NoMatch => None,
    }
}

/// One page of the question list; pages start at 1
pub fn render_list(entries: &[(String, String)], page: usize, page_size: usize) -> String {
    if entries.is_empty() {
        return "知识库为空".to_string();
    }

    let page_size = page_size.max(1);
    let pages = entries.len().div_ceil(page_size);
    if page == 0 || page > pages {
        return format!("页码超出范围 (共 {} 页)", pages);
    }

    let start = (page - 1) * page_size;
    let mut body = format!("知识库列表 (第 {}/{} 页，共 {} 条):", page, pages, entries.len());
    for (i, (question, _)) in entries.iter().enumerate().skip(start).take(page_size) {
        body.push_str(&format!("\n{}. {}", i + 1, question));
    }
    body
}

pub fn render_upsert(outcome: UpsertOutcome, question: &str, answer: &str) -> String {
    let verb = match outcome {
        UpsertOutcome::Inserted => "添加成功",
        UpsertOutcome::Replaced => "更新成功",
    };
    format!("{}\n问题: {}\n答案: {}", verb, question, unescape(answer))
}

pub fn render_delete(removed: bool, question: &str) -> String {
    if removed {
        format!("删除成功\n问题: {}", question)
    } else {
        format!("未找到问题: {}", question)
    }
}

pub fn render_compare(text_a: &str, text_b: &str, score: f64) -> String {
    format!("「{}」与「{}」的相似度: {:.2}%", text_a, text_b, score * 100.0)
}

pub fn render_usage(spec: &CommandSpec) -> String {
    format!("用法: {}", spec.usage)
}

pub fn render_help() -> String {
    let mut body = String::from("知识库命令:");
    for spec in COMMANDS {
        body.push_str(&format!("\n{}  (别名: {})", spec.usage, spec.names.join(", ")));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_common::{MatchResult, Suggestion};

    fn matched(provenance: Provenance, score: f64) -> Answer {
        Answer::Matched(MatchResult {
            question: "q".to_string(),
            answer: "see &#91;docs&#93;\\nthen retry".to_string(),
            provenance,
            score,
        })
    }

    #[test]
    fn test_reply_marker() {
        assert_eq!(reply("42", "hi"), "[CQ:reply,id=42]hi");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a&#91;b&#93;c&#44;d"), "a[b]c,d");
        assert_eq!(unescape("line\\nnext"), "line\nnext");
        assert_eq!(unescape("&amp;#91;"), "&#91;");
    }

    #[test]
    fn test_render_match() {
        let body = render_answer(&matched(Provenance::Exact, 1.0), true).unwrap();
        assert_eq!(body, "see [docs]\nthen retry");

        let fuzzy = render_answer(&matched(Provenance::Global, 0.8), true).unwrap();
        assert!(fuzzy.ends_with("(匹配问题: q | 匹配度 80% | global)"));

        let quiet = render_answer(&matched(Provenance::Global, 0.8), false).unwrap();
        assert_eq!(quiet, "see [docs]\nthen retry");
    }

    #[test]
    fn test_render_suggestion() {
        let body = render_answer(
            &Answer::Suggested(Suggestion {
                keyword: "账号".to_string(),
                questions: vec!["账号注册".to_string(), "账号注销".to_string()],
            }),
            false,
        )
        .unwrap();
        assert!(body.starts_with("识别到关键词「账号」"));
        assert!(body.contains("1. 账号注册\n2. 账号注销\n"));
    }

    #[test]
    fn test_silent_outcomes() {
        assert!(render_answer(&Answer::NoMatch, true).is_none());
        assert!(render_answer(&Answer::Disabled, true).is_none());
    }

    #[test]
    fn test_render_list_pages() {
        let entries: Vec<(String, String)> =
            (1..=12).map(|i| (format!("q{}", i), "a".to_string())).collect();

        let first = render_list(&entries, 1, 10);
        assert!(first.starts_with("知识库列表 (第 1/2 页，共 12 条):"));
        assert!(first.contains("\n1. q1"));
        assert!(first.contains("\n10. q10"));
        assert!(!first.contains("q11"));

        let second = render_list(&entries, 2, 10);
        assert!(second.contains("\n11. q11\n12. q12"));

        assert_eq!(render_list(&entries, 3, 10), "页码超出范围 (共 2 页)");
        assert_eq!(render_list(&[], 1, 10), "知识库为空");
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = render_help();
        for spec in COMMANDS {
            assert!(help.contains(spec.usage));
        }
    }
}
