use crate::types::{operate::Operate, question::Question};

pub const NO_QUESTIONS: &str = "<p>設問はありません。</p>";

/// Same entity set tera applies under autoescape.
pub fn escape_html(s: &str) -> String {
    tera::escape_html(s)
}

pub fn escape_html_with_breaks(s: &str) -> String {
    // escape first, otherwise the <br> tags would be escaped as well
    escape_html(s).replace("\r\n", "\n").replace('\n', "<br>")
}

/// Field values shared by the template and the inline page, already escaped.
/// The body is trusted markup and is passed through as is.
struct PageFields {
    title: String,
    author: String,
    body: String,
    questions: String,
    initial_answer: String,
}

impl PageFields {
    fn new(article: &Operate, questions: &[Question]) -> Self {
        let questions_html = if questions.is_empty() {
            NO_QUESTIONS.to_string()
        } else {
            questions
                .iter()
                .enumerate()
                .map(|(i, q)| {
                    // unnumbered questions fall back to their position
                    let number = q.question_number.unwrap_or(i as u32 + 1);
                    format!(
                        "<div class=\"question\" data-number=\"{}\">{}</div>",
                        number,
                        escape_html_with_breaks(q.content.as_deref().unwrap_or_default())
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let initial_answer = questions
            .iter()
            .filter_map(|q| q.answer_template.as_deref())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        PageFields {
            title: escape_html(article.title.as_deref().unwrap_or("No Title")),
            author: escape_html(article.author.as_deref().unwrap_or("Unknown")),
            body: article.body.clone().unwrap_or_default(),
            questions: questions_html,
            initial_answer: escape_html(&initial_answer),
        }
    }

    fn lookup(&self, token: &str) -> Option<&str> {
        match token {
            "TITLE" => Some(self.title.as_str()),
            "AUTHOR" => Some(self.author.as_str()),
            "BODY" => Some(self.body.as_str()),
            "QUESTIONS" => Some(self.questions.as_str()),
            "INITIAL_ANSWER" => Some(self.initial_answer.as_str()),
            _ => None,
        }
    }
}

/// Replaces `{{TOKEN}}` placeholders in one pass. Inserted values are not
/// scanned again, and unknown tokens stay in the output untouched.
pub fn render_template(template: &str, article: &Operate, questions: &[Question]) -> String {
    let fields = PageFields::new(article, questions);
    let mut out = String::with_capacity(template.len() + fields.body.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        // only a closed braces pair naming a known field is replaced
        let replacement = after
            .find("}}")
            .and_then(|end| fields.lookup(&after[..end]).map(|value| (end, value)));
        match replacement {
            Some((end, value)) => {
                out.push_str(value);
                // continue after the closing braces, never inside `value`
                rest = &after[end + 2..];
            }
            None => {
                // keep the braces as text and resume right behind them, so a
                // token starting inside an unknown one is still found
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// The operate page without a template.
pub fn build_page_html(article: &Operate, questions: &[Question]) -> String {
    let fields = PageFields::new(article, questions);
    format!(
        r#"<!doctype html>
<html lang="ja">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <title>{title}</title>
  <link rel="stylesheet" href="/style.css">
  <link rel="stylesheet" href="/css/operate.css">
</head>
<body>
  <main class="article-container">
    <h1>{title}</h1>
    <div class="meta">作成者: {author}</div>
    <article class="body">{body}</article>

    <h2>設問</h2>
    <div class="questions-list">
      <div class="question-content">{questions}</div>
    </div>

    <h2>回答欄</h2>
    <div class="answer-section">
      <label for="answer-area" class="sr-only">全問題の回答</label>
      <textarea
        id="answer-area"
        placeholder="こちらに全ての問題の回答を入力してください..."
        aria-label="全問題の回答欄"
      >{initial_answer}</textarea>
    </div>

    <div class="submit-section">
      <p><button id="submit-answers">回答を送信する</button></p>
      <div id="form-result" aria-live="polite"></div>
    </div>

    <p><a href="/">ホームへ戻る</a></p>
  </main>
  <script src="/js/gemini-form.js"></script>
</body>
</html>"#,
        title = fields.title,
        author = fields.author,
        body = fields.body,
        questions = fields.questions,
        initial_answer = fields.initial_answer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = include_str!("../public/templates/operate.html");

    fn article() -> Operate {
        Operate {
            id: Some("7".to_string()),
            title: Some("Tom & <Jerry>".to_string()),
            author: Some("Hanna \"Bill\"".to_string()),
            body: Some("<p>Chase scene</p>".to_string()),
            ..Operate::default()
        }
    }

    fn questions() -> Vec<Question> {
        vec![
            Question {
                operate_id: Some("7".to_string()),
                question_number: Some(1),
                content: Some("Who wins?\nExplain.".to_string()),
                answer_template: Some("Winner:".to_string()),
                ..Question::default()
            },
            Question {
                operate_id: Some("7".to_string()),
                question_number: Some(2),
                content: Some("Is <cheese> involved?".to_string()),
                ..Question::default()
            },
        ]
    }

    /// Text a browser would show: tags dropped, entities left as written,
    /// whitespace collapsed.
    fn visible_text(html: &str) -> String {
        let mut text = String::new();
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => {
                    in_tag = true;
                    text.push(' ');
                }
                '>' if in_tag => in_tag = false,
                _ if !in_tag => text.push(c),
                _ => {}
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;&#x2F;a&gt;"
        );
        assert_eq!(escape_html("設問 1"), "設問 1");
        assert_eq!(escape_html_with_breaks("a\r\nb\nc"), "a<br>b<br>c");
    }

    #[test]
    fn substitutes_every_placeholder() {
        let html = render_template(TEMPLATE, &article(), &questions());
        assert!(!html.contains("{{"));
        assert!(html.contains("<title>Tom &amp; &lt;Jerry&gt;</title>"));
        assert!(html.contains("Hanna &quot;Bill&quot;"));
        assert!(html.contains("<p>Chase scene</p>"));
        assert!(html.contains("Who wins?<br>Explain."));
        assert!(html.contains("Is &lt;cheese&gt; involved?"));
        assert!(html.contains(">Winner:</textarea>"));
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let mut article = article();
        article.body = Some("literal {{TITLE}} in body".to_string());
        let html = render_template("{{BODY}}|{{UNKNOWN}}|{{TITLE", &article, &[]);
        assert_eq!(html, "literal {{TITLE}} in body|{{UNKNOWN}}|{{TITLE");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let html = render_template("{{TITLE}}/{{AUTHOR}}/{{QUESTIONS}}", &Operate::default(), &[]);
        assert_eq!(html, format!("No Title/Unknown/{}", NO_QUESTIONS));
    }

    #[test]
    fn template_and_inline_page_show_the_same_text() {
        let article = article();
        let questions = questions();
        let from_template = visible_text(&render_template(TEMPLATE, &article, &questions));
        let inline = visible_text(&build_page_html(&article, &questions));

        for expected in [
            "Tom &amp; &lt;Jerry&gt;",
            "作成者: Hanna &quot;Bill&quot;",
            "Chase scene",
            "Who wins? Explain.",
            "Is &lt;cheese&gt; involved?",
            "Winner:",
        ] {
            assert!(from_template.contains(expected), "template page lacks {:?}", expected);
            assert!(inline.contains(expected), "inline page lacks {:?}", expected);
        }
        assert_eq!(from_template, inline);
    }

    #[test]
    fn empty_question_list_renders_placeholder() {
        let html = build_page_html(&article(), &[]);
        assert!(html.contains(NO_QUESTIONS));
        assert!(html.contains("></textarea>"));
    }
}
