//! System instruction and user prompt assembly for persona comments.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};

use crate::llm_client::prompts::{BODY_ONLY_INSTRUCTION, MEMORY_USE_INSTRUCTION};
use crate::models::{Comment, Persona, Post};
use crate::selection::SelectionContext;

/// Post bodies longer than this are cut and marked with an ellipsis.
pub const CONTENT_CHAR_LIMIT: usize = 3000;
/// Longest commentary-log excerpt, ellipsis included.
pub const EXCERPT_CHAR_LIMIT: usize = 100;
const ELLIPSIS: &str = "...";

/// Persona definition, then memory (when there is any), then fixed rules.
pub fn build_system_instruction(persona: &Persona, memory: Option<&str>) -> String {
    let mut out = persona.definition.trim().to_string();

    if let Some(memory) = memory.map(str::trim).filter(|m| !m.is_empty()) {
        out.push_str("\n\n## Your Memory\n\n");
        out.push_str(memory);
    }

    out.push_str("\n\n## Instructions\n\n");
    out.push_str(&format!(
        "- Write as {}, in the voice defined above.\n\
         - {MEMORY_USE_INSTRUCTION}\n\
         - Keep it to 1-3 paragraphs.\n\
         - When replying to a comment, address that comment and its author directly.\n\
         - {BODY_ONLY_INSTRUCTION}",
        persona.name
    ));
    out
}

/// Everything the user prompt is built from.
pub struct PromptInput<'a> {
    pub post: &'a Post,
    pub context: &'a SelectionContext,
    /// Recent approved comments, oldest first.
    pub comments: &'a [Comment],
    pub parent: Option<&'a Comment>,
    pub now: DateTime<Utc>,
}

pub fn build_user_prompt(input: &PromptInput<'_>) -> String {
    let post = input.post;
    let mut sections = Vec::new();

    let mut header = format!(
        "# Post: {}\n\nPublished: {} ({})",
        post.title.trim(),
        post.published_at.format("%Y-%m-%d"),
        human_time_diff(post.published_at, input.now)
    );
    if !post.categories.is_empty() {
        header.push_str(&format!("\nCategories: {}", post.categories.join(", ")));
    }
    sections.push(header);

    if let Some(why) = why_this_post(input.context) {
        sections.push(format!("## Why This Post\n\n{why}"));
    }

    sections.push(format!(
        "## Content\n\n{}",
        truncate_chars(&strip_markup(&post.content), CONTENT_CHAR_LIMIT)
    ));

    if !input.comments.is_empty() {
        let rendered: Vec<String> = input.comments.iter().map(render_comment).collect();
        sections.push(format!("## Existing Comments\n\n{}", rendered.join("\n\n")));
    }

    match input.parent {
        Some(parent) => sections.push(format!(
            "## Replying To\n\n{}\n\nWrite a reply to the comment above from {}.",
            render_comment(parent),
            parent.author_name
        )),
        None => sections.push("Write your comment on this post.".to_string()),
    }

    sections.join("\n\n")
}

fn why_this_post(context: &SelectionContext) -> Option<String> {
    let mut lines = Vec::new();
    if !context.strategy_hint.trim().is_empty() {
        lines.push(context.strategy_hint.trim().to_string());
    }
    lines.extend(
        context
            .notes
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(|n| format!("- {n}")),
    );
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn render_comment(comment: &Comment) -> String {
    format!(
        "**{}** ({}):\n{}",
        comment.author_name,
        comment.created_at.format("%Y-%m-%d"),
        strip_markup(&comment.content)
    )
}

/// Element subtrees that never hold readable text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe"];
/// Elements followed by a line break in the extracted text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "blockquote", "pre", "tr", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Extracts the readable text of an HTML fragment. Entities are decoded by the
/// parser; blank lines are collapsed and each line's whitespace is normalized.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut text);

    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for node in element.children() {
        if let Some(child) = ElementRef::wrap(node) {
            let tag = child.value().name();
            if SKIPPED_TAGS.contains(&tag) {
                continue;
            }
            collect_text(child, out);
            if BLOCK_TAGS.contains(&tag) {
                out.push('\n');
            }
        } else if let Some(text) = node.value().as_text() {
            out.push_str(text);
        }
    }
}

/// Cuts `text` to at most `max` characters, the last three being `...` when cut.
pub fn abridge(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let head: String = text.chars().take(keep).collect();
    format!("{}{ELLIPSIS}", head.trim_end())
}

/// Keeps the first `max` characters and appends `...` when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}{ELLIPSIS}", head.trim_end())
}

/// "3 days ago", "1 hour ago", "just now".
pub fn human_time_diff(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let secs = (to - from).num_seconds().max(0);
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const WEEK: i64 = 7 * DAY;
    const MONTH: i64 = 30 * DAY;
    const YEAR: i64 = 365 * DAY;

    let (n, unit) = match secs {
        s if s < MINUTE => return "just now".to_string(),
        s if s < HOUR => (s / MINUTE, "minute"),
        s if s < DAY => (s / HOUR, "hour"),
        s if s < WEEK => (s / DAY, "day"),
        s if s < MONTH => (s / WEEK, "week"),
        s if s < YEAR => (s / MONTH, "month"),
        s => (s / YEAR, "year"),
    };
    let plural = if n == 1 { "" } else { "s" };
    format!("{n} {unit}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::models::{CronFrequency, PostStatus};

    fn persona() -> Persona {
        Persona {
            id: "ada".to_string(),
            name: "Ada".to_string(),
            definition: "You are Ada, a wry engineer.".to_string(),
            author_identity: 1,
            provider: "anthropic".to_string(),
            cron_enabled: false,
            cron_frequency: CronFrequency::Daily,
        }
    }

    fn post(content: &str) -> Post {
        Post {
            id: 3,
            post_type: "post".to_string(),
            status: PostStatus::Publish,
            title: "On Bridges".to_string(),
            content: content.to_string(),
            author_id: 1,
            published_at: Utc::now() - Duration::days(3),
            categories: vec!["Engineering".to_string(), "History".to_string()],
        }
    }

    fn comment(author: &str, body: &str) -> Comment {
        Comment {
            id: 1,
            post_id: 3,
            author_id: None,
            author_name: author.to_string(),
            content: body.to_string(),
            approved: true,
            parent_id: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_system_instruction_includes_memory_only_when_present() {
        let memory = "## Notes\n\n- [2024-01-01] x";
        let with = build_system_instruction(&persona(), Some(memory));
        assert!(with.starts_with("You are Ada"));
        assert!(with.contains("## Your Memory\n\n## Notes"));
        assert!(with.contains("1-3 paragraphs"));

        let without = build_system_instruction(&persona(), None);
        assert!(!without.contains("Your Memory"));
        assert!(without.contains("Output only the text itself"));
    }

    #[test]
    fn test_user_prompt_sections() {
        let mut ctx = SelectionContext::new("random_recent", "Picked at random.");
        ctx.notes.push("Readers asked for more history".to_string());
        let post = post("<p>Steel &amp; stone.</p>");
        let comments = vec![comment("Bob", "<em>Nice</em> piece")];

        let prompt = build_user_prompt(&PromptInput {
            post: &post,
            context: &ctx,
            comments: &comments,
            parent: None,
            now: Utc::now(),
        });

        assert!(prompt.starts_with("# Post: On Bridges"));
        assert!(prompt.contains("(3 days ago)"));
        assert!(prompt.contains("Categories: Engineering, History"));
        assert!(prompt.contains(
            "## Why This Post\n\nPicked at random.\n- Readers asked for more history"
        ));
        assert!(prompt.contains("## Content\n\nSteel & stone."));
        assert!(prompt.contains("**Bob**"));
        assert!(prompt.contains("Nice piece"));
        assert!(prompt.ends_with("Write your comment on this post."));
    }

    #[test]
    fn test_user_prompt_reply_block_and_empty_context() {
        let post = post("Body");
        let parent = comment("Carol", "I disagree.");
        let prompt = build_user_prompt(&PromptInput {
            post: &post,
            context: &SelectionContext::default(),
            comments: &[],
            parent: Some(&parent),
            now: Utc::now(),
        });
        assert!(!prompt.contains("Why This Post"));
        assert!(!prompt.contains("Existing Comments"));
        assert!(prompt.contains("## Replying To\n\n**Carol**"));
        assert!(prompt.ends_with("Write a reply to the comment above from Carol."));
    }

    #[test]
    fn test_long_content_is_truncated_with_marker() {
        let body = "a".repeat(CONTENT_CHAR_LIMIT + 50);
        let cut = truncate_chars(&body, CONTENT_CHAR_LIMIT);
        assert_eq!(cut.chars().count(), CONTENT_CHAR_LIMIT + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_abridge_caps_at_limit() {
        let text = "word ".repeat(60);
        let short = abridge(&text, EXCERPT_CHAR_LIMIT);
        assert!(short.chars().count() <= EXCERPT_CHAR_LIMIT);
        assert!(short.ends_with("..."));
        assert_eq!(abridge("  brief  ", EXCERPT_CHAR_LIMIT), "brief");
    }

    #[test]
    fn test_strip_markup_drops_scripts_and_tags() {
        let html = "<p>Hello<br/>world</p><script>alert('x')</script>\
                    <style>p{}</style>&lt;ok&gt;";
        assert_eq!(strip_markup(html), "Hello\nworld\n<ok>");
    }

    #[test]
    fn test_strip_markup_decodes_entities_and_keeps_bare_angle_brackets() {
        let html = "<p>Caf&eacute; &mdash; &#8220;quoted&#8221; &hellip;</p>\
                    <p>if x < y and z > w then</p>";
        assert_eq!(
            strip_markup(html),
            "Caf\u{e9} \u{2014} \u{201c}quoted\u{201d} \u{2026}\nif x < y and z > w then"
        );
    }

    #[test]
    fn test_strip_markup_collapses_blank_lines() {
        let html = "<div>  one  </div>\n\n\n<div><em>two</em>   words</div>";
        assert_eq!(strip_markup(html), "one\n\ntwo words", "One blank line survives");
    }

    #[test]
    fn test_human_time_diff() {
        let now = Utc::now();
        assert_eq!(human_time_diff(now, now), "just now");
        assert_eq!(human_time_diff(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(human_time_diff(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(human_time_diff(now - Duration::days(10), now), "1 week ago");
        assert_eq!(human_time_diff(now - Duration::days(800), now), "2 years ago");
        assert_eq!(human_time_diff(now + Duration::days(1), now), "just now");
    }
}
