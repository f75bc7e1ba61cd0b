use leptos::prelude::*;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::fmt::Write;

/// Renders a bot reply. Replies come from an external workflow, so raw HTML in
/// them is shown as text rather than injected.
#[component]
pub fn MarkdownRenderer(
    #[prop(into)] content: String,
    #[prop(optional)] class: &'static str,
) -> impl IntoView {
    let rendered_html = markdown_to_html(&content);

    view! {
        <div
            class=format!("markdown-content {} min-w-0 max-w-full overflow-hidden", class)
            inner_html=rendered_html
        ></div>
    }
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    let mut in_code_block = false;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                let _ = write!(
                    html_output,
                    r#"<pre class="bg-gray-100 rounded-lg p-3 my-3 overflow-x-auto text-left"><code class="language-{} text-sm font-mono whitespace-pre">"#,
                    html_escape(&lang)
                );
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                html_output.push_str("</code></pre>");
            }
            Event::Start(Tag::Paragraph) => {
                html_output.push_str(r#"<p class="mb-3 last:mb-0 leading-relaxed">"#);
            }
            Event::End(TagEnd::Paragraph) => {
                html_output.push_str("</p>");
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let size_class = match level {
                    HeadingLevel::H1 => "text-xl font-bold mb-3 mt-4",
                    HeadingLevel::H2 => "text-lg font-semibold mb-2 mt-3",
                    _ => "text-base font-semibold mb-2 mt-2",
                };
                let _ = write!(html_output, r#"<h{} class="{}">"#, level as u8, size_class);
            }
            Event::End(TagEnd::Heading(level)) => {
                let _ = write!(html_output, "</h{}>", level as u8);
            }
            Event::Start(Tag::Strong) => html_output.push_str(r#"<strong class="font-semibold">"#),
            Event::End(TagEnd::Strong) => html_output.push_str("</strong>"),
            Event::Start(Tag::Emphasis) => html_output.push_str("<em>"),
            Event::End(TagEnd::Emphasis) => html_output.push_str("</em>"),
            Event::Start(Tag::Strikethrough) => html_output.push_str("<del>"),
            Event::End(TagEnd::Strikethrough) => html_output.push_str("</del>"),
            Event::Start(Tag::Link { dest_url, title, .. }) => {
                let _ = write!(
                    html_output,
                    r#"<a href="{}" title="{}" class="text-red-600 hover:text-red-700 underline" target="_blank" rel="noopener noreferrer">"#,
                    html_escape(safe_url(&dest_url)),
                    html_escape(&title)
                );
            }
            Event::End(TagEnd::Link) => html_output.push_str("</a>"),
            Event::Start(Tag::List(None)) => {
                html_output.push_str(r#"<ul class="list-disc ml-5 mb-3 space-y-1">"#);
            }
            Event::Start(Tag::List(Some(start))) => {
                let _ = write!(
                    html_output,
                    r#"<ol start="{start}" class="list-decimal ml-5 mb-3 space-y-1">"#
                );
            }
            Event::End(TagEnd::List(false)) => html_output.push_str("</ul>"),
            Event::End(TagEnd::List(true)) => html_output.push_str("</ol>"),
            Event::Start(Tag::Item) => html_output.push_str("<li>"),
            Event::End(TagEnd::Item) => html_output.push_str("</li>"),
            Event::Start(Tag::BlockQuote(_)) => {
                html_output.push_str(r#"<blockquote class="border-l-4 border-red-200 pl-3 my-3 italic text-gray-700">"#);
            }
            Event::End(TagEnd::BlockQuote(_)) => html_output.push_str("</blockquote>"),
            Event::Start(Tag::Table(_)) => {
                html_output.push_str(r#"<div class="overflow-x-auto my-3"><table class="min-w-full border border-gray-200">"#);
            }
            Event::End(TagEnd::Table) => html_output.push_str("</table></div>"),
            Event::Start(Tag::TableHead) => html_output.push_str(r#"<thead class="bg-gray-100">"#),
            Event::End(TagEnd::TableHead) => html_output.push_str("</thead>"),
            Event::Start(Tag::TableRow) => html_output.push_str("<tr>"),
            Event::End(TagEnd::TableRow) => html_output.push_str("</tr>"),
            Event::Start(Tag::TableCell) => {
                html_output.push_str(r#"<td class="border border-gray-200 px-3 py-1.5">"#);
            }
            Event::End(TagEnd::TableCell) => html_output.push_str("</td>"),
            Event::TaskListMarker(checked) => {
                html_output.push_str(if checked { "☑ " } else { "☐ " });
            }
            Event::Code(text) => {
                let _ = write!(
                    html_output,
                    r#"<code class="bg-gray-100 px-1.5 py-0.5 rounded text-sm font-mono">{}</code>"#,
                    html_escape(&text)
                );
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                html_output.push_str(&html_escape(&text));
            }
            // replies are written for a pre-wrap bubble, keep their line breaks
            Event::SoftBreak | Event::HardBreak => {
                html_output.push_str(if in_code_block { "\n" } else { "<br>" });
            }
            Event::Rule => html_output.push_str(r#"<hr class="my-3 border-gray-200">"#),
            _ => {}
        }
    }

    html_output
}

fn safe_url(url: &str) -> &str {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("data:") || lower.starts_with("vbscript:") {
        "#"
    } else {
        url
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let html = markdown_to_html("**⚠️ N8N Workflow Not Activated**\n\nYour workflow needs to be *activated*.");
        assert!(html.contains("<strong"));
        assert!(html.contains("<em>"));
        assert!(html.contains("<p"));
    }

    #[test]
    fn test_code_blocks() {
        let html = markdown_to_html("```json\n{\n  \"chatInput\": \"Hello\"\n}\n```");
        assert!(html.contains("language-json"));
        assert!(html.contains("  &quot;chatInput&quot;"));
    }

    #[test]
    fn test_line_breaks_are_kept() {
        let html = markdown_to_html("1. Open N8N\nthen check executions");
        assert!(html.contains("<br>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = markdown_to_html("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_javascript_links_are_neutralized() {
        let html = markdown_to_html("[click](javascript:alert(1))");
        assert!(html.contains(r##"href="#""##));
    }

    #[test]
    fn test_ordered_list_keeps_start() {
        let html = markdown_to_html("3. third\n4. fourth");
        assert!(html.contains(r#"<ol start="3""#));
    }
}
