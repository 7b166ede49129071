use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};
use linkify::{LinkFinder, LinkKind};
use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream, html};

/// Tags that survive sanitizing. Everything else is stripped, keeping its text.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "div", "span", "br", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "code", "pre",
    "strong", "em", "sub", "sup", "table", "thead", "tbody", "tr", "th", "td", "ul", "ol", "li",
    "a", "img", "hr",
];

/// URL schemes allowed in links and image sources.
pub const ALLOWED_PROTOCOLS: &[&str] = &["http", "https", "mailto"];

/// Forced `target` for every rendered link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// Open links in a new browsing context.
    Blank,
}

impl LinkTarget {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "_blank",
        }
    }
}

/// Render trusted-author Markdown to HTML that is safe to embed.
///
/// Bare URLs and email addresses outside code and existing links, raw HTML
/// included, become anchors. Links with a scheme outside [`ALLOWED_PROTOCOLS`] are reduced to
/// their text. The HTML is then cleaned against the tag and attribute
/// allow-lists.
pub fn markdown_to_html(markdown_text: &str, link_target: Option<LinkTarget>) -> String {
    let parser = TextMergeStream::new(Parser::new_ext(markdown_text, Options::ENABLE_TABLES));
    let events = autolink(parser);

    let mut rendered = String::with_capacity(markdown_text.len() * 3 / 2);
    html::push_html(&mut rendered, events.into_iter());

    sanitizer(link_target).clean(&rendered).to_string()
}

fn autolink<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url, LinkKind::Email]);

    let mut out = Vec::new();
    let mut in_code_block = false;
    // One entry per open link; `false` marks a link stripped to its text.
    let mut open_links: Vec<bool> = Vec::new();
    let mut raw = RawHtmlState::default();

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                out.push(Event::Start(Tag::CodeBlock(kind)));
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                out.push(Event::End(TagEnd::CodeBlock));
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let keep = is_allowed_url(&dest_url);
                open_links.push(keep);
                if keep {
                    out.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
            }
            Event::End(TagEnd::Link) => {
                if open_links.pop().unwrap_or(true) {
                    out.push(Event::End(TagEnd::Link));
                }
            }
            Event::InlineHtml(fragment) => {
                out.push(Event::InlineHtml(linkify_html(&finder, &fragment, &mut raw).into()));
            }
            Event::Html(fragment) => {
                out.push(Event::Html(linkify_html(&finder, &fragment, &mut raw).into()));
            }
            Event::Text(text) if !in_code_block && open_links.is_empty() && raw.opaque == 0 => {
                linkify_text(&finder, &text, &mut out);
            }
            other => out.push(other),
        }
    }

    out
}

fn linkify_text<'a>(finder: &LinkFinder, text: &str, out: &mut Vec<Event<'a>>) {
    for span in finder.spans(text) {
        let piece = span.as_str().to_string();
        match span.kind() {
            Some(LinkKind::Url) if is_allowed_url(&piece) => {
                push_link(out, piece.clone(), piece);
            }
            Some(LinkKind::Email) => push_link(out, format!("mailto:{piece}"), piece),
            _ => out.push(Event::Text(CowStr::from(piece))),
        }
    }
}

/// Nesting of author-written HTML elements whose text must not be linked.
#[derive(Default)]
struct RawHtmlState {
    opaque: usize,
    /// A tag opened in an earlier fragment has not been closed by `>` yet.
    in_tag: bool,
}

impl RawHtmlState {
    fn observe_tag(&mut self, tag: &str) {
        let body = tag.trim_start_matches('<');
        let (closing, body) = match body.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };
        let name: String = body
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        if !matches!(name.as_str(), "a" | "code" | "pre" | "script" | "style") {
            return;
        }
        if closing {
            self.opaque = self.opaque.saturating_sub(1);
        } else if !tag.trim_end().ends_with("/>") {
            self.opaque += 1;
        }
    }
}

/// Link bare URLs in the text parts of a raw HTML fragment, leaving tags and
/// the contents of anchors, code and scripts alone.
fn linkify_html(finder: &LinkFinder, fragment: &str, state: &mut RawHtmlState) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;

    if state.in_tag {
        let end = match rest.find('>') {
            Some(i) => {
                state.in_tag = false;
                i + 1
            }
            None => rest.len(),
        };
        out.push_str(&rest[..end]);
        rest = &rest[end..];
    }

    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => {
                let end = match rest.find('>') {
                    Some(i) => i + 1,
                    None => {
                        state.in_tag = true;
                        rest.len()
                    }
                };
                state.observe_tag(&rest[..end]);
                out.push_str(&rest[..end]);
                rest = &rest[end..];
            }
            Some(i) => {
                push_html_text(finder, &rest[..i], state, &mut out);
                rest = &rest[i..];
            }
            None => {
                push_html_text(finder, rest, state, &mut out);
                rest = "";
            }
        }
    }

    out
}

fn push_html_text(finder: &LinkFinder, text: &str, state: &RawHtmlState, out: &mut String) {
    if state.opaque > 0 {
        out.push_str(text);
        return;
    }
    for span in finder.spans(text) {
        let piece = span.as_str();
        let href = match span.kind() {
            Some(LinkKind::Url) if is_allowed_url(piece) => piece.to_string(),
            Some(LinkKind::Email) => format!("mailto:{piece}"),
            _ => {
                out.push_str(piece);
                continue;
            }
        };
        out.push_str(&format!("<a href=\"{}\">{piece}</a>", href.replace('"', "&quot;")));
    }
}

fn push_link<'a>(out: &mut Vec<Event<'a>>, dest_url: String, text: String) {
    out.push(Event::Start(Tag::Link {
        link_type: LinkType::Autolink,
        dest_url: CowStr::from(dest_url),
        title: CowStr::Borrowed(""),
        id: CowStr::Borrowed(""),
    }));
    out.push(Event::Text(CowStr::from(text)));
    out.push(Event::End(TagEnd::Link));
}

/// Relative URLs are allowed; absolute ones need an allow-listed scheme.
fn is_allowed_url(url: &str) -> bool {
    match url_scheme(url) {
        Some(scheme) => ALLOWED_PROTOCOLS.contains(&scheme.as_str()),
        None => true,
    }
}

fn url_scheme(url: &str) -> Option<String> {
    let url = url.trim();
    let colon = url.find(':')?;
    let candidate = &url[..colon];

    let mut chars = candidate.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let scheme_chars = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    (starts_alpha && scheme_chars).then(|| candidate.to_ascii_lowercase())
}

fn sanitizer(link_target: Option<LinkTarget>) -> Builder<'static> {
    let mut anchor_attributes: HashSet<&'static str> = ["href", "title"].into();
    if link_target.is_none() {
        anchor_attributes.insert("target");
    }

    let tag_attributes: HashMap<&'static str, HashSet<&'static str>> = [
        ("a", anchor_attributes),
        ("img", ["src", "alt", "title"].into()),
    ]
    .into();

    let mut builder = Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .generic_attributes(["id"].into())
        .tag_attributes(tag_attributes)
        .url_schemes(ALLOWED_PROTOCOLS.iter().copied().collect())
        .url_relative(UrlRelative::PassThrough)
        .link_rel(None);

    if let Some(target) = link_target {
        builder
            .set_tag_attribute_value("a", "target", target.as_str())
            .link_rel(Some("noopener noreferrer"));
    }

    builder
}
