use std::fmt::Write;

use url::form_urlencoded;

use crate::{Event, Frame, Issue, IssueRef, TrackerConfig};

const COMMENT_HEADER: &str = "This bug was automatically filed from Sentry:";

/// Link placed in the filed bug: the issue page, or the specific event page when
/// the user was looking at a pinned event.
pub fn comment_url(config: &TrackerConfig, issue_ref: &IssueRef) -> String {
    let issue_url = config.issue_page_url(&issue_ref.issue_id);
    match issue_ref.event_id.as_deref() {
        Some(event_id) => format!("{issue_url}events/{event_id}/"),
        None => issue_url,
    }
}

/// Pre-filled bug comment.
///
/// Stack frames are written outermost call first, i.e. in reverse of the order
/// Sentry lists them. The event is only read, so a cached event can be
/// formatted any number of times with the same result.
pub fn format_comment(comment_url: &str, event: Option<&Event>) -> String {
    let mut comment = format!("{COMMENT_HEADER} {comment_url}\n\n");
    let Some(event) = event else {
        return comment;
    };

    let exception = event
        .exception
        .as_ref()
        .and_then(|interface| interface.values.first());
    match exception {
        Some(exception) => {
            let _ = write!(comment, "{}: {}", exception.kind, exception.value);
            if let Some(stacktrace) = &exception.stacktrace {
                for frame in stacktrace.frames.iter().rev() {
                    push_frame(&mut comment, frame);
                }
            }
        }
        None => comment.push_str(&event.message),
    }
    comment
}

fn push_frame(out: &mut String, frame: &Frame) {
    let _ = write!(
        out,
        "\n    at {}({}:{}:{})",
        frame.function.as_deref().unwrap_or("?"),
        frame.location().unwrap_or("?"),
        display_or_unknown(frame.lineno),
        display_or_unknown(frame.colno),
    );
}

fn display_or_unknown(value: Option<u64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// Serialize whiteboard tags as `[key:value]` runs.
pub fn whiteboard_tags<'a>(tags: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    tags.into_iter()
        .map(|(key, value)| format!("[{key}:{value}]"))
        .collect()
}

/// The correlation tag written on filed bugs and searched for later.
pub fn whiteboard_tag(config: &TrackerConfig, issue_id: &str) -> String {
    whiteboard_tags([(config.whiteboard_key.as_str(), issue_id)])
}

/// Bugzilla `enter_bug.cgi` link with every field pre-filled.
///
/// A missing issue leaves `short_desc` empty; a missing event leaves only the
/// comment header. Either way a usable link comes out.
pub fn build_new_bug_url(
    config: &TrackerConfig,
    issue: Option<&Issue>,
    event: Option<&Event>,
    issue_ref: &IssueRef,
) -> String {
    let comment_url = comment_url(config, issue_ref);
    let comment = format_comment(&comment_url, event);
    let whiteboard = whiteboard_tag(config, &issue_ref.issue_id);
    let title = issue.map(|issue| issue.title.as_str()).unwrap_or_default();

    let query = encode_query(&[
        ("short_desc", title),
        ("comment", comment.as_str()),
        ("component", config.component.as_str()),
        ("product", config.product.as_str()),
        ("version", config.version.as_str()),
        ("status_whiteboard", whiteboard.as_str()),
        ("bug_file_loc", comment_url.as_str()),
    ]);
    format!("{}/enter_bug.cgi?{query}", config.bugzilla_base())
}

pub fn bug_url(config: &TrackerConfig, bug_id: u64) -> String {
    format!(
        "{}/show_bug.cgi?{}",
        config.bugzilla_base(),
        encode_query(&[("id", bug_id.to_string().as_str())])
    )
}

pub fn search_url(config: &TrackerConfig, params: &[(&str, &str)]) -> String {
    format!("{}/buglist.cgi?{}", config.bugzilla_base(), encode_query(params))
}

pub(crate) fn encode_query(pairs: &[(&str, &str)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
