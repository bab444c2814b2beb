//! Pure HTML rendering of an [`AnnotationView`].
//!
//! The markup keeps the class names the site's stylesheet targets
//! (`annotation-box`, `comment-list`, `comment-box`, ...). Buttons carry a
//! `data-action` attribute naming the widget operation they trigger and a
//! `data-entry` attribute with the entry's display index.

use std::sync::LazyLock;

use aho_corasick::AhoCorasick;

use crate::panel::{ComposePanel, PanelKey, PanelKind};
use crate::thread::{EntryControls, ThreadEntry};
use crate::view::{AnnotationView, DisplayMode};

static HTML_ESCAPER: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::new(["&", "<", ">", "\"", "'"]).expect("static escape patterns are valid")
});

/// Escape HTML special characters in text and attribute values.
pub fn escape_html(s: &str) -> String {
    HTML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"])
}

/// Render the whole widget for one annotation.
pub fn render_annotation(view: &AnnotationView) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        r#"<div class="annotation-box" data-annotation="{id}">"#,
        id = escape_html(&view.annotation_id)
    ));
    out.push_str(&format!(
        r#"<div class="backend-id" style="display: none">{}</div>"#,
        escape_html(&view.annotation_id)
    ));

    if let Some(notice) = &view.notice {
        out.push_str(&format!(
            r#"<div class="widget-notice notice-{kind}" role="alert">{msg}<button type="button" class="close" data-action="dismiss_notice">&times;</button></div>"#,
            kind = notice.kind.as_str(),
            msg = escape_html(&notice.message)
        ));
    }

    render_submission(&mut out, view);

    if let Some(panel) = view
        .panels
        .iter()
        .find(|p| matches!(p.kind, PanelKind::ChangeAndComment { .. }))
    {
        render_panel(&mut out, panel);
    }

    out.push_str(r#"<ul class="comment-list">"#);
    for entry in view.thread.visible_entries() {
        render_entry(&mut out, view, entry);
    }
    out.push_str("</ul></div>");
    out
}

fn render_submission(out: &mut String, view: &AnnotationView) {
    match &view.display {
        DisplayMode::Viewing => {
            out.push_str(&format!(
                r#"<div class="nl-submission">{}"#,
                escape_html(&view.text)
            ));
            if view.edit_pair_visible {
                out.push_str(
                    r#"<span class="edit-pair"><button type="button" class="btn btn-default btn-sm nl-submission-edit" data-action="open_edit">Edit</button></span>"#,
                );
            }
            out.push_str("</div>");
            if let Some(previous) = &view.previous_text {
                out.push_str(&format!(
                    r#"<div class="previous-submission">{}</div>"#,
                    escape_html(previous)
                ));
            }
        }
        DisplayMode::Editing { draft } => {
            out.push_str(&format!(
                r#"<input type="text" class="form-control nl-submission-edit-input" value="{}">"#,
                escape_html(draft)
            ));
        }
    }
}

fn render_panel(out: &mut String, panel: &ComposePanel) {
    let id = match panel.key {
        PanelKey::Annotation => "edit".to_string(),
        PanelKey::Entry(index) => index.to_string(),
    };
    let target = match panel.kind {
        PanelKind::ChangeAndComment { target } => Some(target.as_str()),
        PanelKind::Rejection => None,
    };
    let (submit, cancel) = match panel.kind {
        PanelKind::Rejection => ("submit_rejection", "cancel_rejection"),
        PanelKind::ChangeAndComment { .. } => ("submit_edit", "cancel_edit"),
    };
    let target_attr = target
        .map(|t| format!(r#" data-target="{t}""#))
        .unwrap_or_default();
    out.push_str(&format!(
        r#"<div class="comment-panel" id="comment-panel-{id}"{target_attr}><textarea class="form-control comment-input vresize" placeholder="{placeholder}"></textarea><button type="button" class="btn btn-primary btn-sm submit-update" data-action="{submit}">Submit</button><button type="button" class="btn btn-default btn-sm cancel-update" data-action="{cancel}">Cancel</button></div>"#,
        placeholder = escape_html(&panel.placeholder),
    ));
}

fn render_entry(out: &mut String, view: &AnnotationView, entry: &ThreadEntry) {
    let index = entry.index;
    out.push_str(&format!(
        r#"<li><div class="comment-box" id="comment-box-{index}"><div class="comment-backend-id" style="display: none">{backend}</div><div class="comment-head"><div class="comment-name {tag}">{proposer}</div><span class="submission-time">{time}</span></div><div class="update-content">{text}</div><div class="comment-content">{comment}</div>"#,
        backend = escape_html(&entry.backend_id),
        tag = entry.tag.as_str(),
        proposer = escape_html(&entry.proposer_id),
        time = escape_html(&entry.submission_time),
        text = escape_html(&entry.text),
        comment = escape_html(&entry.comment),
    ));

    match view.controls(entry) {
        EntryControls::Inert => {}
        EntryControls::Review {
            reject_enabled,
            change_enabled,
        } => {
            out.push_str(&format!(
                r#"<button type="button" class="btn btn-default btn-sm change-update" id="change-update-{index}" data-action="change" data-entry="{index}"{}>Change</button>"#,
                disabled_attr(change_enabled)
            ));
            out.push_str(&format!(
                r#"<button type="button" class="btn btn-warning btn-sm reject-update" id="reject-update-{index}" data-action="reject" data-entry="{index}"{}>Reject</button>"#,
                disabled_attr(reject_enabled)
            ));
            out.push_str(&format!(
                r#"<button type="button" class="btn btn-primary btn-sm accept-update" id="accept-update-{index}" data-action="accept" data-entry="{index}">Accept</button>"#
            ));
        }
        EntryControls::Retract => {
            out.push_str(&format!(
                r#"<button type="button" class="btn btn-warning btn-sm retract-update" id="retract-update-{index}" data-action="retract" data-entry="{index}">Retract</button>"#
            ));
        }
    }

    if let Some(panel) = view.panels.get(PanelKey::Entry(index)) {
        render_panel(out, panel);
    }
    out.push_str("</div></li>");
}

fn disabled_attr(enabled: bool) -> &'static str {
    if enabled {
        ""
    } else {
        " disabled"
    }
}
