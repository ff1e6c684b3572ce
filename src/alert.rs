//! Flash notices for reporting the outcome of form submissions.
//!
//! The app has no session store, so notices are carried across the
//! post-redirect-get cycle as query parameters and rendered as a banner at
//! the top of the target page.

use axum::response::Redirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

/// Whether a notice reports a success or a failure. Controls styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// The submitted operation was applied.
    Success,
    /// The submitted operation was rejected.
    Error,
}

/// The query parameters used to carry a notice through a redirect.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoticeParams {
    /// The message to display.
    pub notice: Option<String>,
    /// How to style the message. Defaults to success when missing.
    pub kind: Option<NoticeKind>,
}

impl NoticeParams {
    /// Render the notice as an alert banner, if one is present.
    pub fn into_alert(self) -> Option<Markup> {
        self.notice
            .map(|message| alert_view(self.kind.unwrap_or(NoticeKind::Success), &message))
    }
}

/// Render an alert banner.
pub fn alert_view(kind: NoticeKind, message: &str) -> Markup {
    let class = match kind {
        NoticeKind::Success => "alert alert-success",
        NoticeKind::Error => "alert alert-error",
    };

    html! {
        div class=(class) role="alert" {
            p { (message) }
        }
    }
}

/// Redirect to `endpoint` with a notice attached as query parameters.
pub fn redirect_with_notice(endpoint: &str, kind: NoticeKind, message: &str) -> Redirect {
    let params = NoticeParams {
        notice: Some(message.to_owned()),
        kind: Some(kind),
    };

    match serde_urlencoded::to_string(&params) {
        Ok(query) => Redirect::to(&format!("{endpoint}?{query}")),
        Err(error) => {
            tracing::error!("could not encode notice query string: {error}");
            Redirect::to(endpoint)
        }
    }
}
