//! LIST roster paging.
//!
//! A roster is packed into LIST records as `name:` tokens. Each page fills
//! its `username` field first and spills into `body` once the next token no
//! longer fits; a full page is flushed and a fresh one started. The final
//! page carries the [`LIST_END`] sentinel.
//!
//! When the last page has no room left for the sentinel, the sentinel is
//! sent alone on one more page. Every roster therefore ends in a marked
//! page, and a reader that sees an unmarked page knows more are coming.

use crate::types::{LIST_END, MESSAGE_LEN, USERNAME_LEN};
use crate::ChatMessage;

const SEPARATOR: char = ':';

/// Packs `names` into as many LIST records as needed.
///
/// An empty roster still produces one page holding only the sentinel.
pub fn paginate<'a, I>(names: I) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut pages = Vec::new();
    let mut page = PageBuilder::default();

    for name in names {
        let token = format!("{name}{SEPARATOR}");
        if page.push(&token) {
            continue;
        }
        pages.push(page.finish());
        page = PageBuilder::default();
        if !page.push(&token) {
            tracing::warn!(%name, "username does not fit an empty LIST page, skipping");
        }
    }

    if !page.push(LIST_END) {
        pages.push(page.finish());
        page = PageBuilder::default();
        page.push(LIST_END);
    }
    pages.push(page.finish());
    pages
}

/// One decoded LIST page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterPage {
    /// Usernames in page order.
    pub names: Vec<String>,
    /// `true` if the page carried the sentinel, i.e. the roster is complete.
    pub complete: bool,
}

/// Reads the names packed into one LIST record.
///
/// Tokens after the sentinel are ignored.
pub fn parse_page(msg: &ChatMessage) -> RosterPage {
    let mut page = RosterPage::default();
    let username = msg.username.text();
    let body = msg.body.text();

    for token in username.split(SEPARATOR).chain(body.split(SEPARATOR)) {
        if token.is_empty() {
            continue;
        }
        if token == LIST_END {
            page.complete = true;
            break;
        }
        page.names.push(token.to_owned());
    }
    page
}

/// Accumulates tokens for a single page, username field first.
#[derive(Default)]
struct PageBuilder {
    username: String,
    body: String,
    in_body: bool,
}

impl PageBuilder {
    const USERNAME_ROOM: usize = USERNAME_LEN - 1;
    const BODY_ROOM: usize = MESSAGE_LEN - 1;

    /// Appends `token`, moving on to `body` when `username` is full.
    /// Returns `false` when neither field has room.
    fn push(&mut self, token: &str) -> bool {
        if !self.in_body {
            if self.username.len() + token.len() <= Self::USERNAME_ROOM {
                self.username.push_str(token);
                return true;
            }
            self.in_body = true;
        }
        if self.body.len() + token.len() <= Self::BODY_ROOM {
            self.body.push_str(token);
            return true;
        }
        false
    }

    fn finish(self) -> ChatMessage {
        ChatMessage::list_page(&self.username, &self.body)
    }
}
