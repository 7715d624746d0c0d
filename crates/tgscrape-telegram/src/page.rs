//! Parsing of one web preview page

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Node, Selector};
use tgscrape_core::RawPost;

use crate::error::TelegramError;

/// Posts and pagination cursor from one preview page
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPage {
    /// In page order, which is oldest first
    pub posts: Vec<RawPost>,
    /// Cursor for the next (older) page, if any
    pub before: Option<u64>,
    /// Whether the channel header block was present
    pub has_channel_info: bool,
}

/// A message whose date could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("message {post}: {message}")]
pub struct PageError {
    pub post: String,
    pub message: String,
}

/// Compiled selectors for the preview markup
#[derive(Debug)]
pub struct PageParser {
    message: Selector,
    date_link: Selector,
    time: Selector,
    text: Selector,
    more: Selector,
    channel_info: Selector,
}

fn selector(css: &str) -> Result<Selector, TelegramError> {
    Selector::parse(css).map_err(|e| TelegramError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

impl PageParser {
    pub fn new() -> Result<Self, TelegramError> {
        Ok(Self {
            message: selector(".tgme_widget_message[data-post]")?,
            date_link: selector("a.tgme_widget_message_date")?,
            time: selector("time[datetime]")?,
            text: selector(".tgme_widget_message_text.js-message_text")?,
            more: selector("a.tme_messages_more[data-before]")?,
            channel_info: selector(".tgme_channel_info")?,
        })
    }

    pub fn parse(&self, html: &str) -> Result<ChannelPage, PageError> {
        let doc = Html::parse_document(html);
        let has_channel_info = doc.select(&self.channel_info).next().is_some();

        let mut posts = Vec::new();
        for message in doc.select(&self.message) {
            if let Some(post) = self.parse_message(message)? {
                posts.push(post);
            }
        }

        let before = doc
            .select(&self.more)
            .filter_map(|a| a.value().attr("data-before"))
            .find_map(|v| v.parse::<u64>().ok());

        Ok(ChannelPage {
            posts,
            before,
            has_channel_info,
        })
    }

    fn parse_message(&self, message: ElementRef<'_>) -> Result<Option<RawPost>, PageError> {
        let post = message.value().attr("data-post").unwrap_or_default();
        let Some(link) = message.select(&self.date_link).next() else {
            // Service messages carry no date link
            log::debug!("skip {post}: no date link");
            return Ok(None);
        };
        let Some(url) = link.value().attr("href") else {
            log::debug!("skip {post}: date link without href");
            return Ok(None);
        };
        let datetime = link
            .select(&self.time)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .ok_or_else(|| PageError {
                post: post.to_string(),
                message: "missing <time datetime>".to_string(),
            })?;
        let timestamp = DateTime::parse_from_rfc3339(datetime)
            .map_err(|e| PageError {
                post: post.to_string(),
                message: format!("bad datetime '{datetime}': {e}"),
            })?
            .with_timezone(&Utc);

        let content = message
            .select(&self.text)
            .next()
            .map(message_text)
            .unwrap_or_default();

        Ok(Some(RawPost::new(url, timestamp, content)))
    }
}

/// Text content with `<br>` turned into newlines
fn message_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div class="tgme_channel_info"><div class="tgme_channel_info_header_title">Chan</div></div>
<section class="tgme_channel_history js-message_history">
  <div class="tme_messages_more js-messages_more" data-before="10"></div>
  <a class="tme_messages_more js-messages_more" data-before="10" href="/s/chan?before=10"></a>
  <div class="tgme_widget_message service_message" data-post="chan/10">
    <div class="tgme_widget_message_service_text">Channel created</div>
  </div>
  <div class="tgme_widget_message text_not_supported_wrap js-widget_message" data-post="chan/11">
    <div class="tgme_widget_message_reply">
      <div class="tgme_widget_message_text js-message_reply_text">quoted</div>
    </div>
    <div class="tgme_widget_message_text js-message_text" dir="auto">Hello<br/>world &amp; all</div>
    <div class="tgme_widget_message_footer">
      <a class="tgme_widget_message_date" href="https://t.me/chan/11"><time datetime="2024-01-05T10:00:00+00:00" class="time">10:00</time></a>
    </div>
  </div>
  <div class="tgme_widget_message js-widget_message" data-post="chan/12">
    <div class="tgme_widget_message_photo_wrap"></div>
    <a class="tgme_widget_message_date" href="https://t.me/chan/12"><time datetime="2024-01-06T23:30:00+02:00">23:30</time></a>
  </div>
</section>
</body></html>"#;

    #[test]
    fn parses_posts_in_page_order() {
        let page = PageParser::new().unwrap().parse(PAGE).unwrap();
        assert!(page.has_channel_info);
        assert_eq!(page.before, Some(10));
        assert_eq!(page.posts.len(), 2);

        let first = &page.posts[0];
        assert_eq!(first.url, "https://t.me/chan/11");
        assert_eq!(first.content, "Hello\nworld & all");
        assert_eq!(
            first.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn media_only_post_has_empty_content_and_utc_time() {
        let page = PageParser::new().unwrap().parse(PAGE).unwrap();
        let photo = &page.posts[1];
        assert!(photo.content.is_empty());
        assert_eq!(
            photo.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 6, 21, 30, 0).unwrap()
        );
    }

    #[test]
    fn missing_channel_page() {
        let page = PageParser::new()
            .unwrap()
            .parse("<html><body><div class=\"tgme_page\">Telegram</div></body></html>")
            .unwrap();
        assert!(!page.has_channel_info);
        assert!(page.posts.is_empty());
        assert_eq!(page.before, None);
    }

    #[test]
    fn bad_datetime_is_error() {
        let html = r#"<div class="tgme_widget_message" data-post="c/1">
            <a class="tgme_widget_message_date" href="https://t.me/c/1"><time datetime="yesterday"></time></a>
        </div>"#;
        let err = PageParser::new().unwrap().parse(html).unwrap_err();
        assert_eq!(err.post, "c/1");
        assert!(err.message.contains("yesterday"));
    }
}
