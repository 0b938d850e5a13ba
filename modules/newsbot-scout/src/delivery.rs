// Delivery of one processed article to every subscriber.
//
// An article with images is led by a photo whose caption carries as much of
// the body as fits; the rest follows as chunked text messages.

use std::sync::Arc;

use tracing::{info, warn};

use newsbot_common::config::DeliveryConfig;
use newsbot_common::{ChatId, NewsbotError};

use crate::chunker::{chunk_message, read_more_suffix, split_content_by_length, Decorations};
use crate::traits::Messenger;

/// A translated, tagged article ready to send.
#[derive(Debug, Clone)]
pub struct Post {
    pub title: String,
    pub body: String,
    pub link: String,
    pub tags: String,
    /// Lead image, sent as a photo before the text.
    pub image: Option<String>,
}

/// Messages to send to each chat, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub photo: Option<PhotoMessage>,
    pub texts: Vec<String>,
    /// Full body as text, used for a chat whose photo send failed.
    pub fallback_texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoMessage {
    pub url: String,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Deliverer {
    messenger: Arc<dyn Messenger>,
    config: DeliveryConfig,
}

impl Deliverer {
    pub fn new(messenger: Arc<dyn Messenger>, config: DeliveryConfig) -> Self {
        Self { messenger, config }
    }

    /// Lay out a post as an optional photo plus text messages. Budgets apply
    /// to the unescaped text; see [`chunk_message`].
    pub fn plan(&self, post: &Post) -> DeliveryPlan {
        let title_decoration = format!("<b>{}</b>\n\n", escape_html(&post.title));
        let link = escape_attr(&post.link);
        let decorations = Decorations::new(title_decoration.clone(), self.config.continuation_marker.clone())
            .with_final_suffix(read_more_suffix(Some(&link), &self.config.read_more_label, &post.tags));
        let render = |content: &str| -> Vec<String> {
            chunk_message(content, self.config.max_message_length, &decorations)
                .into_iter()
                .map(|part| format!("{title_decoration}{}{}", escape_html(&part.core), part.tail))
                .collect()
        };

        let fallback_texts = render(&post.body);
        let Some(image) = post.image.as_deref() else {
            return DeliveryPlan {
                photo: None,
                texts: fallback_texts.clone(),
                fallback_texts,
            };
        };

        let marker = &self.config.caption_continuation_marker;
        let max_caption = self
            .config
            .max_caption_length
            .saturating_sub(title_decoration.chars().count())
            .saturating_sub(marker.chars().count());

        let (caption, remaining) = if post.body.chars().count() > max_caption {
            let (head, rest) = split_content_by_length(&post.body, max_caption);
            (format!("{title_decoration}{}{marker}", escape_html(&head)), rest)
        } else {
            let mut caption = format!(
                "{title_decoration}{}\n\n<a href=\"{link}\">{}</a>",
                escape_html(&post.body),
                self.config.read_more_label
            );
            if !post.tags.is_empty() {
                caption.push_str("\n\n");
                caption.push_str(&post.tags);
            }
            (caption, String::new())
        };

        DeliveryPlan {
            photo: Some(PhotoMessage {
                url: encode_image_url(image),
                caption,
            }),
            texts: render(&remaining),
            fallback_texts,
        }
    }

    /// Send `post` to every chat. A failing chat does not stop the others.
    pub async fn deliver(&self, chats: &[ChatId], post: &Post) -> DeliveryReport {
        let plan = self.plan(post);
        let mut report = DeliveryReport::default();
        for &chat_id in chats {
            match self.deliver_to(chat_id, &plan).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(chat_id, error = %e, "Delivery to subscriber failed");
                    report.failed += 1;
                }
            }
        }
        info!(
            title = %post.title,
            delivered = report.delivered,
            failed = report.failed,
            "Article delivered"
        );
        report
    }

    async fn deliver_to(&self, chat_id: ChatId, plan: &DeliveryPlan) -> Result<(), NewsbotError> {
        let mut texts = &plan.texts;
        if let Some(photo) = &plan.photo {
            let sent = self
                .messenger
                .send_photo(chat_id, &photo.url, &photo.caption)
                .await;
            tokio::time::sleep(self.config.photo_pause()).await;
            if let Err(e) = sent {
                warn!(chat_id, url = %photo.url, error = %e, "Photo send failed, falling back to text");
                texts = &plan.fallback_texts;
            }
        }
        for text in texts {
            let sent = self.messenger.send_text(chat_id, text).await;
            tokio::time::sleep(self.config.message_pause()).await;
            sent?;
        }
        Ok(())
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Percent-encode characters that are not valid in a URL.
fn encode_image_url(raw: &str) -> String {
    url::Url::parse(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_string())
}
