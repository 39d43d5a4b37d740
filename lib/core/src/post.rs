use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use validator::{Validate, ValidationError};

use agora_utils::checks::{check_link, check_post_title, check_title_or_link, truncate_chars};
use agora_utils::constants::{DEFAULT_SLUG, MAX_CONTENT_LENGTH, MAX_LINK_LENGTH, MAX_SLUG_LENGTH, MAX_TITLE_LENGTH};
use agora_utils::errors::AppError;
use agora_utils::routes::get_post_url;

use crate::user::User;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: i64,
    pub title: String,
    pub slug: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub creator_id: i64,
    pub creator_name: String,
    pub is_pinned: bool,
    /// Number of upvotes, `None` when the aggregate was not fetched.
    pub score: Option<i32>,
    pub num_comments: Option<i32>,
    pub create_timestamp: chrono::DateTime<chrono::Utc>,
}

/// User input to publish a post. Either a title or a link is required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Validate, Serialize, Deserialize)]
#[validate(schema(function = "check_post_draft"))]
pub struct PostDraft {
    #[validate(custom(function = "check_post_title"))]
    pub title: String,
    #[validate(length(max = MAX_LINK_LENGTH), custom(function = "check_link"))]
    pub link: String,
    #[validate(length(max = MAX_CONTENT_LENGTH))]
    pub body: String,
}

impl Post {
    pub fn score(&self) -> i32 {
        self.score.unwrap_or(0)
    }

    pub fn num_comments(&self) -> i32 {
        self.num_comments.unwrap_or(0)
    }

    pub fn get_url(&self, site_url: &str) -> String {
        get_post_url(site_url, &self.slug)
    }

    /// Pins or unpins the post, returns the new pinned status.
    pub fn toggle_pin(&mut self, user: &User) -> Result<bool, AppError> {
        user.check_is_superuser()?;
        self.is_pinned = !self.is_pinned;
        log::debug!("User {} set pinned status of post {} to {}", user.user_id, self.post_id, self.is_pinned);
        Ok(self.is_pinned)
    }

    pub fn add_score_delta(&mut self, score_delta: i32) {
        self.score = Some(self.score() + score_delta);
    }

    pub fn increment_comment_count(&mut self) {
        self.num_comments = Some(self.num_comments() + 1);
    }
}

impl PostDraft {
    pub fn new(title: &str, link: &str, body: &str) -> Self {
        Self {
            title: String::from(title),
            link: String::from(link),
            body: String::from(body),
        }
    }

    /// Validates the draft and creates the post attributed to `author`, with a slug absent from `existing_slug_set`.
    pub fn into_post(
        self,
        post_id: i64,
        author: &User,
        existing_slug_set: &HashSet<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Result<Post, AppError> {
        self.validate()?;
        author.check_is_active()?;

        let link = non_empty_trimmed(&self.link);
        let title = match self.title.trim() {
            "" => String::from(truncate_chars(link.as_deref().unwrap_or_default(), MAX_TITLE_LENGTH as usize)),
            title => String::from(title),
        };
        let slug = get_unique_slug(&title, existing_slug_set);

        Ok(Post {
            post_id,
            title,
            slug,
            body: non_empty_trimmed(&self.body),
            link,
            creator_id: author.user_id,
            creator_name: author.username.clone(),
            is_pinned: false,
            score: Some(0),
            num_comments: Some(0),
            create_timestamp: timestamp,
        })
    }
}

fn check_post_draft(draft: &PostDraft) -> Result<(), ValidationError> {
    check_title_or_link(&draft.title, &draft.link)
}

fn non_empty_trimmed(input: &str) -> Option<String> {
    Some(input.trim()).filter(|value| !value.is_empty()).map(String::from)
}

/// Converts a title into a url fragment: lowercase ascii alphanumerics and underscores, with runs of spaces and dashes
/// replaced by a single dash. Accented letters lose their accents, other characters are dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut has_pending_separator = false;
    for c in title.nfkd() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if has_pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            has_pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            has_pending_separator = true;
        }
    }
    slug.truncate(MAX_SLUG_LENGTH);
    String::from(slug.trim_matches(|c| c == '-' || c == '_'))
}

/// Returns the slug of `title`, suffixed with the first counter (starting at 2) that makes it absent from `existing_slug_set`.
pub fn get_unique_slug(title: &str, existing_slug_set: &HashSet<String>) -> String {
    let base_slug = match slugify(title) {
        slug if slug.is_empty() => String::from(DEFAULT_SLUG),
        slug => slug,
    };
    if !existing_slug_set.contains(&base_slug) {
        return base_slug
    }
    (2..)
        .map(|counter: u64| format!("{base_slug}-{counter}"))
        .find(|slug| !existing_slug_set.contains(slug))
        .unwrap_or(base_slug)
}
