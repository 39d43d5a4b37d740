use std::collections::BTreeSet;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

use agora_utils::checks::truncate_chars;
use agora_utils::constants::{MAX_EMAIL_EXCERPT_LENGTH, MAX_SUBJECT_TITLE_LENGTH};

use crate::comment::Comment;
use crate::config::NotificationConfig;
use crate::post::Post;
use crate::transport::EmailTransport;
use crate::user::User;

pub const COMMENT_REPLY_TEXT: &str = "a reply to your comment";
pub const POST_REPLY_TEXT: &str = "a reply to your post";
pub const POST_AND_COMMENT_TEXT: &str = "activity on your post and comment";

#[derive(Clone, Copy, Debug, Display, EnumString, Eq, IntoStaticStr, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum NotificationReason {
    #[strum(serialize = "comment-reply")]
    CommentReply,
    #[strum(serialize = "post-reply")]
    PostReply,
}

pub type ReasonSet = BTreeSet<NotificationReason>;

/// User receiving a reply notification, with every reason they qualified for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub reasons: ReasonSet,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub recipient_address: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

impl Recipient {
    fn new(user: &User, reason: NotificationReason) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            email: String::from(user.email.trim()),
            reasons: ReasonSet::from([reason]),
        }
    }
}

/// Subscribers to be told about `post`, in input order: active users with a usable email who enabled new post
/// notifications and are not the post's author.
pub fn get_new_post_recipients<'a>(post: &Post, subscriber_vec: &'a [User]) -> Vec<&'a User> {
    subscriber_vec
        .iter()
        .filter(|user| {
            user.notification_preferences.notify_new_posts &&
                user.is_active &&
                user.user_id != post.creator_id &&
                user.has_usable_email()
        })
        .collect()
}

/// Users to be told about `comment`: the author of the replied-to comment and the post's author, each one only if
/// they opted in and did not write `comment` themselves. A user qualifying twice gets a single entry with both reasons.
pub fn get_new_comment_recipients(
    comment: &Comment,
    parent_comment_author: Option<&User>,
    post_author: &User,
) -> Vec<Recipient> {
    let mut recipient_vec: Vec<Recipient> = Vec::new();

    let candidate_vec = [
        (parent_comment_author, NotificationReason::CommentReply),
        (Some(post_author), NotificationReason::PostReply),
    ];

    for (candidate, reason) in candidate_vec {
        let Some(user) = candidate else {
            continue
        };
        let has_opted_in = match reason {
            NotificationReason::CommentReply => user.notification_preferences.notify_replies_to_comments,
            NotificationReason::PostReply => user.notification_preferences.notify_replies_to_posts,
        };
        if user.user_id == comment.creator_id || !has_opted_in || !user.has_usable_email() {
            continue
        }
        match recipient_vec.iter_mut().find(|recipient| recipient.user_id == user.user_id) {
            Some(recipient) => {
                recipient.reasons.insert(reason);
            },
            None => recipient_vec.push(Recipient::new(user, reason)),
        }
    }
    recipient_vec
}

/// # Returns the phrase describing why a recipient is notified of a reply
///
/// ```
/// use agora_core::notification::{get_reason_text, NotificationReason, ReasonSet};
///
/// assert_eq!(get_reason_text(&ReasonSet::from([NotificationReason::CommentReply])), "a reply to your comment");
/// assert_eq!(get_reason_text(&ReasonSet::from([NotificationReason::PostReply])), "a reply to your post");
/// assert_eq!(
///     get_reason_text(&ReasonSet::from([NotificationReason::CommentReply, NotificationReason::PostReply])),
///     "activity on your post and comment"
/// );
/// ```
pub fn get_reason_text(reasons: &ReasonSet) -> &'static str {
    let is_comment_reply = reasons.contains(&NotificationReason::CommentReply);
    let is_post_reply = reasons.contains(&NotificationReason::PostReply);
    match (is_comment_reply, is_post_reply) {
        (true, false) => COMMENT_REPLY_TEXT,
        (false, true) => POST_REPLY_TEXT,
        _ => POST_AND_COMMENT_TEXT,
    }
}

pub fn render_new_post_message(post: &Post, recipient: &User, config: &NotificationConfig) -> EmailMessage {
    EmailMessage {
        recipient_address: String::from(recipient.email.trim()),
        subject: format!(
            "New post on {}: {}",
            config.site_name,
            truncate_chars(&post.title, MAX_SUBJECT_TITLE_LENGTH),
        ),
        body: format!(
            "{} published a new post:\n\n{}\n\nRead it here: {}\n",
            post.creator_name,
            post.title,
            post.get_url(&config.site_url),
        ),
    }
}

pub fn render_new_comment_message(
    comment: &Comment,
    post: &Post,
    recipient: &Recipient,
    config: &NotificationConfig,
) -> EmailMessage {
    EmailMessage {
        recipient_address: recipient.email.clone(),
        subject: format!(
            "New reply on {}: {}",
            config.site_name,
            truncate_chars(&post.title, MAX_SUBJECT_TITLE_LENGTH),
        ),
        body: format!(
            "You have {}.\n\n{} wrote:\n{}\n\nRead it here: {}\n",
            get_reason_text(&recipient.reasons),
            comment.creator_name,
            truncate_chars(&comment.body, MAX_EMAIL_EXCERPT_LENGTH),
            post.get_url(&config.site_url),
        ),
    }
}

/// Sends every message concurrently. A failed delivery is logged and counted, it never stops the other ones.
pub async fn dispatch_messages(message_vec: Vec<EmailMessage>, transport: &dyn EmailTransport) -> DispatchReport {
    let send_result_vec = join_all(message_vec.iter().map(|message| async move {
        let is_sent = transport.send(&message.recipient_address, &message.subject, &message.body).await;
        if !is_sent {
            log::error!("Could not deliver notification '{}' to {}", message.subject, message.recipient_address);
        }
        is_sent
    })).await;

    let sent = send_result_vec.iter().filter(|is_sent| **is_sent).count();
    DispatchReport {
        attempted: send_result_vec.len(),
        sent,
        failed: send_result_vec.len() - sent,
    }
}

/// Emails the subscribers of new posts about `post`. Does nothing when delivery is disabled in `config`.
pub async fn notify_new_post(
    post: &Post,
    subscriber_vec: &[User],
    config: &NotificationConfig,
    transport: &dyn EmailTransport,
) -> DispatchReport {
    if !config.is_delivery_enabled() {
        log::debug!("Email notifications disabled, skip new post {}", post.post_id);
        return DispatchReport::default()
    }

    let message_vec: Vec<EmailMessage> = get_new_post_recipients(post, subscriber_vec)
        .into_iter()
        .map(|recipient| render_new_post_message(post, recipient, config))
        .collect();

    let report = dispatch_messages(message_vec, transport).await;
    log::info!("New post {} notifications: {report:?}", post.post_id);
    report
}

/// Emails the author of the replied-to comment and the author of `post` about `comment`. Does nothing when delivery
/// is disabled in `config` or when `comment` is not part of `post`.
pub async fn notify_new_comment(
    comment: &Comment,
    parent_comment_author: Option<&User>,
    post: &Post,
    post_author: &User,
    config: &NotificationConfig,
    transport: &dyn EmailTransport,
) -> DispatchReport {
    if !config.is_delivery_enabled() {
        log::debug!("Email notifications disabled, skip new comment {}", comment.comment_id);
        return DispatchReport::default()
    }
    if comment.post_id != post.post_id || post_author.user_id != post.creator_id {
        log::warn!(
            "Comment {} of post {} does not match post {} of user {}, skip notifications.",
            comment.comment_id,
            comment.post_id,
            post.post_id,
            post_author.user_id,
        );
        return DispatchReport::default()
    }
    let parent_comment_author = match comment.parent_id {
        Some(_) => parent_comment_author,
        None => None,
    };

    let message_vec: Vec<EmailMessage> = get_new_comment_recipients(comment, parent_comment_author, post_author)
        .iter()
        .map(|recipient| render_new_comment_message(comment, post, recipient, config))
        .collect();

    let report = dispatch_messages(message_vec, transport).await;
    log::info!("New comment {} notifications: {report:?}", comment.comment_id);
    report
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;
    use std::sync::Mutex;
    use async_trait::async_trait;
    use indoc::indoc;
    use agora_utils::constants::{COMMENT_REPLY_STR, POST_REPLY_STR};
    use crate::comment::Comment;
    use crate::config::NotificationConfig;
    use crate::notification::*;
    use crate::post::Post;
    use crate::transport::EmailTransport;
    use crate::user::{NotificationPreferences, User};

    const ALL_NOTIFICATIONS: NotificationPreferences = NotificationPreferences {
        notify_new_posts: true,
        notify_replies_to_comments: true,
        notify_replies_to_posts: true,
    };

    #[derive(Default)]
    struct RecordingTransport {
        message_vec: Mutex<Vec<EmailMessage>>,
        failing_address_set: HashSet<String>,
    }

    impl RecordingTransport {
        fn failing_on(address: &str) -> Self {
            Self {
                failing_address_set: HashSet::from([String::from(address)]),
                ..Default::default()
            }
        }

        fn get_messages(&self) -> Vec<EmailMessage> {
            self.message_vec.lock().expect("Lock should not be poisoned.").clone()
        }
    }

    #[async_trait]
    impl EmailTransport for RecordingTransport {
        async fn send(&self, recipient_address: &str, subject: &str, body: &str) -> bool {
            self.message_vec.lock().expect("Lock should not be poisoned.").push(EmailMessage {
                recipient_address: String::from(recipient_address),
                subject: String::from(subject),
                body: String::from(body),
            });
            !self.failing_address_set.contains(recipient_address)
        }
    }

    fn create_user(user_id: i64, username: &str, notification_preferences: NotificationPreferences) -> User {
        User {
            user_id,
            username: String::from(username),
            email: format!("{username}@example.org"),
            is_active: true,
            is_superuser: false,
            notification_preferences,
        }
    }

    fn create_config() -> NotificationConfig {
        NotificationConfig {
            is_enabled: true,
            api_key: String::from("key"),
            site_url: String::from("https://forum.example.org/"),
            site_name: String::from("Stoa"),
            ..Default::default()
        }
    }

    fn create_post(author: &User) -> Post {
        Post {
            post_id: 1,
            title: String::from("Is time real?"),
            slug: String::from("is-time-real"),
            creator_id: author.user_id,
            creator_name: author.username.clone(),
            ..Default::default()
        }
    }

    fn create_comment(comment_id: i64, parent_id: Option<i64>, author: &User, body: &str) -> Comment {
        Comment {
            comment_id,
            post_id: 1,
            parent_id,
            creator_id: author.user_id,
            creator_name: author.username.clone(),
            body: String::from(body),
            ..Default::default()
        }
    }

    #[test]
    fn test_notification_reason_strings() {
        assert_eq!(NotificationReason::CommentReply.to_string(), COMMENT_REPLY_STR);
        assert_eq!(NotificationReason::PostReply.to_string(), POST_REPLY_STR);
        assert_eq!(NotificationReason::from_str(POST_REPLY_STR), Ok(NotificationReason::PostReply));
    }

    #[test]
    fn test_get_new_post_recipients() {
        let author = create_user(1, "author", ALL_NOTIFICATIONS);
        let post = create_post(&author);
        let mut inactive = create_user(3, "inactive", ALL_NOTIFICATIONS);
        inactive.is_active = false;
        let mut no_email = create_user(4, "no_email", ALL_NOTIFICATIONS);
        no_email.email = String::new();
        let subscriber_vec = vec![
            create_user(5, "last", ALL_NOTIFICATIONS),
            author.clone(),
            create_user(2, "opted_out", NotificationPreferences::default()),
            inactive,
            no_email,
            create_user(6, "first", ALL_NOTIFICATIONS),
        ];
        let recipient_id_vec: Vec<i64> = get_new_post_recipients(&post, &subscriber_vec)
            .iter()
            .map(|user| user.user_id)
            .collect();
        assert_eq!(recipient_id_vec, vec![5, 6]);
    }

    #[test]
    fn test_get_new_comment_recipients() {
        let post_author = create_user(1, "post_author", ALL_NOTIFICATIONS);
        let parent_author = create_user(2, "parent_author", ALL_NOTIFICATIONS);
        let commenter = create_user(3, "commenter", ALL_NOTIFICATIONS);

        let comment = create_comment(10, Some(9), &commenter, "reply");
        let recipient_vec = get_new_comment_recipients(&comment, Some(&parent_author), &post_author);
        assert_eq!(recipient_vec.len(), 2);
        assert_eq!(recipient_vec[0].user_id, parent_author.user_id);
        assert_eq!(recipient_vec[0].reasons, ReasonSet::from([NotificationReason::CommentReply]));
        assert_eq!(recipient_vec[1].user_id, post_author.user_id);
        assert_eq!(recipient_vec[1].reasons, ReasonSet::from([NotificationReason::PostReply]));

        // post author replying to a comment only notifies the comment's author
        let comment = create_comment(11, Some(9), &post_author, "reply");
        let recipient_vec = get_new_comment_recipients(&comment, Some(&parent_author), &post_author);
        assert_eq!(recipient_vec.len(), 1);
        assert_eq!(recipient_vec[0].user_id, parent_author.user_id);

        // replying to yourself notifies nobody
        let comment = create_comment(12, Some(9), &post_author, "reply");
        assert!(get_new_comment_recipients(&comment, Some(&post_author), &post_author).is_empty());
    }

    #[test]
    fn test_get_new_comment_recipients_preferences() {
        let mut post_author = create_user(1, "post_author", ALL_NOTIFICATIONS);
        post_author.notification_preferences.notify_replies_to_posts = false;
        let mut parent_author = create_user(2, "parent_author", ALL_NOTIFICATIONS);
        parent_author.email = String::from("not an address");
        let commenter = create_user(3, "commenter", ALL_NOTIFICATIONS);
        let comment = create_comment(10, Some(9), &commenter, "reply");
        assert!(get_new_comment_recipients(&comment, Some(&parent_author), &post_author).is_empty());

        // post author who replies to their own post and is replied to in a comment is notified once, with both reasons
        let post_author = create_user(1, "post_author", ALL_NOTIFICATIONS);
        let recipient_vec = get_new_comment_recipients(&comment, Some(&post_author), &post_author);
        assert_eq!(recipient_vec.len(), 1);
        assert_eq!(
            recipient_vec[0].reasons,
            ReasonSet::from([NotificationReason::CommentReply, NotificationReason::PostReply])
        );
    }

    #[test]
    fn test_render_new_post_message() {
        let author = create_user(1, "author", ALL_NOTIFICATIONS);
        let mut post = create_post(&author);
        let message = render_new_post_message(&post, &create_user(2, "reader", ALL_NOTIFICATIONS), &create_config());
        assert_eq!(message.recipient_address, "reader@example.org");
        assert_eq!(message.subject, "New post on Stoa: Is time real?");
        assert_eq!(
            message.body,
            indoc! {"
                author published a new post:

                Is time real?

                Read it here: https://forum.example.org/questions/is-time-real/
            "}
        );

        post.title = "é".repeat(200);
        let message = render_new_post_message(&post, &create_user(2, "reader", ALL_NOTIFICATIONS), &create_config());
        assert_eq!(message.subject, format!("New post on Stoa: {}", "é".repeat(120)));
    }

    #[test]
    fn test_render_new_comment_message_excerpt() {
        let author = create_user(1, "author", ALL_NOTIFICATIONS);
        let post = create_post(&author);
        let comment = create_comment(10, None, &create_user(3, "commenter", ALL_NOTIFICATIONS), &"a".repeat(1000));
        let recipient = Recipient {
            user_id: author.user_id,
            username: author.username.clone(),
            email: author.email.clone(),
            reasons: ReasonSet::from([NotificationReason::PostReply]),
        };
        let message = render_new_comment_message(&comment, &post, &recipient, &create_config());
        assert_eq!(message.subject, "New reply on Stoa: Is time real?");
        assert_eq!(
            message.body,
            format!(
                "You have a reply to your post.\n\ncommenter wrote:\n{}\n\nRead it here: https://forum.example.org/questions/is-time-real/\n",
                "a".repeat(800),
            )
        );
    }

    #[tokio::test]
    async fn test_notify_new_comment_deduplicates_recipient() {
        let post_author = create_user(1, "socrates", ALL_NOTIFICATIONS);
        let commenter = create_user(2, "plato", ALL_NOTIFICATIONS);
        let post = create_post(&post_author);
        let comment = create_comment(10, Some(9), &commenter, "What is a reply?");
        let transport = RecordingTransport::default();

        let report = notify_new_comment(&comment, Some(&post_author), &post, &post_author, &create_config(), &transport).await;

        assert_eq!(report, DispatchReport { attempted: 1, sent: 1, failed: 0 });
        let message_vec = transport.get_messages();
        assert_eq!(message_vec.len(), 1);
        assert_eq!(message_vec[0].recipient_address, "socrates@example.org");
        assert_eq!(
            message_vec[0].body,
            indoc! {"
                You have activity on your post and comment.

                plato wrote:
                What is a reply?

                Read it here: https://forum.example.org/questions/is-time-real/
            "}
        );
    }

    #[tokio::test]
    async fn test_notify_new_comment_root_comment_ignores_parent_author() {
        let post_author = create_user(1, "socrates", ALL_NOTIFICATIONS);
        let other = create_user(3, "aristotle", ALL_NOTIFICATIONS);
        let commenter = create_user(2, "plato", ALL_NOTIFICATIONS);
        let post = create_post(&post_author);
        let comment = create_comment(10, None, &commenter, "Root comment");
        let transport = RecordingTransport::default();

        let report = notify_new_comment(&comment, Some(&other), &post, &post_author, &create_config(), &transport).await;
        assert_eq!(report.attempted, 1);
        assert_eq!(transport.get_messages()[0].recipient_address, "socrates@example.org");
    }

    #[tokio::test]
    async fn test_notify_new_comment_mismatched_post() {
        let post_author = create_user(1, "socrates", ALL_NOTIFICATIONS);
        let post = create_post(&post_author);
        let mut comment = create_comment(10, None, &create_user(2, "plato", ALL_NOTIFICATIONS), "Elsewhere");
        comment.post_id = 2;
        let transport = RecordingTransport::default();

        let report = notify_new_comment(&comment, None, &post, &post_author, &create_config(), &transport).await;
        assert_eq!(report, DispatchReport::default());
        assert!(transport.get_messages().is_empty());
    }

    #[tokio::test]
    async fn test_notify_new_post_excludes_author() {
        let author = create_user(1, "author", ALL_NOTIFICATIONS);
        let post = create_post(&author);
        let subscriber_vec = vec![author.clone(), create_user(2, "reader", ALL_NOTIFICATIONS)];
        let transport = RecordingTransport::default();

        let report = notify_new_post(&post, &subscriber_vec, &create_config(), &transport).await;

        assert_eq!(report, DispatchReport { attempted: 1, sent: 1, failed: 0 });
        let message_vec = transport.get_messages();
        assert_eq!(message_vec.len(), 1);
        assert_eq!(message_vec[0].recipient_address, "reader@example.org");
    }

    #[tokio::test]
    async fn test_disabled_notifications_send_nothing() {
        let author = create_user(1, "author", ALL_NOTIFICATIONS);
        let reader = create_user(2, "reader", ALL_NOTIFICATIONS);
        let post = create_post(&author);
        let comment = create_comment(10, None, &reader, "Hello");
        let transport = RecordingTransport::default();

        let disabled_config_vec = vec![
            NotificationConfig { is_enabled: false, ..create_config() },
            NotificationConfig { api_key: String::new(), ..create_config() },
        ];
        for config in disabled_config_vec {
            assert_eq!(notify_new_post(&post, &[reader.clone()], &config, &transport).await, DispatchReport::default());
            assert_eq!(notify_new_comment(&comment, None, &post, &author, &config, &transport).await, DispatchReport::default());
        }
        assert!(transport.get_messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_stop_dispatch() {
        let author = create_user(1, "author", ALL_NOTIFICATIONS);
        let post = create_post(&author);
        let subscriber_vec = vec![
            create_user(2, "first", ALL_NOTIFICATIONS),
            create_user(3, "broken", ALL_NOTIFICATIONS),
            create_user(4, "last", ALL_NOTIFICATIONS),
        ];
        let transport = RecordingTransport::failing_on("broken@example.org");

        let report = notify_new_post(&post, &subscriber_vec, &create_config(), &transport).await;

        assert_eq!(report, DispatchReport { attempted: 3, sent: 2, failed: 1 });
        assert_eq!(transport.get_messages().len(), 3);
    }
}
