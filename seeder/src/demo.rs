use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use agora_core::comment::{Comment, CommentDraft};
use agora_core::post::{Post, PostDraft};
use agora_core::ranking::{count_votes, toggle_vote, Vote, VoteToggle};
use agora_core::user::{ActingIdentity, NotificationPreferences, User};
use agora_utils::checks::check_username;
use agora_utils::errors::AppError;

const USERNAME_ARRAY: [&str; 6] = ["ada", "boethius", "cleanthes", "diotima", "epictetus", "hildegard"];
const POST_TITLE_ARRAY: [&str; 5] = [
    "Can a machine be curious?",
    "Is mathematics discovered or invented?",
    "What do we owe to strangers?",
    "Does the ship of Theseus sail on?",
    "Why is there something rather than nothing?",
];
const REPLY_ARRAY: [&str; 6] = [
    "I think the question assumes what it wants to prove.",
    "Could you say more about what you mean by that?",
    "There is an old argument against this, but I never found it convincing.",
    "This reminds me of a conversation I had last winter.",
    "I disagree, although I can't yet say exactly why.",
    "Good point. What would change your mind?",
];
const MAX_POST_AGE_MINUTES: i64 = 72 * 60;
const MAX_COMMENTS_PER_POST: usize = 8;

/// In-memory forum content used to exercise listing, threads and notifications.
#[derive(Clone, Debug, PartialEq)]
pub struct DemoForum {
    pub user_vec: Vec<User>,
    pub post_vec: Vec<Post>,
    pub comment_vec: Vec<Comment>,
    pub vote_vec: Vec<Vote>,
}

impl DemoForum {
    pub fn get_user(&self, user_id: i64) -> Result<&User, AppError> {
        self.user_vec.iter().find(|user| user.user_id == user_id).ok_or(AppError::NotFound)
    }

    /// Returns the comments of `post_id` ordered by ascending creation time.
    pub fn get_post_comments(&self, post_id: i64) -> Vec<Comment> {
        let mut comment_vec: Vec<Comment> = self.comment_vec
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comment_vec.sort_by_key(|comment| (comment.create_timestamp, comment.comment_id));
        comment_vec
    }
}

/// Builds the same forum for the same `seed` and `now`. The first user is a superuser.
pub fn build_demo_forum(seed: u64, now: DateTime<Utc>) -> Result<DemoForum, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let user_vec = create_users(&mut rng)?;
    let admin = user_vec.first().cloned().ok_or_else(|| AppError::new("Demo forum has no user."))?;

    let mut post_vec = create_posts(&mut rng, &user_vec, &admin, now)?;
    let vote_vec = create_votes(&mut rng, &user_vec, &mut post_vec, now)?;
    let mut comment_vec = create_comments(&mut rng, &user_vec, &mut post_vec, now)?;

    if let Some(comment) = comment_vec.first_mut() {
        let body = format!("{} (edited by a moderator)", comment.body);
        comment.edit_body(&body, &admin, now)?;
    }
    if let Some(post) = post_vec.last_mut() {
        post.toggle_pin(&admin)?;
    }

    Ok(DemoForum {
        user_vec,
        post_vec,
        comment_vec,
        vote_vec,
    })
}

fn create_users(rng: &mut StdRng) -> Result<Vec<User>, AppError> {
    USERNAME_ARRAY.iter().enumerate().map(|(index, username)| {
        check_username(username)?;
        Ok(User {
            user_id: index as i64 + 1,
            username: String::from(*username),
            email: format!("{username}@agora.local"),
            is_active: true,
            is_superuser: index == 0,
            notification_preferences: NotificationPreferences {
                notify_new_posts: rng.random_bool(0.5),
                notify_replies_to_comments: rng.random_bool(0.8),
                notify_replies_to_posts: rng.random_bool(0.8),
            },
        })
    }).collect()
}

fn create_posts(
    rng: &mut StdRng,
    user_vec: &[User],
    admin: &User,
    now: DateTime<Utc>,
) -> Result<Vec<Post>, AppError> {
    let mut slug_set = HashSet::new();
    let mut post_vec = Vec::with_capacity(POST_TITLE_ARRAY.len());
    let mut identity = ActingIdentity::new(admin.clone());

    for (index, title) in POST_TITLE_ARRAY.iter().enumerate() {
        let author = &user_vec[rng.random_range(0..user_vec.len())];
        // the admin publishes the first post on behalf of its author
        if index == 0 && author.user_id != admin.user_id {
            identity.start_impersonation(author.clone())?;
        }
        let timestamp = now - Duration::minutes(rng.random_range(0..MAX_POST_AGE_MINUTES));
        let post = PostDraft::new(title, "", "")
            .into_post(index as i64 + 1, identity.effective_author(), &slug_set, timestamp)?;
        identity.stop_impersonation();
        slug_set.insert(post.slug.clone());
        post_vec.push(post);
    }
    Ok(post_vec)
}

fn create_votes(
    rng: &mut StdRng,
    user_vec: &[User],
    post_vec: &mut [Post],
    now: DateTime<Utc>,
) -> Result<Vec<Vote>, AppError> {
    let mut vote_vec: Vec<Vote> = Vec::new();
    for post in post_vec.iter_mut() {
        for user in user_vec {
            // an even number of clicks leaves no vote
            for _ in 0..rng.random_range(0..3) {
                let existing_index = vote_vec.iter().position(|vote| vote.post_id == post.post_id && vote.user_id == user.user_id);
                let existing_vote = existing_index.map(|index| vote_vec.remove(index));
                let vote_toggle = toggle_vote(existing_vote, post.post_id, user.user_id, now)?;
                post.add_score_delta(vote_toggle.score_delta());
                if let VoteToggle::Created(vote) = vote_toggle {
                    vote_vec.push(vote);
                }
            }
        }
        log::debug!("Post {} has {} votes", post.post_id, count_votes(&vote_vec, post.post_id));
    }
    Ok(vote_vec)
}

fn create_comments(
    rng: &mut StdRng,
    user_vec: &[User],
    post_vec: &mut [Post],
    now: DateTime<Utc>,
) -> Result<Vec<Comment>, AppError> {
    let mut comment_vec: Vec<Comment> = Vec::new();
    for post in post_vec.iter_mut() {
        let first_post_comment = comment_vec.len();
        let mut last_timestamp = post.create_timestamp;
        for _ in 0..rng.random_range(0..=MAX_COMMENTS_PER_POST) {
            let post_comment_count = comment_vec.len() - first_post_comment;
            let parent = match post_comment_count > 0 && rng.random_bool(0.6) {
                true => Some(comment_vec[first_post_comment + rng.random_range(0..post_comment_count)].clone()),
                false => None,
            };
            let author = &user_vec[rng.random_range(0..user_vec.len())];
            // replies of a post are created in id order, parents always come first
            let max_delay_minutes = now.signed_duration_since(last_timestamp).num_minutes().max(0) / 4;
            let timestamp = last_timestamp + Duration::minutes(rng.random_range(0..=max_delay_minutes));
            last_timestamp = timestamp;

            let body = REPLY_ARRAY[rng.random_range(0..REPLY_ARRAY.len())];
            let comment = CommentDraft::new(body, parent.as_ref().map(|parent| parent.comment_id))
                .into_comment(comment_vec.len() as i64 + 1, post, parent.as_ref(), author, timestamp)?;
            post.increment_comment_count();
            comment_vec.push(comment);
        }
    }
    Ok(comment_vec)
}
