use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

use agora_utils::constants::SECONDS_IN_HOUR;
use agora_utils::errors::AppError;

use crate::post::Post;

/// Weight of a comment relative to an upvote in the hot score.
pub const COMMENT_WEIGHT: f64 = 0.8;
/// Offset added to a post's age, keeps brand-new posts from dominating.
pub const AGE_OFFSET_HOURS: f64 = 2.0;
/// Steepness of the hot score's decay with age.
pub const GRAVITY: f64 = 1.8;

#[derive(Clone, Copy, Debug, Default, Display, EnumString, Eq, Hash, IntoStaticStr, PartialEq, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum PostSortType {
    #[default]
    #[strum(serialize = "hot")]
    Hot,
    #[strum(serialize = "new")]
    New,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedPost {
    pub post: Post,
    pub rank_score: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub post_id: i64,
    pub user_id: i64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Outcome of an upvote request: the first upvote creates the vote, the second one removes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteToggle {
    Created(Vote),
    Deleted(Vote),
}

impl PostSortType {
    /// Parses the sort query parameter of a listing, unknown or missing values select the default sort.
    pub fn from_query(query: Option<&str>) -> PostSortType {
        match query.map(str::parse::<PostSortType>) {
            Some(Ok(sort_type)) => sort_type,
            Some(Err(_)) => {
                log::debug!("Unknown sort type {query:?}, use default.");
                PostSortType::default()
            },
            None => PostSortType::default(),
        }
    }
}

impl RankedPost {
    pub fn new(post: Post, now: chrono::DateTime<chrono::Utc>) -> Self {
        let rank_score = get_rank_score(post.score, post.num_comments, post.create_timestamp, now);
        Self {
            post,
            rank_score,
        }
    }
}

impl VoteToggle {
    pub fn score_delta(&self) -> i32 {
        match self {
            VoteToggle::Created(_) => 1,
            VoteToggle::Deleted(_) => -1,
        }
    }

    pub fn vote(&self) -> &Vote {
        match self {
            VoteToggle::Created(vote) | VoteToggle::Deleted(vote) => vote,
        }
    }
}

/// Computes the gravity-decayed hot score of a post:
///
/// `(score + COMMENT_WEIGHT * num_comments) / (age_hours + AGE_OFFSET_HOURS) ^ GRAVITY`
///
/// Missing aggregates count as zero and posts from the future are considered brand-new.
pub fn get_rank_score(
    score: Option<i32>,
    num_comments: Option<i32>,
    create_timestamp: chrono::DateTime<chrono::Utc>,
    now: chrono::DateTime<chrono::Utc>,
) -> f64 {
    let age_seconds = now.signed_duration_since(create_timestamp).num_milliseconds() as f64 / 1000.0;
    let age_hours = f64::max(age_seconds / SECONDS_IN_HOUR as f64, 0.0);
    let engagement = score.unwrap_or(0) as f64 + COMMENT_WEIGHT * num_comments.unwrap_or(0) as f64;
    engagement / f64::powf(age_hours + AGE_OFFSET_HOURS, GRAVITY)
}

/// Orders `post_vec` for a listing. Pinned posts always come first, then:
/// - [`PostSortType::New`]: newest first, ties broken by score
/// - [`PostSortType::Hot`]: highest rank score first, ties broken by score then newest
///
/// `now` is the evaluation time of the rank scores.
pub fn sort_posts(
    post_vec: Vec<Post>,
    sort_type: PostSortType,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<RankedPost> {
    let mut ranked_post_vec: Vec<RankedPost> = post_vec
        .into_iter()
        .map(|post| RankedPost::new(post, now))
        .collect();
    ranked_post_vec.sort_by(|l, r| compare_ranked_posts(l, r, sort_type));
    ranked_post_vec
}

fn compare_ranked_posts(l: &RankedPost, r: &RankedPost, sort_type: PostSortType) -> Ordering {
    r.post.is_pinned.cmp(&l.post.is_pinned).then_with(|| match sort_type {
        PostSortType::New => r.post.create_timestamp.cmp(&l.post.create_timestamp)
            .then_with(|| r.post.score().cmp(&l.post.score())),
        PostSortType::Hot => r.rank_score.total_cmp(&l.rank_score)
            .then_with(|| r.post.score().cmp(&l.post.score()))
            .then_with(|| r.post.create_timestamp.cmp(&l.post.create_timestamp)),
    })
}

/// Toggles the upvote of `user_id` on `post_id` given the user's `existing_vote` on this post.
pub fn toggle_vote(
    existing_vote: Option<Vote>,
    post_id: i64,
    user_id: i64,
    timestamp: chrono::DateTime<chrono::Utc>,
) -> Result<VoteToggle, AppError> {
    match existing_vote {
        Some(vote) if vote.post_id == post_id && vote.user_id == user_id => {
            log::debug!("Delete vote of user {user_id} on post {post_id}");
            Ok(VoteToggle::Deleted(vote))
        },
        Some(vote) => Err(AppError::InvalidInput(format!(
            "Vote of user {} on post {} cannot be toggled for user {user_id} on post {post_id}.",
            vote.user_id,
            vote.post_id,
        ))),
        None => {
            log::debug!("Create vote of user {user_id} on post {post_id}");
            Ok(VoteToggle::Created(Vote { post_id, user_id, timestamp }))
        },
    }
}

/// Counts the distinct users who upvoted `post_id`.
pub fn count_votes(vote_vec: &[Vote], post_id: i64) -> i32 {
    let voter_set: HashSet<i64> = vote_vec
        .iter()
        .filter(|vote| vote.post_id == post_id)
        .map(|vote| vote.user_id)
        .collect();
    voter_set.len() as i32
}
