use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use validator::Validate;

use agora_utils::checks::check_comment_body;
use agora_utils::constants::MAX_COMMENT_LENGTH;
use agora_utils::errors::{AppError, IntegrityError};

use crate::post::Post;
use crate::user::User;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: i64,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub creator_id: i64,
    pub creator_name: String,
    pub body: String,
    pub create_timestamp: chrono::DateTime<chrono::Utc>,
    pub edit_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentWithChildren {
    pub comment: Comment,
    pub child_comments: Vec<CommentWithChildren>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Validate, Serialize, Deserialize)]
pub struct CommentDraft {
    #[validate(length(min = 1, max = MAX_COMMENT_LENGTH))]
    pub body: String,
    pub parent_id: Option<i64>,
}

/// Comment whose child comments are being collected.
struct PendingComment {
    comment: Comment,
    remaining_children: std::vec::IntoIter<Comment>,
    child_comments: Vec<CommentWithChildren>,
}

impl Comment {
    pub fn is_edited(&self) -> bool {
        self.edit_timestamp.is_some()
    }

    pub fn edit_body(
        &mut self,
        body: &str,
        editor: &User,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), AppError> {
        check_can_edit_comment(editor, self)?;
        check_comment_body(body)?;
        self.body = String::from(body.trim());
        self.edit_timestamp = Some(timestamp);
        Ok(())
    }
}

impl PendingComment {
    fn new(comment: Comment, child_comments_map: &mut HashMap<Option<i64>, Vec<Comment>>) -> Self {
        let remaining_children = child_comments_map
            .remove(&Some(comment.comment_id))
            .unwrap_or_default()
            .into_iter();
        Self {
            comment,
            remaining_children,
            child_comments: Vec::new(),
        }
    }
}

impl CommentDraft {
    pub fn new(body: &str, parent_id: Option<i64>) -> Self {
        Self {
            body: String::from(body),
            parent_id,
        }
    }

    /// Validates the draft and creates the comment attributed to `author`. When the draft replies to a comment,
    /// `parent` must be that comment and belong to `post`.
    pub fn into_comment(
        self,
        comment_id: i64,
        post: &Post,
        parent: Option<&Comment>,
        author: &User,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Result<Comment, AppError> {
        self.validate()?;
        check_comment_body(&self.body)?;
        author.check_is_active()?;

        match (self.parent_id, parent) {
            (None, _) => (),
            (Some(parent_id), Some(parent)) if parent.comment_id == parent_id && parent.post_id == post.post_id => (),
            (Some(parent_id), _) => return Err(AppError::from(IntegrityError::ForeignParent {
                comment_id,
                parent_id,
                post_id: post.post_id,
            })),
        }

        Ok(Comment {
            comment_id,
            post_id: post.post_id,
            parent_id: self.parent_id,
            creator_id: author.user_id,
            creator_name: author.username.clone(),
            body: String::from(self.body.trim()),
            create_timestamp: timestamp,
            edit_timestamp: None,
        })
    }
}

/// Comments can be edited by their author and by superusers.
pub fn check_can_edit_comment(user: &User, comment: &Comment) -> Result<(), AppError> {
    match user.user_id == comment.creator_id || user.is_superuser {
        true => Ok(()),
        false => Err(AppError::InsufficientPrivileges),
    }
}

/// Rebuilds the reply tree of post `post_id` from its comments, ordered by ascending creation time.
///
/// Children keep the relative order of `comment_vec`. Comments without parent are the roots of the returned forest.
/// Comments from another post, replies to comments absent from `comment_vec`, duplicated comments and reply cycles
/// are reported as [`IntegrityError`].
pub fn build_comment_tree(
    post_id: i64,
    comment_vec: Vec<Comment>,
) -> Result<Vec<CommentWithChildren>, AppError> {
    let num_comments = comment_vec.len();
    let mut comment_id_set = HashSet::with_capacity(num_comments);
    for comment in &comment_vec {
        if comment.post_id != post_id {
            return Err(integrity_error(IntegrityError::ForeignComment {
                comment_id: comment.comment_id,
                comment_post_id: comment.post_id,
                post_id,
            }))
        }
        if !comment_id_set.insert(comment.comment_id) {
            return Err(integrity_error(IntegrityError::DuplicateComment { comment_id: comment.comment_id }))
        }
    }

    let mut child_comments_map = HashMap::<Option<i64>, Vec<Comment>>::new();
    for comment in comment_vec {
        if let Some(parent_id) = comment.parent_id {
            if !comment_id_set.contains(&parent_id) {
                return Err(integrity_error(IntegrityError::ForeignParent {
                    comment_id: comment.comment_id,
                    parent_id,
                    post_id,
                }))
            }
        }
        child_comments_map.entry(comment.parent_id).or_default().push(comment);
    }

    let root_comment_vec = child_comments_map.remove(&None).unwrap_or_default();
    let mut comment_tree = Vec::with_capacity(root_comment_vec.len());
    let mut num_processed = 0;
    let mut stack = Vec::<PendingComment>::new();
    for root_comment in root_comment_vec {
        stack.push(PendingComment::new(root_comment, &mut child_comments_map));
        loop {
            let Some(pending) = stack.last_mut() else {
                break
            };
            if let Some(child_comment) = pending.remaining_children.next() {
                stack.push(PendingComment::new(child_comment, &mut child_comments_map));
            } else if let Some(pending) = stack.pop() {
                num_processed += 1;
                let node = CommentWithChildren {
                    comment: pending.comment,
                    child_comments: pending.child_comments,
                };
                match stack.last_mut() {
                    Some(parent) => parent.child_comments.push(node),
                    None => comment_tree.push(node),
                }
            }
        }
    }

    if num_processed < num_comments {
        // every remaining comment is unreachable from a root, hence part of or below a cycle
        let comment_id = child_comments_map
            .values()
            .flatten()
            .map(|comment| comment.comment_id)
            .min()
            .unwrap_or_default();
        return Err(integrity_error(IntegrityError::CommentCycle { comment_id }))
    }

    Ok(comment_tree)
}

fn integrity_error(error: IntegrityError) -> AppError {
    log::error!("Cannot build comment tree: {error}");
    AppError::IntegrityError(error)
}

/// Returns the comments of `comment_tree` in pre-order, each comment followed by its replies.
pub fn flatten_comment_tree(comment_tree: &[CommentWithChildren]) -> Vec<&Comment> {
    flatten_comment_tree_with_depth(comment_tree)
        .into_iter()
        .map(|(_, comment)| comment)
        .collect()
}

/// Returns the comments of `comment_tree` in pre-order with their depth, root comments having depth 0.
pub fn flatten_comment_tree_with_depth(comment_tree: &[CommentWithChildren]) -> Vec<(usize, &Comment)> {
    let mut comment_vec = Vec::new();
    let mut stack: Vec<(usize, &CommentWithChildren)> = comment_tree.iter().rev().map(|node| (0, node)).collect();
    while let Some((depth, node)) = stack.pop() {
        comment_vec.push((depth, &node.comment));
        stack.extend(node.child_comments.iter().rev().map(|child| (depth + 1, child)));
    }
    comment_vec
}

/// Removes comment `deleted_comment_id` from `comment_vec`. Its replies are kept and become root comments.
pub fn detach_replies(
    comment_vec: &mut Vec<Comment>,
    deleted_comment_id: i64,
) -> Option<Comment> {
    let index = comment_vec.iter().position(|comment| comment.comment_id == deleted_comment_id)?;
    let deleted_comment = comment_vec.remove(index);
    for comment in comment_vec.iter_mut().filter(|comment| comment.parent_id == Some(deleted_comment_id)) {
        log::debug!("Comment {} becomes a root comment after deletion of comment {deleted_comment_id}", comment.comment_id);
        comment.parent_id = None;
    }
    Some(deleted_comment)
}
