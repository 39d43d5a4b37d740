use serde::{Deserialize, Serialize};

use agora_utils::checks::is_usable_email;
use agora_utils::errors::AppError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub notify_new_posts: bool,
    pub notify_replies_to_comments: bool,
    pub notify_replies_to_posts: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub notification_preferences: NotificationPreferences,
}

/// Identity under which a request acts. A superuser may impersonate another user, in which case content
/// is attributed to the impersonated user until the impersonation is explicitly stopped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingIdentity {
    user: User,
    impersonated: Option<User>,
}

impl User {
    pub fn has_usable_email(&self) -> bool {
        is_usable_email(&self.email)
    }

    pub fn check_is_superuser(&self) -> Result<(), AppError> {
        match self.is_superuser {
            true => Ok(()),
            false => Err(AppError::InsufficientPrivileges),
        }
    }

    pub fn check_is_active(&self) -> Result<(), AppError> {
        match self.is_active {
            true => Ok(()),
            false => Err(AppError::NotAuthenticated),
        }
    }
}

impl ActingIdentity {
    pub fn new(user: User) -> Self {
        Self {
            user,
            impersonated: None,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn impersonated(&self) -> Option<&User> {
        self.impersonated.as_ref()
    }

    /// Attribute subsequent content to `target`. Only superusers can impersonate, and only active users can be impersonated.
    pub fn start_impersonation(&mut self, target: User) -> Result<(), AppError> {
        self.user.check_is_superuser()?;
        if !target.is_active {
            return Err(AppError::InvalidInput(format!("Cannot impersonate inactive user {}.", target.username)))
        }
        log::info!("User {} starts impersonating user {}", self.user.user_id, target.user_id);
        self.impersonated = Some(target);
        Ok(())
    }

    pub fn stop_impersonation(&mut self) -> Option<User> {
        let previous = self.impersonated.take();
        if let Some(target) = &previous {
            log::info!("User {} stops impersonating user {}", self.user.user_id, target.user_id);
        }
        previous
    }

    /// The user new posts and comments should be attributed to.
    pub fn effective_author(&self) -> &User {
        self.impersonated.as_ref().unwrap_or(&self.user)
    }
}
