pub const SECONDS_IN_MINUTE: i64 = 60;
pub const MINUTES_IN_HOUR: i64 = 60;


pub const SECONDS_IN_HOUR: i64 = MINUTES_IN_HOUR*SECONDS_IN_MINUTE;


pub const HOT_STR: &str = "hot";
pub const NEW_STR: &str = "new";
pub const COMMENT_REPLY_STR: &str = "comment-reply";
pub const POST_REPLY_STR: &str = "post-reply";


pub const DEFAULT_SITE_NAME: &str = "Agora";
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SLUG: &str = "question";


pub const MAX_TITLE_LENGTH: u64 = 180;
pub const MAX_SLUG_LENGTH: usize = 200;
pub const MAX_CONTENT_LENGTH: u64 = 20000;
pub const MAX_COMMENT_LENGTH: u64 = 10000;
pub const MAX_LINK_LENGTH: u64 = 500;
pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_SUBJECT_TITLE_LENGTH: usize = 120;
pub const MAX_EMAIL_EXCERPT_LENGTH: usize = 800;
