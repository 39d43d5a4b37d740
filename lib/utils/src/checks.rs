use const_format::formatcp;
use url::Url;
use validator::ValidationError;
use crate::constants::{MAX_COMMENT_LENGTH, MAX_TITLE_LENGTH, MAX_USERNAME_LENGTH};
use crate::errors::AppError;

/// # Returns whether the given string `input` is shorter or equal than the given max length and, if not `is_empty_ok` than it's not empty
///
/// ```
/// use agora_utils::checks::{check_string_length};
/// use agora_utils::errors::AppError;
///
/// assert!(check_string_length("hello", "input", 5, false).is_ok());
/// assert_eq!(check_string_length("hello", "input", 4, false), Err(AppError::InvalidInput(String::from("input exceeds the maximum length: 4."))));
/// assert_eq!(check_string_length("", "input", 4, false), Err(AppError::InvalidInput(String::from("input cannot be empty."))));
/// ```
pub fn check_string_length(
    input: &str,
    input_name: &str,
    max_length: usize,
    is_empty_ok: bool,
) -> Result<(), AppError> {
    match (input.chars().count() > max_length, !is_empty_ok && input.is_empty()) {
        (true, _) => Err(AppError::InvalidInput(format!("{input_name} exceeds the maximum length: {max_length}."))),
        (_, true) => Err(AppError::InvalidInput(format!("{input_name} cannot be empty."))),
        (false, false) => Ok(()),
    }
}

/// # Returns whether a post's title is valid.
///
/// An empty title is accepted here, link posts may omit it (see [`check_title_or_link`]).
///
/// ```
/// use agora_utils::checks::{check_post_title};
/// use agora_utils::constants::MAX_TITLE_LENGTH;
///
/// assert!(check_post_title("title").is_ok());
/// assert!(check_post_title("").is_ok());
/// assert!(check_post_title("invalid\ntitle").is_err());
/// assert!(check_post_title("also invalid\rtitle").is_err());
/// assert!(check_post_title(&"a".repeat(MAX_TITLE_LENGTH as usize)).is_ok());
/// assert!(check_post_title(&"a".repeat(MAX_TITLE_LENGTH as usize + 1)).is_err());
/// ```
pub fn check_post_title(title: &str) -> Result<(), ValidationError> {
    if title.chars().count() > MAX_TITLE_LENGTH as usize {
        Err(ValidationError::new("title_too_long").with_message(formatcp!("Post title cannot exceed {MAX_TITLE_LENGTH} characters.").into()))
    } else if title.contains(&['\r', '\n'][..]) {
        Err(ValidationError::new("title_newline").with_message("Post title cannot contain newlines.".into()))
    } else {
        Ok(())
    }
}

/// # Returns whether a post's link is a valid http(s) url. An empty link is valid.
///
/// ```
/// use agora_utils::checks::{check_link};
///
/// assert!(check_link("").is_ok());
/// assert!(check_link("https://example.com/article").is_ok());
/// assert!(check_link("http://example.com").is_ok());
/// assert!(check_link("ftp://example.com").is_err());
/// assert!(check_link("example.com").is_err());
/// ```
pub fn check_link(link: &str) -> Result<(), ValidationError> {
    if link.trim().is_empty() {
        return Ok(())
    }
    match Url::parse(link.trim()) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(_) => Err(ValidationError::new("link_scheme").with_message("Links must use http or https.".into())),
        Err(_) => Err(ValidationError::new("link_invalid").with_message("Enter a valid URL.".into())),
    }
}

/// # Returns whether a post has either a title or a link.
///
/// ```
/// use agora_utils::checks::{check_title_or_link};
///
/// assert!(check_title_or_link("A question", "").is_ok());
/// assert!(check_title_or_link("", "https://example.com").is_ok());
/// assert!(check_title_or_link("  ", " ").is_err());
/// ```
pub fn check_title_or_link(title: &str, link: &str) -> Result<(), ValidationError> {
    match title.trim().is_empty() && link.trim().is_empty() {
        true => Err(ValidationError::new("title_or_link").with_message("Add a question title or include a link.".into())),
        false => Ok(()),
    }
}

/// # Returns whether a comment body is valid: not blank and at most `MAX_COMMENT_LENGTH` characters.
///
/// ```
/// use agora_utils::checks::{check_comment_body};
/// use agora_utils::constants::MAX_COMMENT_LENGTH;
///
/// assert!(check_comment_body("Interesting point.").is_ok());
/// assert!(check_comment_body("   ").is_err());
/// assert!(check_comment_body(&"a".repeat(MAX_COMMENT_LENGTH as usize + 1)).is_err());
/// ```
pub fn check_comment_body(body: &str) -> Result<(), AppError> {
    check_string_length(body.trim(), "Comment", MAX_COMMENT_LENGTH as usize, false)
}

/// # Returns whether a username is valid.
///
/// # Valid usernames contain only ascii alphanumeric characters, '@', '.', '+', '-', '_' and have a maximum length of `MAX_USERNAME_LENGTH`
///
/// ```
/// use agora_utils::checks::{check_username};
/// use agora_utils::constants::MAX_USERNAME_LENGTH;
///
/// assert!(check_username("demo_zeno").is_ok());
/// assert!(check_username("a.b+c@d-e").is_ok());
/// assert!(check_username(" name").is_err());
/// assert!(check_username("name%").is_err());
/// assert!(check_username("").is_err());
/// assert!(check_username(&"a".repeat(MAX_USERNAME_LENGTH)).is_ok());
/// assert!(check_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
/// ```
pub fn check_username(name: &str) -> Result<(), AppError> {
    if !name.chars().all(move |c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')) {
        Err(AppError::InvalidInput(String::from("Username can only contain alphanumeric characters and @/./+/-/_.")))
    } else {
        check_string_length(name, "Username", MAX_USERNAME_LENGTH, false)
    }
}

/// # Returns whether `email` can be used to reach someone.
///
/// ```
/// use agora_utils::checks::{is_usable_email};
///
/// assert!(is_usable_email("reader@example.com"));
/// assert!(!is_usable_email(""));
/// assert!(!is_usable_email("   "));
/// assert!(!is_usable_email("reader"));
/// assert!(!is_usable_email("@example.com"));
/// assert!(!is_usable_email("reader@"));
/// ```
pub fn is_usable_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// # Returns at most the first `max_chars` characters of `input`, never splitting a character.
///
/// ```
/// use agora_utils::checks::{truncate_chars};
///
/// assert_eq!(truncate_chars("hello", 3), "hel");
/// assert_eq!(truncate_chars("hello", 10), "hello");
/// assert_eq!(truncate_chars("élan", 1), "é");
/// ```
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &input[..byte_index],
        None => input,
    }
}
