pub const SITE_URL_ENV: &str = "SITE_URL";
pub const SITE_NAME_ENV: &str = "SITE_NAME";
pub const POST_ROUTE_PREFIX: &str = "/questions";
pub const USER_ROUTE_PREFIX: &str = "/users";
pub const SORT_QUERY_PARAM: &str = "sort";

/// # Returns the path to a post given its slug
///
/// ```
/// use agora_utils::routes::get_post_path;
///
/// assert_eq!(get_post_path("is-love-a-choice"), "/questions/is-love-a-choice/");
/// ```
pub fn get_post_path(
    slug: &str,
) -> String {
    format!("{POST_ROUTE_PREFIX}/{slug}/")
}

/// # Returns the absolute url of a post, `site_url` may end with a slash
///
/// ```
/// use agora_utils::routes::get_post_url;
///
/// assert_eq!(get_post_url("https://forum.example.org/", "why-now"), "https://forum.example.org/questions/why-now/");
/// assert_eq!(get_post_url("https://forum.example.org", "why-now"), "https://forum.example.org/questions/why-now/");
/// ```
pub fn get_post_url(
    site_url: &str,
    slug: &str,
) -> String {
    format!("{}{}", site_url.trim_end_matches('/'), get_post_path(slug))
}

/// # Returns the path to a user's profile
///
/// ```
/// use agora_utils::routes::get_profile_path;
///
/// assert_eq!(get_profile_path("zeno"), "/users/zeno/");
/// ```
pub fn get_profile_path(
    username: &str,
) -> String {
    format!("{USER_ROUTE_PREFIX}/{username}/")
}

/// # Returns the path of the post listing with the given sort query value
///
/// ```
/// use agora_utils::routes::get_listing_path;
///
/// assert_eq!(get_listing_path("new"), "/?sort=new");
/// ```
pub fn get_listing_path(
    sort: &str,
) -> String {
    format!("/?{SORT_QUERY_PARAM}={sort}")
}
