use std::env;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use agora_core::comment::{build_comment_tree, flatten_comment_tree_with_depth};
use agora_core::config::NotificationConfig;
use agora_core::notification::{notify_new_comment, notify_new_post};
use agora_core::ranking::{sort_posts, PostSortType};
use agora_core::transport::Smtp2GoTransport;
use agora_utils::routes::{get_listing_path, get_profile_path};

use crate::demo::build_demo_forum;

mod demo;

pub const SEEDER_RANDOM_SEED_ENV: &str = "SEEDER_RANDOM_SEED";
pub const SEEDER_NOW_ENV: &str = "SEEDER_NOW";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const DEFAULT_RANDOM_SEED: u64 = 42;

fn get_log_level() -> log::Level {
    match env::var(LOG_LEVEL_ENV).map(|level| log::Level::from_str(&level)) {
        Ok(Ok(level)) => level,
        Ok(Err(_)) => {
            eprintln!("Could not parse {LOG_LEVEL_ENV}, use info level.");
            log::Level::Info
        },
        Err(_) => log::Level::Info,
    }
}

fn get_random_seed() -> u64 {
    match env::var(SEEDER_RANDOM_SEED_ENV).map(|seed| seed.parse::<u64>()) {
        Ok(Ok(seed)) => seed,
        Ok(Err(e)) => {
            log::error!("Could not parse {SEEDER_RANDOM_SEED_ENV} as u64: {e}, use default seed.");
            DEFAULT_RANDOM_SEED
        },
        Err(_) => {
            log::debug!("Could not find {SEEDER_RANDOM_SEED_ENV} in env variable, use default seed.");
            DEFAULT_RANDOM_SEED
        },
    }
}

fn get_now() -> anyhow::Result<DateTime<Utc>> {
    match env::var(SEEDER_NOW_ENV) {
        Ok(now) => Ok(DateTime::parse_from_rfc3339(&now)?.with_timezone(&Utc)),
        Err(_) => Ok(Utc::now()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(get_log_level())?;

    let config = NotificationConfig::from_env()?;
    let now = get_now()?;
    let seed = get_random_seed();
    log::info!("Build demo forum with seed {seed} at {now}");
    let forum = build_demo_forum(seed, now)?;

    let sort_type = PostSortType::from_query(env::args().nth(1).as_deref());
    let ranked_post_vec = sort_posts(forum.post_vec.clone(), sort_type, now);

    println!("{} ({sort_type})", get_listing_path(&sort_type.to_string()));
    for ranked_post in &ranked_post_vec {
        let post = &ranked_post.post;
        println!(
            "{}{:>8.4}  {:>3} votes  {:>2} comments  {} by {}",
            if post.is_pinned { "[pinned] " } else { "" },
            ranked_post.rank_score,
            post.score(),
            post.num_comments(),
            post.title,
            get_profile_path(&post.creator_name),
        );
    }

    let Some(top_post) = ranked_post_vec.first().map(|ranked_post| &ranked_post.post) else {
        log::warn!("Demo forum has no post.");
        return Ok(())
    };

    println!("\n{}", top_post.get_url(&config.site_url));
    match build_comment_tree(top_post.post_id, forum.get_post_comments(top_post.post_id)) {
        Ok(comment_tree) => {
            for (depth, comment) in flatten_comment_tree_with_depth(&comment_tree) {
                println!("{}{}: {}", "  ".repeat(depth), comment.creator_name, comment.body);
            }
        },
        Err(e) => {
            log::error!("Cannot display thread of post {} ({}): {}", top_post.post_id, e.status_code(), e.error_detail());
            println!("{}", e.user_message());
        },
    }

    let transport = Smtp2GoTransport::from_config(&config)?;
    let report = notify_new_post(top_post, &forum.user_vec, &config, &transport).await;
    log::info!("New post notifications for '{}': {report:?}", top_post.title);

    let post_author = forum.get_user(top_post.creator_id)?;
    if let Some(comment) = forum.get_post_comments(top_post.post_id).pop() {
        let parent_comment_author = comment.parent_id
            .and_then(|parent_id| forum.comment_vec.iter().find(|parent| parent.comment_id == parent_id))
            .and_then(|parent| forum.get_user(parent.creator_id).ok());
        let report = notify_new_comment(&comment, parent_comment_author, top_post, post_author, &config, &transport).await;
        log::info!("New comment notifications for comment {}: {report:?}", comment.comment_id);
    }

    Ok(())
}
