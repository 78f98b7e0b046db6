use std::env;
use std::sync::Arc;

use anyhow::Context;
use feed_cache::{avatar_setting, FeedConfig, Post, PostCacheManager, StoredProfile};
use kv_store::StorageConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn usage() {
    eprintln!("Usage:");
    eprintln!("  feed-cli list");
    eprintln!("  feed-cli post <text> [image-uri]");
    eprintln!("  feed-cli like <post-id>");
    eprintln!("  feed-cli delete <post-id>");
    eprintln!("  feed-cli refresh");
    eprintln!("  feed-cli avatar <uri-or-asset>");
}

fn print_feed(posts: &[Post]) {
    if posts.is_empty() {
        println!("(no posts)");
        return;
    }
    for post in posts {
        let when = post
            .created_at
            .map(|ts| ts.format("%d.%m.%Y %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let avatar = post
            .avatar
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {} [{}]  likes={} comments={}",
            post.id, when, post.author, avatar, post.likes, post.comments
        );
        if !post.content.is_empty() {
            println!("    {}", post.content);
        }
        if let Some(image) = &post.image {
            println!("    image: {}", image);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed_cache=info,kv_store=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let storage = StorageConfig::from_env()
        .context("invalid storage configuration")?
        .open();
    let profile = StoredProfile::new(storage.clone());
    profile.ensure().await;

    let manager = PostCacheManager::new(
        storage,
        Arc::new(profile.clone()),
        FeedConfig::from_env(),
    );
    manager.initialize().await;
    manager.settle().await;

    let cmd = args[1].as_str();
    match cmd {
        "list" if args.len() == 2 => {}
        "post" if args.len() == 3 || args.len() == 4 => {
            let post = manager.create_post(&args[2], args.get(3).cloned()).await?;
            println!("Created {}", post.id);
        }
        "like" if args.len() == 3 => {
            if !manager.like_post(&args[2]).await {
                eprintln!("No post with id {}", args[2]);
            }
        }
        "delete" if args.len() == 3 => {
            if manager.delete_post(&args[2]).await {
                println!("Deleted {}", args[2]);
            } else {
                eprintln!("No post with id {}", args[2]);
            }
        }
        "refresh" if args.len() == 2 => {
            manager.refresh().await;
        }
        "avatar" if args.len() == 3 => {
            let avatar = avatar_setting(&args[2]).context("avatar must not be empty")?;
            if !profile.set_avatar(avatar.clone()).await {
                anyhow::bail!("failed to store avatar");
            }
            let posts = manager.reconcile_avatars(avatar).await;
            println!("Avatar updated, {} posts cached", posts.len());
        }
        _ => {
            usage();
            std::process::exit(1);
        }
    }

    print_feed(&manager.posts());
    manager.shutdown();
    Ok(())
}
