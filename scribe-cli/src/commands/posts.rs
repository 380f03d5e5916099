use anyhow::{Context, Result};
use scribe_client::PostsClient;
use scribe_types::PostId;

use crate::config::CliConfig;

pub async fn list_posts(config: &CliConfig, json: bool) -> Result<()> {
    let client = PostsClient::new(config.client.clone())?;
    let posts = client.list_posts().await.context("failed to list posts")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }
    if posts.is_empty() {
        println!("No posts yet.");
        return Ok(());
    }
    for post in posts {
        println!(
            "{:<26} {:<10} {}  {}",
            post.id,
            post.status.as_str(),
            post.updated_at.format("%Y-%m-%d %H:%M"),
            post.title
        );
    }
    Ok(())
}

pub async fn show_post(config: &CliConfig, id: &str, json: bool) -> Result<()> {
    let client = PostsClient::new(config.client.clone())?;
    let post = client
        .fetch_post(&PostId::new(id))
        .await
        .with_context(|| format!("failed to fetch post {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&post)?);
        return Ok(());
    }
    println!("{}", post.title);
    println!(
        "{} · updated {}",
        post.status.as_str(),
        post.updated_at.format("%Y-%m-%d %H:%M")
    );
    if !post.plain_text.is_empty() {
        println!();
        println!("{}", post.plain_text);
    }
    Ok(())
}

pub async fn publish_post(config: &CliConfig, id: &str) -> Result<()> {
    let client = PostsClient::new(config.client.clone())?;
    let post = client
        .publish_post(&PostId::new(id))
        .await
        .with_context(|| format!("failed to publish post {id}"))?;
    println!("Published {} ({})", post.id, post.title);
    Ok(())
}
