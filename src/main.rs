use chrono::Utc;
use diarybot::config::Config;
use diarybot::diary::{self, Context};
use diarybot::github::GithubClient;
use diarybot::schedule;
use diarybot::typetalk::TypetalkClient;
use std::env;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    diarybot::logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let github = GithubClient::new(
        config.github_token.clone(),
        env::var("GITHUB_API_URL").unwrap_or_else(|_| "https://api.github.com".to_string()),
    );
    let typetalk = TypetalkClient::new(
        env::var("TYPETALK_URL").unwrap_or_else(|_| "https://typetalk.com".to_string()),
        config.topic_id.clone(),
        config.typetalk_token.clone(),
    );

    let ctx = Context {
        github,
        typetalk,
        config,
        schedule: schedule::program_events(),
    };
    diary::run(&ctx, Utc::now()).await
}
