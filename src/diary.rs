use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;

use crate::config::Config;
use crate::github::{Comment, GithubClient, Issue};
use crate::schedule::Schedule;
use crate::typetalk::TypetalkClient;
use crate::utils::{checkboxes_to_emoji, jst, local_time};

pub struct Context {
    pub github: GithubClient,
    pub typetalk: TypetalkClient,
    pub config: Config,
    pub schedule: Schedule,
}

/// One diary run: recap and close yesterday's issues, then open the next
/// one and announce it.
pub async fn run(ctx: &Context, now: DateTime<Utc>) -> anyhow::Result<()> {
    let Some(countdown) = ctx.schedule.countdown_message(now) else {
        // Past the last event on the calendar. Do nothing.
        tracing::info!("the program is over, nothing to do");
        return Ok(());
    };

    let issues = ctx
        .github
        .open_issues_with_label(&ctx.config.repository, ctx.config.issue_label.as_deref())
        .await
        .context("failed to list open diary issues")?;

    // Issues are recapped independently; one failing leaves the others and
    // the creation step below unaffected. All of them must have settled
    // before the next issue opens.
    join_all(issues.iter().map(|issue| async move {
        if let Err(e) = recap_issue(ctx, issue).await {
            tracing::error!("recap of issue #{} failed: {e:?}", issue.number);
        }
    }))
    .await;

    open_next_issue(ctx, now, &countdown).await;
    Ok(())
}

/// Post the issue's recap to chat, then close it. In dry-run mode the
/// issue stays open.
async fn recap_issue(ctx: &Context, issue: &Issue) -> anyhow::Result<()> {
    tracing::info!("recapping {}", issue.title);
    let comments = ctx
        .github
        .issue_comments(&ctx.config.repository, issue.number)
        .await?;

    let message = recap_message(issue, &comments, &ctx.config.repository.owner);
    ctx.typetalk.post_message(&message).await?;

    if ctx.config.dry_run {
        tracing::info!("dry run, leaving issue #{} open", issue.number);
        return Ok(());
    }
    ctx.github
        .close_issue(&ctx.config.repository, issue.number)
        .await?;
    Ok(())
}

/// The recap posted to chat: title, emoji-converted body, then each comment
/// as `<local-time> [(@author)] <body>`. Comments by the repository owner
/// carry no author annotation.
fn recap_message(issue: &Issue, comments: &[Comment], repo_owner: &str) -> String {
    let comments = comments
        .iter()
        .map(|comment| {
            let user = if comment.user.login != repo_owner {
                format!(" (@{})", comment.user.login)
            } else {
                String::new()
            };
            format!("{}{} {}", local_time(comment.created_at), user, comment.body)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}振り返り\n{}\nコメント:\n{}\n",
        issue.title,
        checkboxes_to_emoji(&issue.body),
        comments
    )
}

/// The next issue is titled with its target calendar date in JST, shifted
/// by the configured day offset.
pub fn next_issue_title(now: DateTime<Utc>, day_offset: i64) -> String {
    let target_day = now.with_timezone(&jst()) + Duration::days(day_offset);
    target_day.format("%Y-%m-%d").to_string()
}

async fn open_next_issue(ctx: &Context, now: DateTime<Utc>, countdown: &str) {
    let title = next_issue_title(now, ctx.config.target_day_offset);
    let body = format!("{}\n{}", countdown, ctx.config.issue_template);

    if ctx.config.dry_run {
        tracing::info!("dry run, not opening {title}");
    } else {
        let labels = ctx.config.issue_label.iter().cloned().collect();
        let assignees = ctx.config.assign_user.iter().cloned().collect();
        match ctx
            .github
            .new_issue(&ctx.config.repository, &title, &body, labels, assignees)
            .await
        {
            Ok(issue) => tracing::info!("opened diary issue #{}", issue.number),
            Err(e) => {
                tracing::error!("failed to open diary issue {title}: {e:?}");
                return;
            }
        }
    }

    let announcement = format!("{title}の目標：\n{}", checkboxes_to_emoji(&body));
    if let Err(e) = ctx.typetalk.post_message(&announcement).await {
        tracing::error!("failed to announce {title}: {e:?}");
    }
}
