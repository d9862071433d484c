use anyhow::Context;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    token: Option<SecretString>,
    api_url: String,
}

impl GithubClient {
    /// Without a token, requests go out unauthenticated and subject to the
    /// much lower anonymous rate limit.
    pub fn new(token: Option<SecretString>, api_url: String) -> Self {
        GithubClient {
            client: Client::new(),
            token,
            api_url,
        }
    }

    /// All open issues carrying `label`, across however many pages the
    /// listing spans. No label means an unfiltered listing.
    pub async fn open_issues_with_label(
        &self,
        repo: &Repository,
        label: Option<&str>,
    ) -> anyhow::Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut page = 1;
        loop {
            let mut url = format!(
                "{}/issues?state=open&page={page}&per_page=100",
                repo.url(self)
            );
            if let Some(label) = label {
                url.push_str(&format!("&labels={label}"));
            }

            let new: Vec<Issue> = self.json(self.get(&url)).await?;
            if new.is_empty() {
                break;
            }
            issues.extend(new);

            page += 1;
        }
        Ok(issues)
    }

    /// All comments on an issue, in the order GitHub returns them
    /// (chronological).
    pub async fn issue_comments(
        &self,
        repo: &Repository,
        number: u64,
    ) -> anyhow::Result<Vec<Comment>> {
        let mut comments = Vec::new();
        let mut page = 1;
        loop {
            let req = self.get(&format!(
                "{}/issues/{number}/comments?page={page}&per_page=100",
                repo.url(self)
            ));

            let new: Vec<Comment> = self.json(req).await?;
            if new.is_empty() {
                break;
            }
            comments.extend(new);

            page += 1;
        }
        Ok(comments)
    }

    pub async fn close_issue(&self, repo: &Repository, number: u64) -> anyhow::Result<()> {
        let edit_url = format!("{}/issues/{number}", repo.url(self));
        #[derive(serde::Serialize)]
        struct CloseIssue<'a> {
            state: &'a str,
        }
        self.send_req(
            self.patch(&edit_url)
                .json(&CloseIssue { state: "closed" }),
        )
        .await
        .with_context(|| format!("failed to close issue #{number}"))?;
        Ok(())
    }

    pub async fn new_issue(
        &self,
        repo: &Repository,
        title: &str,
        body: &str,
        labels: Vec<String>,
        assignees: Vec<String>,
    ) -> anyhow::Result<Issue> {
        #[derive(serde::Serialize)]
        struct NewIssue<'a> {
            title: &'a str,
            body: &'a str,
            labels: Vec<String>,
            assignees: Vec<String>,
        }
        let url = format!("{}/issues", repo.url(self));
        self.json(self.post(&url).json(&NewIssue {
            title,
            body,
            labels,
            assignees,
        }))
        .await
        .context("failed to open issue")
    }

    async fn send_req(&self, req: RequestBuilder) -> anyhow::Result<Bytes> {
        tracing::debug!("send_req with {:?}", req);
        let req_dbg = format!("{req:?}");
        let resp = req
            .send()
            .await
            .with_context(|| format!("failed to send {req_dbg}"))?;

        let maybe_err = resp.error_for_status_ref().err();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read response body {req_dbg}"))?;
        if let Some(e) = maybe_err {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("response: {}", String::from_utf8_lossy(&body)));
        }

        Ok(body)
    }

    async fn json<T>(&self, req: RequestBuilder) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.send_req(req).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn get(&self, url: &str) -> RequestBuilder {
        tracing::trace!("get {:?}", url);
        self.client.get(url).configure(self)
    }

    fn patch(&self, url: &str) -> RequestBuilder {
        tracing::trace!("patch {:?}", url);
        self.client.patch(url).configure(self)
    }

    fn post(&self, url: &str) -> RequestBuilder {
        tracing::trace!("post {:?}", url);
        self.client.post(url).configure(self)
    }
}

trait RequestSend: Sized {
    fn configure(self, g: &GithubClient) -> Self;
}

impl RequestSend for RequestBuilder {
    fn configure(self, g: &GithubClient) -> RequestBuilder {
        let req = self.header(USER_AGENT, "diarybot");
        match &g.token {
            Some(token) => {
                let mut auth = reqwest::header::HeaderValue::from_maybe_shared(format!(
                    "token {}",
                    token.expose_secret()
                ))
                .unwrap();
                auth.set_sensitive(true);
                req.header(AUTHORIZATION, &auth)
            }
            None => req,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    fn url(&self, client: &GithubClient) -> String {
        format!("{}/repos/{}/{}", client.api_url, self.owner, self.name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Repository> {
        let Some((owner, name)) = s.split_once('/') else {
            anyhow::bail!("expected `owner/name`, got `{s}`");
        };
        Ok(Repository {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(deserialize_with = "opt_string")]
    pub body: String,
    pub user: User,
    pub labels: Vec<Label>,
    pub state: IssueState,
}

#[derive(PartialEq, Eq, Debug, Clone, serde::Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, serde::Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "opt_string")]
    pub body: String,
    pub user: User,
    pub created_at: chrono::DateTime<Utc>,
}

fn opt_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    use serde::de::Deserialize;
    match <Option<String>>::deserialize(deserializer) {
        Ok(v) => Ok(v.unwrap_or_default()),
        Err(e) => Err(e),
    }
}
