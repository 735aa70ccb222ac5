use clap::Parser;

/// Configuration for the gitshelf proxy server.
#[derive(Parser, Debug, Clone)]
#[command(name = "gitshelf-proxy")]
#[command(about = "Resource CRUD proxy persisting admin resources into a GitHub repository")]
pub struct Config {
    /// TCP host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "GITSHELF_HOST")]
    pub host: String,

    /// TCP port to bind to
    #[arg(long, default_value = "8787", env = "GITSHELF_PORT")]
    pub port: u16,

    /// Repository holding the content, as `owner/name`
    #[arg(long, env = "GITHUB_REPO")]
    pub repo: String,

    /// GitHub token with contents read/write access
    #[arg(long, env = "GITHUB_TOKEN")]
    pub github_token: String,

    /// Shared secret signing credentials and preview tokens
    #[arg(long, env = "GITSHELF_SECRET")]
    pub secret: String,

    /// Public URL of this proxy, used in preview links
    #[arg(long, default_value = "http://127.0.0.1:8787/", env = "GITSHELF_BASE_URL")]
    pub base_url: String,

    /// Directory inside the repository holding all resources
    #[arg(long, default_value = "content", env = "GITSHELF_CONTENT_ROOT")]
    pub content_root: String,

    /// Directory inside the repository holding user records
    #[arg(long, default_value = "content/users", env = "GITSHELF_USERS_DIR")]
    pub users_dir: String,

    /// Preview token lifetime (seconds)
    #[arg(long, default_value = "900", env = "GITSHELF_PREVIEW_TTL")]
    pub preview_ttl_secs: i64,

    /// GitHub API base URL (override for GitHub Enterprise)
    #[arg(long, default_value = "https://api.github.com", env = "GITHUB_API_BASE")]
    pub github_api_base: String,
}
