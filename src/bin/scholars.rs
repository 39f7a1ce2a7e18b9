use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scholars_lib::application::ports::cache::QueryCache;
use scholars_lib::application::ports::scholars_api::ReviewDecision;
use scholars_lib::domain::comment_tree::count;
use scholars_lib::domain::entities::{Comment, CommunityDraft, PostDraft, UserSummary};
use scholars_lib::domain::value_objects::{CacheKey, CommentId, Vote};
use scholars_lib::{AppConfig, AppState, MutationOutcome, MutationState, init_logging};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "scholars")]
#[command(about = "Apply optimistic mutations against a GenZ Scholars backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(long, env = "SCHOLARS_API_URL")]
    api_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "SCHOLARS_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SCHOLARS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging (SCHOLARS_LOG_JSON is read with the rest of the config)
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Vote on a post (up or down); voting twice withdraws the vote
    VotePost { post_id: i64, vote: Vote },
    CreatePost {
        community_id: i64,
        title: String,
        content: String,
        #[arg(long)]
        image: Option<String>,
    },
    EditPost {
        community_id: i64,
        post_id: i64,
        title: String,
        content: String,
        #[arg(long)]
        image: Option<String>,
    },
    DeletePost { community_id: i64, post_id: i64 },
    /// Vote on a comment of a post
    VoteComment {
        post_id: i64,
        comment_id: i64,
        vote: Vote,
    },
    /// Comment on a post, or reply to a comment with --parent
    Comment {
        post_id: i64,
        content: String,
        #[arg(long)]
        parent: Option<i64>,
        /// Author shown on the placeholder until the server answers
        #[arg(long, default_value_t = 0)]
        user_id: i64,
        #[arg(long, default_value = "me")]
        username: String,
    },
    EditComment {
        post_id: i64,
        comment_id: i64,
        content: String,
    },
    DeleteComment { post_id: i64, comment_id: i64 },
    /// Create a community; --tags takes a comma separated list
    CreateCommunity {
        name: String,
        description: String,
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long)]
        image: Option<String>,
    },
    DeleteCommunity { community_id: i64 },
    Join { community_id: i64 },
    Leave { community_id: i64 },
    AddFriend { user_id: i64 },
    RemoveFriend { user_id: i64 },
    SetDisplayName { user_id: i64, display_name: String },
    /// Approve a pending post, or reject it with --reject
    Review {
        post_id: i64,
        #[arg(long)]
        reject: bool,
    },
}

impl Commands {
    fn cache_key(&self) -> CacheKey {
        match self {
            Commands::VotePost { post_id, .. } | Commands::EditPost { post_id, .. } => {
                CacheKey::Post(*post_id)
            }
            Commands::CreatePost { community_id, .. }
            | Commands::DeletePost { community_id, .. } => CacheKey::CommunityPosts(*community_id),
            Commands::VoteComment { post_id, .. }
            | Commands::Comment { post_id, .. }
            | Commands::EditComment { post_id, .. }
            | Commands::DeleteComment { post_id, .. } => CacheKey::Comments(*post_id),
            Commands::Join { community_id } | Commands::Leave { community_id } => {
                CacheKey::Community(*community_id)
            }
            Commands::CreateCommunity { .. } | Commands::DeleteCommunity { .. } => {
                CacheKey::communities("")
            }
            Commands::AddFriend { .. } | Commands::RemoveFriend { .. } => CacheKey::Friends,
            Commands::SetDisplayName { user_id, .. } => CacheKey::UserProfile(*user_id),
            Commands::Review { .. } => CacheKey::PendingPosts,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(token) = cli.token {
        config.api.auth_token = Some(token);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json_logs;

    init_logging(&config.logging)?;
    info!("Starting scholars client v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config).context("failed to build client state")?;
    let key = cli.command.cache_key();

    // Prime the entry so the speculative rewrite has something to act on.
    if let Err(e) = state.cache.fetch(&key).await {
        warn!(key = %key, error = %e, "could not load entry before mutating");
    }

    let outcome = run(&state, cli.command).await?;
    state.cache.settle_all().await;

    match state.cache.get(&key).await {
        Some(value) => {
            if let Some(forest) = value.as_comments() {
                info!(key = %key, comments = count(forest), "thread reconciled");
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        None => println!("null"),
    }

    if outcome != MutationState::Committed {
        anyhow::bail!("mutation was rolled back");
    }
    Ok(())
}

async fn run(state: &AppState, command: Commands) -> Result<MutationState> {
    let key = command.cache_key();
    let settled = match command {
        Commands::VotePost { post_id, vote } => {
            state.votes.vote_post(key, post_id, vote).await?.state
        }
        Commands::CreatePost {
            community_id,
            title,
            content,
            image,
        } => {
            state
                .posts
                .create_post(community_id, draft(title, content, image))
                .await?
                .state
        }
        Commands::EditPost {
            community_id,
            post_id,
            title,
            content,
            image,
        } => {
            state
                .posts
                .edit_post(community_id, post_id, draft(title, content, image))
                .await?
                .state
        }
        Commands::DeletePost {
            community_id,
            post_id,
        } => state.posts.delete_post(community_id, post_id).await.state,
        Commands::VoteComment {
            comment_id, vote, ..
        } => {
            state
                .votes
                .vote_comment(key, CommentId::Committed(comment_id), vote)
                .await?
                .state
        }
        Commands::Comment {
            post_id,
            content,
            parent,
            user_id,
            username,
        } => {
            let outcome = state
                .comments
                .create_comment(
                    post_id,
                    UserSummary::new(user_id, username),
                    &content,
                    parent.map(CommentId::Committed),
                )
                .await?;
            report_created(&outcome);
            outcome.state
        }
        Commands::EditComment {
            post_id,
            comment_id,
            content,
        } => {
            state
                .comments
                .edit_comment(post_id, CommentId::Committed(comment_id), &content)
                .await?
                .state
        }
        Commands::DeleteComment {
            post_id,
            comment_id,
        } => {
            state
                .comments
                .delete_comment(post_id, CommentId::Committed(comment_id))
                .await?
                .state
        }
        Commands::CreateCommunity {
            name,
            description,
            tags,
            image,
        } => {
            let mut community = CommunityDraft::new(name, description, &tags);
            community.image = image;
            state.communities.create_community(community).await?.state
        }
        Commands::DeleteCommunity { community_id } => {
            state.communities.delete_community(community_id).await.state
        }
        Commands::Join { community_id } => {
            state
                .communities
                .set_membership(key, community_id, true, None)
                .await?
                .state
        }
        Commands::Leave { community_id } => {
            state
                .communities
                .set_membership(key, community_id, false, None)
                .await?
                .state
        }
        Commands::AddFriend { user_id } => state.friends.add_friend(user_id).await.state,
        Commands::RemoveFriend { user_id } => state.friends.remove_friend(user_id).await.state,
        Commands::SetDisplayName {
            user_id,
            display_name,
        } => {
            state
                .profiles
                .update_display_name(user_id, &display_name)
                .await?
                .state
        }
        Commands::Review { post_id, reject } => {
            let decision = if reject {
                ReviewDecision::Reject
            } else {
                ReviewDecision::Approve
            };
            state.moderation.review_post(post_id, decision).await.state
        }
    };
    Ok(settled)
}

fn draft(title: String, content: String, image: Option<String>) -> PostDraft {
    let mut draft = PostDraft::new(title, content);
    draft.image = image;
    draft
}

fn report_created(outcome: &MutationOutcome<Option<Comment>>) {
    if let Ok(Some(comment)) = &outcome.result {
        info!(id = %comment.id, "comment committed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_flag_leaves_env_parsing_to_config() {
        let command = Cli::command();
        let json_logs = command
            .get_arguments()
            .find(|arg| arg.get_id() == "json_logs")
            .expect("json_logs argument");
        assert!(json_logs.get_env().is_none());

        let cli = Cli::try_parse_from(["scholars", "join", "4"]).expect("parse");
        assert!(!cli.json_logs);
    }

    #[test]
    fn post_commands_target_their_entries() {
        let cli = Cli::try_parse_from([
            "scholars",
            "edit-post",
            "4",
            "7",
            "Exam tips",
            "Sleep before the exam.",
        ])
        .expect("parse");
        assert_eq!(cli.command.cache_key(), CacheKey::Post(7));

        let cli = Cli::try_parse_from([
            "scholars",
            "create-community",
            "Robotics",
            "Build robots together.",
            "--tags",
            "hardware, ai",
        ])
        .expect("parse");
        assert_eq!(cli.command.cache_key(), CacheKey::communities(""));
    }
}
