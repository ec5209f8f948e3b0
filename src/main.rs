use anyhow::Context;
use blogsmith::{
    check_title, parse_tag_list, Config, DuplicateThresholds, GenerateRequest, Generator,
    TopicSearch, API_KEY_ENV, DEFAULT_API_BASE, DEFAULT_MODEL,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "blogsmith",
    version,
    author,
    about = "Generate blog posts and topic ideas with an LLM",
    long_about = "Generate blog posts and topic ideas for a company blog with an OpenAI-compatible model.\n\n\
    Posts are Markdown files with YAML front-matter. New topics are checked against \
    published posts, and an existing post is never overwritten.\n\n\
    USAGE EXAMPLES:\n  \
      # Generate a post\n  \
      blogsmith generate --topic \"Расчёт себестоимости на производстве\"\n\n  \
      # Fix the title and tags\n  \
      blogsmith generate --topic \"КП за минуты\" --title \"Автоматизация КП\" --tags quotations,crm\n\n  \
      # Find 10 new topics\n  \
      blogsmith topics --query \"складской учёт\" --count 10\n\n  \
      # Check a title for duplicates\n  \
      blogsmith check --title \"Автоматизация КП\""
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Directory with published posts
    #[arg(long, global = true, default_value = "content/blog", value_name = "PATH")]
    posts_dir: PathBuf,

    /// Topic cache file
    #[arg(long, global = true, default_value = "content/topics.json", value_name = "FILE")]
    topics_file: PathBuf,

    /// Content rules file (allowed tags, categories, forbidden words)
    #[arg(long, global = true, default_value = "content/blog-rules.json", value_name = "FILE")]
    rules_file: PathBuf,

    /// JSON file replacing the built-in stop words, keyword groups and link tables
    #[arg(long, global = true, value_name = "FILE")]
    heuristics_file: Option<PathBuf>,

    /// Root of the OpenAI-compatible API
    #[arg(long, global = true, default_value = DEFAULT_API_BASE, value_name = "URL")]
    api_base: String,

    /// API key
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    model: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 120)]
    timeout_secs: u64,

    /// Author written to new posts
    #[arg(long, global = true)]
    author: Option<String>,

    /// Similarity above which a post counts as similar
    #[arg(long, global = true, default_value_t = 0.5)]
    similarity: f64,

    /// Shared words that make a post similar regardless of the score
    #[arg(long, global = true, default_value_t = 3)]
    min_overlap: usize,

    /// Words a topic needs before the shared-words rule applies
    #[arg(long, global = true, default_value_t = 4)]
    min_candidate_tokens: usize,

    /// Similar posts younger than this many days block a topic
    #[arg(long, global = true, default_value_t = 30)]
    recency_days: i64,

    /// Dry run (don't write files)
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one post and write it to the posts directory
    Generate {
        /// What the post is about
        #[arg(long)]
        topic: String,

        /// Use this title instead of generating one
        #[arg(long)]
        title: Option<String>,

        /// Blog category
        #[arg(long)]
        category: Option<String>,

        /// Comma-separated tags instead of generated ones
        #[arg(long)]
        tags: Option<String>,
    },

    /// Ask for new topic ideas and add them to the topic cache
    Topics {
        /// Subject to search ideas for
        #[arg(long)]
        query: String,

        /// Number of ideas (1-50)
        #[arg(long, default_value_t = 10)]
        count: usize,
    },

    /// Check a title against published posts
    Check {
        /// Candidate title
        #[arg(long)]
        title: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Настройка трассировки
    setup_tracing(cli.global.verbose)?;

    let config = build_config(&cli.global).context("Failed to build configuration")?;

    match cli.command {
        Command::Generate {
            topic,
            title,
            category,
            tags,
        } => {
            let request = GenerateRequest {
                topic,
                title,
                category,
                tags: tags.as_deref().map(parse_tag_list).unwrap_or_default(),
            };
            let client = config
                .completion_client()
                .context("Failed to create AI client")?;
            let report = Generator::new(config, client)
                .context("Failed to create generator")?
                .generate(&request)
                .context("Post generation failed")?;
            report.print_summary();
        }
        Command::Topics { query, count } => {
            let client = config
                .completion_client()
                .context("Failed to create AI client")?;
            let report = TopicSearch::new(config, client)
                .context("Failed to create topic search")?
                .run(&query, count)
                .context("Topic search failed")?;
            report.print_summary();
        }
        Command::Check { title } => {
            let check = check_title(&config, &title).context("Duplicate check failed")?;
            match &check.matched {
                Some(found) if check.is_duplicate => {
                    println!(
                        "Duplicate: '{}' (similarity {:.2}, {} days old)",
                        found.title,
                        found.similarity,
                        found
                            .age_days
                            .map_or_else(|| "unknown".to_string(), |d| d.to_string())
                    );
                    return Ok(ExitCode::FAILURE);
                }
                _ => {
                    if let Some(warning) = &check.warning {
                        println!("Warning: {warning}");
                    }
                    println!("OK: best similarity {:.2}", check.similarity);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build_config(args: &GlobalArgs) -> blogsmith::Result<Config> {
    let mut builder = Config::builder()
        .posts_dir(&args.posts_dir)
        .topics_file(&args.topics_file)
        .rules_file(&args.rules_file)
        .api_base(&args.api_base)
        .model(&args.model)
        .timeout(Duration::from_secs(args.timeout_secs))
        .thresholds(DuplicateThresholds {
            similarity: args.similarity,
            min_overlap: args.min_overlap,
            min_candidate_tokens: args.min_candidate_tokens,
            recency_days: args.recency_days,
        })
        .dry_run(args.dry_run);

    if let Some(path) = &args.heuristics_file {
        builder = builder.heuristics_file(path);
    }
    if let Some(key) = &args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(author) = &args.author {
        builder = builder.author(author);
    }

    builder.build()
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("blogsmith=info"),
        1 => EnvFilter::new("blogsmith=debug"),
        _ => EnvFilter::new("blogsmith=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(args: &[&str]) -> Config {
        let cli = Cli::try_parse_from(args).unwrap();
        build_config(&cli.global).unwrap()
    }

    #[test]
    fn test_default_thresholds() {
        let config = config_from(&["blogsmith", "check", "--title", "КП"]);
        assert_eq!(config.thresholds, DuplicateThresholds::default());
    }

    #[test]
    fn test_all_thresholds_from_flags() {
        let config = config_from(&[
            "blogsmith",
            "check",
            "--title",
            "КП",
            "--similarity",
            "0.7",
            "--min-overlap",
            "2",
            "--min-candidate-tokens",
            "6",
            "--recency-days",
            "90",
        ]);
        assert_eq!(
            config.thresholds,
            DuplicateThresholds {
                similarity: 0.7,
                min_overlap: 2,
                min_candidate_tokens: 6,
                recency_days: 90,
            }
        );
    }
}
