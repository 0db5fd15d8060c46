use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::Parser;
use spdlog::{error, info, warn};

use tumblr_export::api::{Credentials, FetchSelection};
use tumblr_export::config::Config;
use tumblr_export::exporter::{ExportOptions, Exporter, Layout, PostSource};
use tumblr_export::logger::build_logger;
use tumblr_export::post_filter::{PostFilter, StateSelection};
use tumblr_export::text_utils::parse_since;

use crate::config::open_config;

mod config;

const CFG_FILE_NAME: &str = "tumblr-export.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
enum Args {
    /// Convert blog posts to Hugo markdown files
    Hugo(HugoArgs),
    /// Convert blog posts to Hugo page bundles
    HugoPageBundle(PageBundleArgs),
    /// Copy the media of every original post, without writing any document
    Media(MediaArgs),
}

#[derive(Parser, Debug)]
struct HugoArgs {
    /// Blog to export, e.g. staff.tumblr.com
    blog: String,
    /// Output directory for posts
    posts: PathBuf,
    /// Output directory for images, videos and audio
    media: PathBuf,
    #[command(flatten)]
    select: SelectArgs,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Parser, Debug)]
struct PageBundleArgs {
    /// Blog to export, e.g. staff.tumblr.com
    blog: String,
    /// Output directory for posts and their media
    output: PathBuf,
    #[command(flatten)]
    select: SelectArgs,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Parser, Debug)]
struct MediaArgs {
    /// Blog to export, e.g. staff.tumblr.com
    blog: String,
    /// Output directory for images, videos and audio
    media: PathBuf,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(clap::Args, Debug)]
struct SelectArgs {
    /// Get public posts
    #[arg(short, long)]
    published: bool,
    /// Get private posts
    #[arg(short, long)]
    restricted: bool,
    /// Get draft posts
    #[arg(short, long)]
    drafts: bool,
    /// Get queued posts
    #[arg(short, long)]
    queued: bool,
    /// Only process original posts, no reblogs
    #[arg(short, long)]
    no_reblogs: bool,
    /// Always use user authentication (required to get private or censored posts)
    #[arg(short, long)]
    authenticate: bool,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Only process posts newer than this date
    #[arg(short, long, value_parser = parse_since)]
    since: Option<DateTime<Utc>>,
    /// Write the raw post json to a file
    #[arg(short = 'o', long)]
    json_out: Option<PathBuf>,
    /// Read the raw post json from a file instead of the Tumblr API
    #[arg(short = 'i', long)]
    json_in: Option<PathBuf>,
    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,
    /// Test run, log what would be written without writing anything
    #[arg(short, long)]
    test: bool,
    /// Config path
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Plain markdown, without Hugo shortcodes
    #[arg(long)]
    strict: bool,
}

struct Job {
    blog: String,
    layout: Layout,
    states: StateSelection,
    no_reblogs: bool,
    selection: FetchSelection,
    run: RunArgs,
}

impl SelectArgs {
    fn states(&self) -> StateSelection {
        StateSelection {
            published: self.published,
            private: self.restricted,
            draft: self.drafts,
            queued: self.queued,
        }
    }

    fn fetch_selection(&self) -> FetchSelection {
        FetchSelection {
            published: self.published || self.restricted,
            drafts: self.drafts,
            queued: self.queued,
            authenticate: self.authenticate,
        }
    }
}

impl From<Args> for Job {
    fn from(args: Args) -> Job {
        match args {
            Args::Hugo(args) => Job {
                blog: args.blog,
                layout: Layout::Flat { posts_dir: args.posts, media_dir: args.media },
                states: args.select.states(),
                no_reblogs: args.select.no_reblogs,
                selection: args.select.fetch_selection(),
                run: args.run,
            },
            Args::HugoPageBundle(args) => Job {
                blog: args.blog,
                layout: Layout::PageBundle { output_dir: args.output },
                states: args.select.states(),
                no_reblogs: args.select.no_reblogs,
                selection: args.select.fetch_selection(),
                run: args.run,
            },
            Args::Media(args) => Job {
                blog: args.blog,
                layout: Layout::MediaOnly { media_dir: args.media },
                states: StateSelection::all(),
                no_reblogs: true,
                selection: FetchSelection { published: true, drafts: true, queued: true, authenticate: true },
                run: args.run,
            },
        }
    }
}

fn post_source(job: &Job, config: Option<&Config>) -> Result<PostSource, String> {
    if let Some(ref json_in) = job.run.json_in {
        return Ok(PostSource::JsonFile(json_in.clone()));
    }

    let Some(consumer_key) = config.and_then(Config::consumer_key) else {
        return Err(format!(
            "Need a Tumblr API consumer key to read posts. Get one at https://www.tumblr.com/oauth/apps\n\
             and add it to {}:\n\n[api]\nconsumer_key = \"your-consumer-key\"", CFG_FILE_NAME));
    };

    Ok(PostSource::Api {
        blog: job.blog.clone(),
        credentials: Credentials {
            consumer_key: consumer_key.to_string(),
            oauth_token: config.and_then(|cfg| cfg.api.oauth_token.clone()),
        },
        selection: job.selection,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let job = Job::from(Args::parse());

    let config = match open_config(job.run.config.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Please run tumblr-export --help");
            return ExitCode::FAILURE;
        }
    };

    let source = match post_source(&job, config.as_ref()) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let verbose = job.run.verbose || job.run.test;
    let logger = match build_logger(verbose, config.as_ref().and_then(|cfg| cfg.log.as_ref())) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Error creating logger. Desc={}", err);
            return ExitCode::FAILURE;
        }
    };

    let options = ExportOptions {
        source,
        json_out: job.run.json_out,
        layout: job.layout,
        filter: PostFilter {
            since: job.run.since,
            no_reblogs: job.no_reblogs,
            states: job.states,
        },
        strict: job.run.strict || config.as_ref().is_some_and(|cfg| cfg.defaults.strict),
        dry_run: job.run.test,
    };

    info!(logger: logger, "Starting tumblr-export for {} =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-", job.blog);

    let code = match Exporter::new(logger.clone()).run(&options).await {
        Ok(summary) => {
            summary.log(&logger);
            if summary.has_errors() {
                warn!(logger: logger, "Export finished with errors, some posts or files are missing");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(logger: logger, "Export failed: {:#}", err);
            ExitCode::FAILURE
        }
    };

    logger.flush();
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(args: &[&str]) -> Job {
        Job::from(Args::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_hugo_args() {
        let job = job(&["tumblr-export", "hugo", "staff", "content/posts", "static/media", "-p", "-r", "-n", "--since", "2021-01-01"]);
        assert_eq!(job.blog, "staff");
        assert!(matches!(job.layout, Layout::Flat { ref posts_dir, .. } if posts_dir == &PathBuf::from("content/posts")));
        assert_eq!(job.states, StateSelection { published: true, private: true, ..Default::default() });
        assert!(job.no_reblogs);
        assert!(job.selection.published);
        assert!(!job.selection.drafts);
        assert_eq!(job.run.since.unwrap().to_rfc3339(), "2021-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_page_bundle_args() {
        let job = job(&["tumblr-export", "hugo-page-bundle", "staff", "site", "-d", "-q", "-t", "-i", "posts.json", "--strict"]);
        assert!(matches!(job.layout, Layout::PageBundle { .. }));
        assert_eq!(job.states, StateSelection { draft: true, queued: true, ..Default::default() });
        assert!(job.run.test);
        assert!(job.run.strict);
        assert!(matches!(post_source(&job, None), Ok(PostSource::JsonFile(_))));
    }

    #[test]
    fn test_media_args() {
        let job = job(&["tumblr-export", "media", "staff", "media"]);
        assert_eq!(job.states, StateSelection::all());
        assert!(job.no_reblogs);
        assert!(job.selection.authenticate);
    }

    #[test]
    fn test_api_needs_consumer_key() {
        let job = job(&["tumblr-export", "hugo", "staff", "posts", "media", "-p"]);
        assert!(post_source(&job, None).is_err());

        let config = tumblr_export::config::parse_config("[api]\nconsumer_key = \"key\"\n").unwrap();
        assert!(matches!(post_source(&job, Some(&config)), Ok(PostSource::Api { .. })));
    }

    #[test]
    fn test_invalid_since() {
        assert!(Args::try_parse_from(["tumblr-export", "media", "staff", "media", "-s", "yesterday"]).is_err());
    }
}
