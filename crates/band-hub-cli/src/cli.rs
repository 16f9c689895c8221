use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use time::Date;
use time::macros::format_description;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "band-hub", version = VERSION, about = "Shared practice recordings for the band")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Config file (TOML). Defaults to config.toml next to the executable.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Google OAuth access token with Drive and Calendar scopes
    #[arg(long, env = "BAND_HUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Email used for favorites and comments (overrides [user] in config)
    #[arg(long, global = true)]
    pub user_email: Option<String>,

    /// Display name used for favorites and comments
    #[arg(long, global = true)]
    pub user_name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recordings in the shared Drive folder
    #[command(subcommand)]
    Recordings(RecordingsCommand),

    /// Show the decoded favorites/comments of a Drive file
    #[command(subcommand)]
    Metadata(MetadataCommand),

    /// Toggle your favorite on a Drive recording
    Favorite {
        file_id: String,
    },

    /// Comments on a Drive recording
    #[command(subcommand)]
    Comment(CommentCommand),

    /// Upcoming rehearsals and gigs
    Events {
        /// Calendar to read (defaults to calendar_id from config, else primary)
        #[arg(long)]
        calendar: Option<String>,

        /// Days ahead to include
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// Only rehearsals or only gigs
        #[arg(long, value_enum, default_value_t = EventFilter::All)]
        kind: EventFilter,
    },

    /// Calendars visible to the signed-in account
    Calendars,

    /// Recordings kept on this machine
    #[command(subcommand)]
    Local(LocalCommand),

    /// Shared folder settings
    #[command(subcommand)]
    Folder(FolderCommand),

    /// Recording quality presets
    #[command(subcommand)]
    Quality(QualityCommand),
}

#[derive(Subcommand, Debug)]
pub enum RecordingsCommand {
    /// List recordings, newest first
    List {
        /// Only names containing this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        /// Only recordings you marked as favorite
        #[arg(long)]
        mine: bool,
        /// Only recordings modified on this day (YYYY-MM-DD, UTC)
        #[arg(long, value_parser = parse_day)]
        date: Option<Date>,
    },
    /// Upload an audio file
    Upload {
        path: PathBuf,
        /// Recording name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
        /// Duration in seconds, for the description
        #[arg(long, default_value_t = 0.0)]
        duration_secs: f64,
        /// Quality preset id (defaults to recording_quality from config)
        #[arg(long)]
        quality: Option<String>,
    },
    Delete {
        file_id: String,
    },
    Download {
        file_id: String,
        /// Output path (defaults to the file id in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MetadataCommand {
    Show {
        file_id: String,
        /// Print the decoded metadata as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    Add {
        file_id: String,
        text: String,
    },
    /// Delete one of your own comments
    Delete {
        file_id: String,
        comment_id: String,
    },
    List {
        file_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum LocalCommand {
    /// Store an audio file in the local recordings database
    Import {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        song: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        duration_secs: f64,
    },
    List,
    Stats,
    /// Upload local recordings to Drive; uploaded copies are removed locally
    Upload {
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<i64>,
        /// Upload every recording that is not on Drive yet
        #[arg(long)]
        all: bool,
    },
    Delete {
        id: i64,
    },
    /// Remove every local recording
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Rehearsal,
    Gig,
}

fn parse_day(value: &str) -> Result<Date, String> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

#[derive(Subcommand, Debug)]
pub enum FolderCommand {
    Show,
    /// Use a shared folder, given as an id or a Drive folder link
    Set {
        folder: String,
    },
    /// Go back to the personal "Practice Recordings" folder
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum QualityCommand {
    List,
    Set {
        preset: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let args = Args::try_parse_from([
            "band-hub",
            "comment",
            "add",
            "file-1",
            "great take",
            "--user-email",
            "a@band.test",
        ])
        .unwrap();
        assert_eq!(args.user_email.as_deref(), Some("a@band.test"));
        match args.cmd {
            Command::Comment(CommentCommand::Add { file_id, text }) => {
                assert_eq!(file_id, "file-1");
                assert_eq!(text, "great take");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn list_filters_parse() {
        let args = Args::try_parse_from([
            "band-hub", "recordings", "list", "--search", "Bridge", "--mine", "--date", "2024-03-01",
        ])
        .unwrap();
        match args.cmd {
            Command::Recordings(RecordingsCommand::List { search, mine, date }) => {
                assert_eq!(search.as_deref(), Some("Bridge"));
                assert!(mine);
                assert_eq!(date, Some(time::macros::date!(2024 - 03 - 01)));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Args::try_parse_from(["band-hub", "recordings", "list", "--date", "03/01/2024"]).is_err());
    }

    #[test]
    fn local_upload_takes_an_id_or_all() {
        let all = Args::try_parse_from(["band-hub", "local", "upload", "--all"]).unwrap();
        assert!(matches!(
            all.cmd,
            Command::Local(LocalCommand::Upload { id: None, all: true })
        ));
        let one = Args::try_parse_from(["band-hub", "local", "upload", "7"]).unwrap();
        assert!(matches!(
            one.cmd,
            Command::Local(LocalCommand::Upload { id: Some(7), all: false })
        ));
        assert!(Args::try_parse_from(["band-hub", "local", "upload"]).is_err());
        assert!(Args::try_parse_from(["band-hub", "local", "upload", "7", "--all"]).is_err());
    }

    #[test]
    fn events_kind_defaults_to_all() {
        let args = Args::try_parse_from(["band-hub", "events"]).unwrap();
        assert!(matches!(args.cmd, Command::Events { kind: EventFilter::All, days: 30, .. }));
        let args = Args::try_parse_from(["band-hub", "events", "--kind", "gig"]).unwrap();
        assert!(matches!(args.cmd, Command::Events { kind: EventFilter::Gig, .. }));
    }
}
