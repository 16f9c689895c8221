//! Command handlers. Each prints plain text to stdout.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use band_hub::AccessToken;
use band_hub::calendar::{CalendarClient, EventKind, EventScheduleExt, Schedule};
use band_hub::clock::now_ms;
use band_hub::config::{self, GoogleEndpoints, HubConfig};
use band_hub::drive::{DriveClient, RecordingFilter, RecordingUpload, format_duration};
use band_hub::metadata::{MetadataStore, decode_description};
use band_hub::quality::{self, QUALITY_PRESETS};
use band_hub::recording_store::{NewRecording, RecordingStore};
use band_hub_types::{Comment, Favorite, UserIdentity};
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

use crate::cli::{
    Args, Command, CommentCommand, EventFilter, FolderCommand, LocalCommand, MetadataCommand,
    QualityCommand, RecordingsCommand,
};
use crate::render;

/// Resolved settings shared by every command.
pub struct Session {
    config_path: PathBuf,
    config: HubConfig,
    endpoints: GoogleEndpoints,
    token: Option<AccessToken>,
    user: Option<UserIdentity>,
}

impl Session {
    pub fn new(args: &Args, config_path: PathBuf, config: HubConfig) -> Self {
        let endpoints = config::endpoints_from_config(&config);
        let token = args
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(AccessToken::new);
        let user = user_identity(args, &config);
        Self {
            config_path,
            config,
            endpoints,
            token,
            user,
        }
    }

    fn token(&self) -> Result<AccessToken> {
        self.token
            .clone()
            .ok_or_else(|| anyhow!("an access token is required (--token or BAND_HUB_TOKEN)"))
    }

    fn drive(&self) -> Result<DriveClient> {
        Ok(DriveClient::new(self.token()?, &self.endpoints))
    }

    fn calendar(&self) -> Result<CalendarClient> {
        Ok(CalendarClient::new(self.token()?, &self.endpoints))
    }

    fn user(&self) -> Result<&UserIdentity> {
        self.user
            .as_ref()
            .ok_or_else(|| anyhow!("a user email is required (--user-email or [user] in config)"))
    }

    fn recordings_folder(&self, drive: &DriveClient) -> Result<String> {
        let shared = config::shared_folder_id_from_config(&self.config);
        drive
            .resolve_recordings_folder(shared.as_deref())
            .context("resolve recordings folder")
    }

    fn store(&self) -> Result<RecordingStore> {
        let base_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        RecordingStore::open(&config::db_path_from_config(&self.config, &base_dir))
    }
}

fn user_identity(args: &Args, cfg: &HubConfig) -> Option<UserIdentity> {
    let from_config = config::user_from_config(cfg);
    let email = args
        .user_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .or_else(|| from_config.as_ref().map(|u| u.email.clone()))?;
    let name = args
        .user_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            from_config
                .as_ref()
                .filter(|u| u.email == email)
                .map(|u| u.name.clone())
        })
        .unwrap_or_else(|| email.clone());
    Some(UserIdentity { email, name })
}

pub fn run(session: &Session, cmd: Command) -> Result<()> {
    match cmd {
        Command::Recordings(cmd) => recordings(session, cmd),
        Command::Metadata(MetadataCommand::Show { file_id, json }) => {
            show_metadata(session, &file_id, json)
        }
        Command::Favorite { file_id } => toggle_favorite(session, &file_id),
        Command::Comment(cmd) => comment(session, cmd),
        Command::Events {
            calendar,
            days,
            kind,
        } => events(session, calendar, days, kind),
        Command::Calendars => calendars(session),
        Command::Local(cmd) => local(session, cmd),
        Command::Folder(cmd) => folder(session, cmd),
        Command::Quality(cmd) => quality_settings(session, cmd),
    }
}

fn recordings(session: &Session, cmd: RecordingsCommand) -> Result<()> {
    let drive = session.drive()?;
    match cmd {
        RecordingsCommand::List { search, mine, date } => {
            let filter = RecordingFilter {
                search: search.filter(|s| !s.trim().is_empty()),
                favorited_by: if mine {
                    Some(session.user()?.email.clone())
                } else {
                    None
                },
                modified_on: date,
            };
            let folder = session.recordings_folder(&drive)?;
            let files = drive.list_folder(&folder)?;
            let mut shown = 0;
            for file in files {
                let meta = decode_description(file.description.as_deref());
                if !filter.matches(&file, &meta) {
                    continue;
                }
                shown += 1;
                println!(
                    "{}  {}  {}  favorites: {}  comments: {}",
                    file.id,
                    file.name,
                    file.size_bytes()
                        .map(render::format_size)
                        .unwrap_or_else(|| "-".to_string()),
                    meta.favorites.len(),
                    meta.comments.len()
                );
            }
            if shown == 0 {
                if filter.is_empty() {
                    println!("No recordings yet.");
                } else {
                    println!("No recordings match the filters.");
                }
            }
        }
        RecordingsCommand::Upload {
            path,
            name,
            duration_secs,
            quality,
        } => {
            let upload = RecordingUpload {
                name: name.unwrap_or_else(|| file_stem(&path)),
                mime_type: mime_type_for(&path).to_string(),
                audio: std::fs::read(&path).with_context(|| format!("read {:?}", path))?,
                duration_secs,
                timestamp_ms: now_ms(),
                quality: Some(resolve_quality(session, quality.as_deref())?),
            };
            let folder = session.recordings_folder(&drive)?;
            let uploaded = drive.upload_recording(&folder, &upload)?;
            println!("Uploaded {} ({})", uploaded.file_name, uploaded.web_view_link);
        }
        RecordingsCommand::Delete { file_id } => {
            drive.delete_file(&file_id)?;
            println!("Deleted {file_id}");
        }
        RecordingsCommand::Download { file_id, out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(&file_id));
            let bytes = download_to(&out, |writer| Ok(drive.download_file(&file_id, writer)?))?;
            println!("Saved {} to {}", render::format_size(bytes), out.display());
        }
    }
    Ok(())
}

fn show_metadata(session: &Session, file_id: &str, json: bool) -> Result<()> {
    let store = MetadataStore::new(session.drive()?);
    let meta = store.read_metadata(file_id)?;
    if json {
        let value = serde_json::json!({
            "description": meta.original_description,
            "favorites": meta.favorites,
            "comments": meta.comments,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if !meta.original_description.is_empty() {
        println!("{}", meta.original_description);
        println!();
    }
    print_favorites(&meta.favorites);
    print_comments(&meta.comments);
    Ok(())
}

fn toggle_favorite(session: &Session, file_id: &str) -> Result<()> {
    let user = session.user()?;
    let store = MetadataStore::new(session.drive()?);
    let favorites = store.toggle_favorite(file_id, user)?;
    if favorites.iter().any(|fav| fav.user_email == user.email) {
        println!("Added to your favorites.");
    } else {
        println!("Removed from your favorites.");
    }
    print_favorites(&favorites);
    Ok(())
}

fn comment(session: &Session, cmd: CommentCommand) -> Result<()> {
    let store = MetadataStore::new(session.drive()?);
    let comments = match cmd {
        CommentCommand::Add { file_id, text } => {
            if text.trim().is_empty() {
                bail!("comment text is empty");
            }
            store.add_comment(&file_id, session.user()?, &text)?
        }
        CommentCommand::Delete {
            file_id,
            comment_id,
        } => {
            let user = session.user()?;
            let after = store.delete_comment(&file_id, &comment_id, &user.email)?;
            if has_comment(&after, &comment_id) {
                println!("Comment {comment_id} was not deleted (it belongs to another member).");
            }
            after
        }
        CommentCommand::List { file_id } => store.comments(&file_id)?,
    };
    print_comments(&comments);
    Ok(())
}

fn events(session: &Session, calendar: Option<String>, days: u32, kind: EventFilter) -> Result<()> {
    let calendar_id = calendar
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| config::calendar_id_from_config(&session.config));
    let start = OffsetDateTime::now_utc();
    let end = window_end(start, days)?;
    let events: Vec<_> = session
        .calendar()?
        .list_events(&calendar_id, start, end)?
        .into_iter()
        .filter(|event| kind_selected(kind, event.kind()))
        .collect();
    if events.is_empty() {
        println!("No events in the next {days} days.");
    }
    let day = format_description!("[year]-[month]-[day]");
    let at = format_description!("[year]-[month]-[day] [hour]:[minute]");
    for event in events {
        let when = match event.schedule() {
            Some(Schedule::AllDay { start, .. }) => {
                format!("{} (all day)", start.format(day).unwrap_or_default())
            }
            Some(Schedule::Timed { start, .. }) => start.format(at).unwrap_or_default(),
            None => "unscheduled".to_string(),
        };
        let title = event.summary.as_deref().unwrap_or("(untitled)");
        match event.location.as_deref().filter(|l| !l.is_empty()) {
            Some(location) => println!("{when}  {title}  @ {location}"),
            None => println!("{when}  {title}"),
        }
    }
    Ok(())
}

fn calendars(session: &Session) -> Result<()> {
    for entry in session.calendar()?.list_calendars()? {
        println!(
            "{}  {}  {}",
            entry.id,
            entry.summary,
            entry.access_role.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn local(session: &Session, cmd: LocalCommand) -> Result<()> {
    let store = session.store()?;
    match cmd {
        LocalCommand::Import {
            path,
            name,
            song,
            duration_secs,
        } => {
            let recording = NewRecording {
                name: name.unwrap_or_else(|| file_stem(&path)),
                audio: std::fs::read(&path).with_context(|| format!("read {:?}", path))?,
                duration_secs,
                mime_type: mime_type_for(&path).to_string(),
                timestamp_ms: now_ms(),
                song_name: song,
                recording_type: None,
                quality: Some(resolve_quality(session, None)?),
            };
            let id = store.save(&recording)?;
            println!("Saved local recording {id}");
        }
        LocalCommand::List => {
            let records = store.all()?;
            if records.is_empty() {
                println!("No local recordings.");
            }
            for record in records {
                println!(
                    "{:>4}  {}  {}  {}  {}  {}{}",
                    record.id,
                    render::format_timestamp(record.timestamp_ms),
                    record.name,
                    format_duration(record.duration_secs),
                    render::format_size(record.size_bytes.max(0) as u64),
                    record.song_name.as_deref().unwrap_or("-"),
                    if record.is_uploaded() { "  [on Drive]" } else { "" }
                );
            }
        }
        LocalCommand::Stats => {
            let stats = store.total_stats()?;
            println!(
                "{} recordings, {}, {}",
                stats.count,
                format_duration(stats.duration_secs),
                render::format_size(stats.size_bytes)
            );
        }
        LocalCommand::Upload { id: Some(id), .. } => {
            let record = store
                .get(id)?
                .with_context(|| format!("local recording {id} not found"))?;
            if record.is_uploaded() {
                bail!("local recording {id} is already on Drive");
            }
            let drive = session.drive()?;
            let folder = session.recordings_folder(&drive)?;
            let uploaded = store.upload_and_remove(&record, |record| {
                Ok(drive.upload_recording(&folder, &record.to_upload())?)
            })?;
            println!("Uploaded {} ({})", uploaded.file_name, uploaded.web_view_link);
        }
        LocalCommand::Upload { id: None, .. } => {
            if store.pending_uploads()?.is_empty() {
                println!("Nothing to upload.");
                return Ok(());
            }
            let drive = session.drive()?;
            let folder = session.recordings_folder(&drive)?;
            let summary = store.upload_pending(|record| {
                Ok(drive.upload_recording(&folder, &record.to_upload())?)
            })?;
            println!("Uploaded {} recordings, {} failed", summary.uploaded, summary.failed);
            if summary.failed > 0 {
                bail!("{} uploads failed; they stay in the local store", summary.failed);
            }
        }
        LocalCommand::Delete { id } => {
            if !store.delete(id)? {
                bail!("local recording {id} not found");
            }
            println!("Deleted local recording {id}");
        }
        LocalCommand::Clear => {
            let removed = store.clear()?;
            println!("Removed {removed} local recordings");
        }
    }
    Ok(())
}

fn folder(session: &Session, cmd: FolderCommand) -> Result<()> {
    match cmd {
        FolderCommand::Show => match config::shared_folder_id_from_config(&session.config) {
            Some(folder_id) => {
                println!("Shared folder: {folder_id}");
                if session.token.is_some() {
                    let folder = session.drive()?.verify_folder(&folder_id)?;
                    let can_add = folder
                        .capabilities
                        .as_ref()
                        .is_some_and(|caps| caps.can_add_children);
                    println!(
                        "Name: {}  ({})",
                        folder.name,
                        if can_add { "can upload" } else { "read only" }
                    );
                }
            }
            None => println!(
                "Personal folder: {}",
                band_hub::drive::RECORDINGS_FOLDER_NAME
            ),
        },
        FolderCommand::Set { folder } => {
            let folder_id = config::extract_folder_id(&folder)
                .with_context(|| format!("not a Drive folder id or link: {folder}"))?;
            if session.token.is_some() {
                let found = session.drive()?.verify_folder(&folder_id)?;
                println!("Folder \"{}\" is accessible", found.name);
            } else {
                tracing::warn!(folder_id = %folder_id, "no access token; saving folder without verifying it");
            }
            config::update_shared_folder(&session.config_path, Some(&folder_id))?;
            println!("Shared folder set to {folder_id}");
        }
        FolderCommand::Reset => {
            config::update_shared_folder(&session.config_path, None)?;
            println!(
                "Using the personal \"{}\" folder",
                band_hub::drive::RECORDINGS_FOLDER_NAME
            );
        }
    }
    Ok(())
}

fn quality_settings(session: &Session, cmd: QualityCommand) -> Result<()> {
    match cmd {
        QualityCommand::List => {
            let current = config::recording_quality_from_config(&session.config);
            for preset in QUALITY_PRESETS.iter() {
                println!(
                    "{} {:<9} {:<10} {:>11}  {:>8}  {}ch  {}  (~{} per minute)",
                    if preset.id == current.id { "*" } else { " " },
                    preset.id,
                    preset.name,
                    quality::format_bitrate(preset.audio_bits_per_second),
                    quality::format_sample_rate(preset.sample_rate),
                    preset.channel_count,
                    preset.description,
                    quality::estimated_file_size(60.0, preset.audio_bits_per_second)
                        .trim_start_matches('~')
                );
            }
        }
        QualityCommand::Set { preset } => {
            let found = quality::find_preset(preset.trim())
                .with_context(|| format!("unknown quality preset: {preset}"))?;
            config::update_recording_quality(&session.config_path, found.id)?;
            println!("Recording quality set to {}", found.name);
        }
    }
    Ok(())
}

/// End of the listing window, `days` after `start`.
fn window_end(start: OffsetDateTime, days: u32) -> Result<OffsetDateTime> {
    start
        .checked_add(Duration::days(days.into()))
        .with_context(|| format!("--days {days} reaches past the supported date range"))
}

fn kind_selected(filter: EventFilter, kind: EventKind) -> bool {
    match filter {
        EventFilter::All => true,
        EventFilter::Rehearsal => kind == EventKind::Rehearsal,
        EventFilter::Gig => kind == EventKind::Gig,
    }
}

fn has_comment(comments: &[Comment], comment_id: &str) -> bool {
    comments.iter().any(|comment| comment.id == comment_id)
}

/// Stream into `<out>.part` and rename on success, so a failed download
/// leaves an existing `out` untouched.
fn download_to<F>(out: &Path, fetch: F) -> Result<u64>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<u64>,
{
    let mut part = out.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);
    let result = File::create(&part)
        .with_context(|| format!("create {:?}", part))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            let bytes = fetch(&mut writer)?;
            writer.flush().with_context(|| format!("write {:?}", part))?;
            Ok(bytes)
        })
        .and_then(|bytes| {
            std::fs::rename(&part, out).with_context(|| format!("move {:?} to {:?}", part, out))?;
            Ok(bytes)
        });
    if result.is_err() {
        let _ = std::fs::remove_file(&part);
    }
    result
}

fn resolve_quality(session: &Session, requested: Option<&str>) -> Result<String> {
    match requested {
        Some(id) => Ok(quality::find_preset(id.trim())
            .with_context(|| format!("unknown quality preset: {id}"))?
            .id
            .to_string()),
        None => Ok(config::recording_quality_from_config(&session.config)
            .id
            .to_string()),
    }
}

fn print_favorites(favorites: &[Favorite]) {
    if favorites.is_empty() {
        println!("Favorites: none");
        return;
    }
    println!("Favorites:");
    for fav in favorites {
        println!(
            "  [{}] {} <{}> {}",
            render::user_initials(&fav.user_name),
            fav.user_name,
            fav.user_email,
            render::user_color(&fav.user_email)
        );
    }
}

fn print_comments(comments: &[Comment]) {
    if comments.is_empty() {
        println!("Comments: none");
        return;
    }
    println!("Comments:");
    let now = now_ms();
    for comment in comments {
        println!(
            "  {} [{}] {} ({}): {}",
            comment.id,
            render::user_initials(&comment.user_name),
            comment.user_name,
            render::format_comment_date(comment.timestamp_ms, now),
            comment.text
        );
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Recording")
        .to_string()
}

fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("webm") => "audio/webm",
        Some("mp4") | Some("m4a") => "audio/mp4",
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use band_hub::config::UserConfig;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn user_flags_override_config() {
        let cfg = HubConfig {
            user: Some(UserConfig {
                email: Some("cfg@band.test".to_string()),
                name: Some("Config User".to_string()),
            }),
            ..HubConfig::default()
        };

        let args = parse(&["band-hub", "calendars"]);
        assert_eq!(
            user_identity(&args, &cfg),
            Some(UserIdentity::new("cfg@band.test", "Config User"))
        );

        let args = parse(&["band-hub", "calendars", "--user-email", "flag@band.test"]);
        assert_eq!(
            user_identity(&args, &cfg),
            Some(UserIdentity::new("flag@band.test", "flag@band.test"))
        );

        let args = parse(&["band-hub", "calendars", "--user-name", "Renamed"]);
        assert_eq!(
            user_identity(&args, &cfg),
            Some(UserIdentity::new("cfg@band.test", "Renamed"))
        );

        let args = parse(&["band-hub", "calendars"]);
        assert_eq!(user_identity(&args, &HubConfig::default()), None);
    }

    #[test]
    fn mime_types_follow_extension() {
        assert_eq!(mime_type_for(Path::new("take.WEBM")), "audio/webm");
        assert_eq!(mime_type_for(Path::new("take.m4a")), "audio/mp4");
        assert_eq!(mime_type_for(Path::new("take.mp3")), "audio/mpeg");
        assert_eq!(mime_type_for(Path::new("take")), "application/octet-stream");
        assert_eq!(file_stem(Path::new("/tmp/Night Drive.webm")), "Night Drive");
    }

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "band-hub-cli-test-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn huge_day_count_is_an_error() {
        let start = time::macros::datetime!(2024-03-01 12:00 UTC);
        assert_eq!(
            window_end(start, 30).unwrap(),
            time::macros::datetime!(2024-03-31 12:00 UTC)
        );
        let err = window_end(start, u32::MAX).unwrap_err();
        assert!(err.to_string().contains("--days"));
    }

    #[test]
    fn event_filter_selects_kinds() {
        assert!(kind_selected(EventFilter::All, EventKind::Other));
        assert!(kind_selected(EventFilter::Rehearsal, EventKind::Rehearsal));
        assert!(!kind_selected(EventFilter::Rehearsal, EventKind::Gig));
        assert!(kind_selected(EventFilter::Gig, EventKind::Gig));
        assert!(!kind_selected(EventFilter::Gig, EventKind::Other));
    }

    #[test]
    fn surviving_comment_is_detected_by_id() {
        let comments = vec![Comment {
            id: "c-2".to_string(),
            text: "tight ending".to_string(),
            user_email: "b@band.test".to_string(),
            user_name: "B".to_string(),
            timestamp_ms: 1,
        }];
        assert!(has_comment(&comments, "c-2"));
        assert!(!has_comment(&comments, "c-1"));
        assert!(!has_comment(&[], "c-2"));
    }

    #[test]
    fn failed_download_keeps_existing_file() {
        let dir = temp_dir("download-fail");
        let out = dir.join("take.webm");
        std::fs::write(&out, b"previous take").unwrap();

        let result = download_to(&out, |writer| {
            writer.write_all(b"partial")?;
            anyhow::bail!("download file failed with 500")
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read(&out).unwrap(), b"previous take");
        assert!(!dir.join("take.webm.part").exists());
    }

    #[test]
    fn successful_download_replaces_file() {
        let dir = temp_dir("download-ok");
        let out = dir.join("take.webm");
        std::fs::write(&out, b"previous take").unwrap();

        let bytes = download_to(&out, |writer| {
            writer.write_all(b"new take")?;
            Ok(8)
        })
        .unwrap();

        assert_eq!(bytes, 8);
        assert_eq!(std::fs::read(&out).unwrap(), b"new take");
        assert!(!dir.join("take.webm.part").exists());
    }
}
