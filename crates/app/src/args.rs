use std::path::PathBuf;

use chrono::FixedOffset;
use clap::{Args, Parser, Subcommand};
use quiz_core::model::{Difficulty, StudyMode, StudySettingsDraft, Subject};
use quiz_core::time::offset_from_minutes;
use thiserror::Error;

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_CATALOG_DIR: &str = "data/problems";

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("invalid database url: {0:?}")]
    InvalidDbUrl(String),

    #[error("invalid UTC offset (minutes east of UTC): {0}")]
    InvalidOffset(String),
}

#[derive(Debug, Parser)]
#[command(
    name = "quiz",
    version,
    about = "Quiz and exam study sessions over a problem catalog",
    after_help = "While studying: 1..n select, s submit, n next, p previous, q save and exit, x discard"
)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

/// Where data lives and which calendar day the learner is on.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// SQLite database url or path
    #[arg(
        long = "db",
        env = "QUIZ_DB_URL",
        default_value = DEFAULT_DB_URL,
        value_parser = parse_db_url,
        global = true
    )]
    pub db_url: String,

    /// Directory holding `<subject>.json` catalogs
    #[arg(
        long = "catalog",
        env = "QUIZ_CATALOG_DIR",
        default_value = DEFAULT_CATALOG_DIR,
        global = true
    )]
    pub catalog_dir: PathBuf,

    /// Minutes east of UTC used for calendar days (default: Korea Standard Time)
    #[arg(
        long = "utc-offset",
        env = "QUIZ_UTC_OFFSET_MINUTES",
        default_value = "540",
        value_parser = parse_offset,
        allow_hyphen_values = true,
        global = true
    )]
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start a fresh session
    Study(StudyArgs),

    /// Continue a saved session; the most recent one when no subject is given
    Resume(ResumeArgs),

    /// List saved sessions
    List,

    /// Show study statistics
    Stats,

    /// Show missed problems
    Notes {
        #[arg(long)]
        subject: Option<Subject>,

        /// 초급|중급|고급 or easy|medium|hard
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },

    /// Delete every study record
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct StudyArgs {
    /// Catalog subject key (e.g. os, ds, web)
    #[arg(long)]
    pub subject: String,

    /// 초급|중급|고급 or easy|medium|hard
    #[arg(long)]
    pub difficulty: Option<Difficulty>,

    /// quiz or exam
    #[arg(long)]
    pub mode: Option<StudyMode>,

    /// Time budget in minutes
    #[arg(long = "time")]
    pub study_time_min: Option<u32>,
}

impl StudyArgs {
    #[must_use]
    pub fn draft(&self) -> StudySettingsDraft {
        StudySettingsDraft {
            subject: Some(self.subject.clone()),
            difficulty: self.difficulty,
            mode: self.mode,
            study_time_min: self.study_time_min,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ResumeArgs {
    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long, requires = "subject")]
    pub difficulty: Option<Difficulty>,

    #[arg(long, requires = "subject")]
    pub mode: Option<StudyMode>,
}

impl ResumeArgs {
    /// `None` selects the most recently saved session.
    #[must_use]
    pub fn draft(&self) -> Option<StudySettingsDraft> {
        let subject = self.subject.clone()?;
        Some(StudySettingsDraft {
            subject: Some(subject),
            difficulty: self.difficulty,
            mode: self.mode,
            study_time_min: None,
        })
    }
}

fn parse_db_url(raw: &str) -> Result<String, ArgsError> {
    if raw.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl(raw.to_string()));
    }
    Ok(normalize_sqlite_url(raw.to_string()))
}

fn parse_offset(raw: &str) -> Result<FixedOffset, ArgsError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .and_then(offset_from_minutes)
        .ok_or_else(|| ArgsError::InvalidOffset(raw.to_string()))
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its directory exist before `SQLite` opens it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl(db_url.to_string()))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl(db_url.to_string()).into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("quiz").chain(args.iter().copied()))
    }

    #[test]
    fn study_flags_build_a_valid_draft() {
        let cli = parse(&["study", "--subject", "os", "--mode", "exam", "--time", "30"]).unwrap();
        let Command::Study(study) = cli.command else {
            panic!("expected study");
        };
        let settings = study.draft().validate().unwrap();
        assert_eq!(settings.mode(), StudyMode::Exam);
        assert_eq!(settings.difficulty(), Difficulty::Easy);
        assert_eq!(settings.time_budget_seconds(), Some(1800));
    }

    #[test]
    fn difficulty_accepts_either_label() {
        for raw in ["중급", "medium"] {
            let cli = parse(&["study", "--subject", "ds", "--difficulty", raw]).unwrap();
            let Command::Study(study) = cli.command else {
                panic!("expected study");
            };
            assert_eq!(study.difficulty, Some(Difficulty::Medium));
        }
    }

    #[test]
    fn resume_without_subject_means_most_recent() {
        let cli = parse(&["resume"]).unwrap();
        let Command::Resume(resume) = cli.command else {
            panic!("expected resume");
        };
        assert!(resume.draft().is_none());

        let cli = parse(&["resume", "--subject", "os", "--mode", "quiz"]).unwrap();
        let Command::Resume(resume) = cli.command else {
            panic!("expected resume");
        };
        let key = resume.draft().unwrap().validate().unwrap().key();
        assert_eq!(key.mode, StudyMode::Quiz);
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = parse(&[
            "stats",
            "--catalog",
            "/tmp/problems",
            "--db",
            "sqlite::memory:",
            "--utc-offset",
            "-300",
        ])
        .unwrap();
        assert_eq!(cli.config.db_url, "sqlite::memory:");
        assert_eq!(cli.config.offset.local_minus_utc(), -300 * 60);
        assert_eq!(cli.config.catalog_dir, PathBuf::from("/tmp/problems"));
        assert!(matches!(cli.command, Command::Stats));
    }

    #[test]
    fn rejects_bad_input() {
        let kind = |args: &[&str]| parse(args).unwrap_err().kind();
        assert_eq!(kind(&["play"]), ErrorKind::InvalidSubcommand);
        assert_eq!(kind(&["study"]), ErrorKind::MissingRequiredArgument);
        assert_eq!(
            kind(&["study", "--subject", "os", "--mode", "practice"]),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            kind(&["stats", "--utc-offset", "2000"]),
            ErrorKind::ValueValidation
        );
        assert_eq!(kind(&["list", "--subject", "os"]), ErrorKind::UnknownArgument);
        assert_eq!(
            kind(&["resume", "--mode", "exam"]),
            ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn reset_needs_confirmation_flag() {
        assert!(matches!(
            parse(&["reset"]).unwrap().command,
            Command::Reset { yes: false }
        ));
        assert!(matches!(
            parse(&["reset", "--yes"]).unwrap().command,
            Command::Reset { yes: true }
        ));
    }

    #[test]
    fn relative_paths_become_absolute_sqlite_urls() {
        let url = normalize_sqlite_url("data/quiz.db".to_string());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.db"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".to_string()),
            "sqlite::memory:"
        );
    }
}
