use std::sync::Arc;

use clap::Parser;
use quiz_core::model::StudySettingsDraft;
use services::{AppServices, Clock, QuizSession, SessionController};
use storage::catalog::DirectoryCatalog;
use tracing::info;

mod args;
mod terminal;

use args::{Cli, Command, prepare_sqlite_file};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn resume_target(
    sessions: &SessionController,
    target: Option<StudySettingsDraft>,
) -> Result<Option<QuizSession>, Box<dyn std::error::Error>> {
    let Some(draft) = target else {
        let Some(latest) = sessions.list_resumable().await.into_iter().next() else {
            return Ok(None);
        };
        return Ok(Some(sessions.resume(&latest)?));
    };
    let key = draft.validate()?.key();
    Ok(sessions.resume_key(&key).await?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.config;
    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&config.db_url)?;
    let catalog = Arc::new(DirectoryCatalog::new(config.catalog_dir));
    info!(root = %catalog.root().display(), "reading problem catalog");
    let app = AppServices::new_sqlite(
        &config.db_url,
        catalog,
        Clock::default_clock(),
        config.offset,
    )
    .await?;
    info!(db = %config.db_url, "storage ready");

    let sessions = app.sessions();
    match cli.command {
        Command::Study(study) => {
            let settings = study.draft().validate()?;
            let session = sessions.start(&settings).await?;
            terminal::run_session(&sessions, session).await
        }
        Command::Resume(resume) => match resume_target(&sessions, resume.draft()).await? {
            Some(session) => terminal::run_session(&sessions, session).await,
            None => {
                println!("이어서 풀 학습이 없습니다.");
                Ok(())
            }
        },
        Command::List => {
            print!("{}", terminal::render_resumable(&sessions.list_resumable().await));
            Ok(())
        }
        Command::Stats => {
            print!("{}", terminal::render_stats(&app.stats().stats().await));
            Ok(())
        }
        Command::Notes {
            subject,
            difficulty,
        } => {
            let notes = app
                .review_notes()
                .notes(subject.as_ref(), difficulty)
                .await;
            print!("{}", terminal::render_notes(&notes));
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                eprintln!("reset deletes all study records; rerun with --yes to confirm");
                return Ok(());
            }
            app.reset_study_records().await?;
            println!("모든 학습 기록을 삭제했습니다.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
