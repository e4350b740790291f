//! Line-oriented study loop and report rendering for the terminal.

use std::fmt::Write as _;
use std::io::Write as _;
use std::time::Duration;

use quiz_core::model::{ContinueEntry, SessionResult};
use quiz_core::session::SessionPhase;
use quiz_core::stats::StudyStats;
use services::{QuizSession, ReviewNote, SessionController, SessionError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::{self, Instant};
use tracing::debug;

/// One learner command typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Zero-based option index.
    Select(usize),
    Submit,
    Next,
    Previous,
    SaveAndExit,
    Discard,
}

impl Input {
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "s" => Some(Self::Submit),
            "n" => Some(Self::Next),
            "p" => Some(Self::Previous),
            "q" => Some(Self::SaveAndExit),
            "x" => Some(Self::Discard),
            other => other
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .map(Self::Select),
        }
    }
}

/// Drive `session` from stdin until it completes or the learner leaves.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run_session(
    sessions: &SessionController,
    session: QuizSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = BufReader::new(tokio::io::stdin());
    drive(sessions, session, input, Duration::from_secs(1)).await
}

/// Feed learner commands from `input` and one `Tick` per `period` into the session.
async fn drive<R>(
    sessions: &SessionController,
    mut session: QuizSession,
    input: R,
    period: Duration,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut timer = time::interval_at(Instant::now() + period, period);
    let timed = session.state().remaining_time_seconds().is_some();
    let mut redraw = true;

    while !session.is_completed() {
        if redraw {
            print!("{}", render_session(&session));
            std::io::stdout().flush()?;
            redraw = false;
        }

        let line = tokio::select! {
            _ = timer.tick(), if timed => {
                if sessions.tick(&mut session).await? == SessionPhase::Completed {
                    println!("\n시간이 종료되었습니다.");
                }
                continue;
            }
            line = lines.next_line() => line?,
        };
        redraw = true;

        let Some(line) = line else {
            debug!("stdin closed; saving session");
            save_and_report(sessions, session).await;
            return Ok(());
        };
        let Some(input) = Input::parse(&line) else {
            println!("1..n, s, n, p, q, x 중 하나를 입력하세요.");
            continue;
        };

        let outcome = match input {
            Input::Select(index) => sessions.select(&mut session, index).await,
            Input::Submit => sessions.submit(&mut session).await,
            Input::Next => sessions.advance(&mut session).await,
            Input::Previous => sessions.retreat(&mut session).await,
            Input::SaveAndExit => {
                save_and_report(sessions, session).await;
                return Ok(());
            }
            Input::Discard => {
                sessions.exit(session, false).await;
                println!("저장하지 않고 종료했습니다.");
                return Ok(());
            }
        };

        match outcome {
            Ok(_) => {}
            Err(err) if err.is_precedence() => println!("먼저 답안을 제출하세요 (s)."),
            Err(SessionError::Transition(err)) => println!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }

    if let Some(result) = session.result() {
        print!("{}", render_result(result));
    }
    Ok(())
}

async fn save_and_report(sessions: &SessionController, session: QuizSession) {
    match sessions.exit(session, true).await {
        Some(entry) => println!(
            "이어서 풀기로 저장했습니다 ({}/{}).",
            entry.current + 1,
            entry.total
        ),
        None => println!("세션을 종료했습니다."),
    }
}

fn format_seconds(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[must_use]
pub fn render_session(session: &QuizSession) -> String {
    let state = session.state();
    let problem = &session.current().problem;
    let tally = session.running_tally();
    let mut out = String::new();

    let _ = write!(
        out,
        "\n[{} {} {}] {}/{} ({:.0}%)  정답 {} · 오답 {}",
        state.subject().label(),
        state.difficulty().label(),
        state.mode(),
        state.current_index() + 1,
        state.total(),
        state.progress_percent(),
        tally.correct_count,
        tally.wrong_count,
    );
    if let Some(remaining) = state.remaining_time_seconds() {
        let _ = write!(out, "  남은 시간 {}", format_seconds(remaining));
    }
    let _ = writeln!(out, "\nQ. {}", problem.question());

    let feedback = session.feedback();
    for (index, choice) in problem.choices().iter().enumerate() {
        let marker = match &feedback {
            Some(f) if index == f.correct_index => "✔",
            Some(f) if index == f.selected => "✘",
            _ if state.selection() == Some(index) => ">",
            _ => " ",
        };
        let _ = writeln!(out, " {marker} {}. {choice}", index + 1);
    }

    if let Some(feedback) = feedback {
        let verdict = if feedback.is_correct { "정답입니다!" } else { "오답입니다." };
        let _ = writeln!(out, "{verdict}");
        if let Some(explanation) = feedback.explanation {
            let _ = writeln!(out, "해설: {explanation}");
        }
    }

    let hint = match session.phase() {
        SessionPhase::AwaitingAnswer => "번호를 선택하세요",
        SessionPhase::AwaitingSubmit => "s: 제출",
        SessionPhase::AwaitingAdvance if state.is_last() => "n: 결과 보기",
        SessionPhase::AwaitingAdvance => "n: 다음 문제",
        SessionPhase::Completed => "",
    };
    let _ = write!(out, "{hint} > ");
    out
}

#[must_use]
pub fn render_result(result: &SessionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n=== 결과: {} {} ({}) ===",
        result.subject.label(),
        result.difficulty.label(),
        result.mode
    );
    let _ = writeln!(
        out,
        "총 {}문제 · 정답 {} · 오답 {} · 점수 {}",
        result.total(),
        result.correct_count(),
        result.wrong_count(),
        result.total_score()
    );
    for missed in result.missed() {
        let problem = &missed.problem;
        let chosen = missed
            .user_selected_index
            .and_then(|i| problem.choices().get(i))
            .map_or("(미응답)", String::as_str);
        let correct = problem
            .choices()
            .get(problem.correct_index())
            .map_or("", String::as_str);
        let _ = writeln!(out, "- {}\n  선택: {chosen} / 정답: {correct}", problem.question());
    }
    out
}

#[must_use]
pub fn render_resumable(entries: &[ContinueEntry]) -> String {
    if entries.is_empty() {
        return "이어서 풀 학습이 없습니다.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{} {} {}  {}/{} ({:.0}%)  정답률 {}%  --subject {} --difficulty {} --mode {}",
            entry.subject.label(),
            entry.difficulty.label(),
            entry.mode,
            entry.current + 1,
            entry.total,
            entry.progress_percent,
            entry.correct_rate,
            entry.subject,
            entry.difficulty.catalog_key(),
            entry.mode,
        );
    }
    out
}

#[must_use]
pub fn render_stats(stats: &StudyStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "오늘 푼 문제: {}", stats.today_problems);
    let _ = writeln!(
        out,
        "전체 정답률: {}% ({}/{})",
        stats.accuracy_percent(),
        stats.total_correct,
        stats.total_problems
    );
    let _ = writeln!(out, "연속 학습: {}일", stats.streak_days);

    if !stats.subjects.is_empty() {
        let _ = writeln!(out, "\n과목별 진행도");
        for subject in &stats.subjects {
            let _ = writeln!(
                out,
                "  {:<8} {:>3}% ({}/{}) {}",
                subject.subject.label(),
                subject.percent,
                subject.correct,
                subject.solved,
                subject.rating.label()
            );
        }
    }

    let _ = writeln!(out, "\n최근 7일");
    for day in &stats.last_seven_days {
        let bar = "#".repeat(usize::try_from(day.problems.min(50)).unwrap_or(0));
        let _ = writeln!(out, "  {} {:>3} {bar}", day.date.format("%m-%d"), day.problems);
    }
    out
}

#[must_use]
pub fn render_notes(notes: &[ReviewNote]) -> String {
    if notes.is_empty() {
        return "오답 노트가 비어 있습니다.\n".to_string();
    }
    let mut out = String::new();
    for note in notes {
        let entry = &note.entry;
        let _ = write!(
            out,
            "[{} · {}] {}",
            entry.subject.label(),
            entry.difficulty.label(),
            entry.id
        );
        let Some(problem) = &note.problem else {
            let _ = writeln!(out, " (문제를 찾을 수 없습니다)");
            continue;
        };
        let _ = writeln!(out, "\n  {}", problem.question());
        for (index, choice) in problem.choices().iter().enumerate() {
            let marker = if index == problem.correct_index() { "✔" } else { " " };
            let _ = writeln!(out, "   {marker} {}. {choice}", index + 1);
        }
        if let Some(explanation) = problem.explanation() {
            let _ = writeln!(out, "  해설: {explanation}");
        }
    }
    out
}
