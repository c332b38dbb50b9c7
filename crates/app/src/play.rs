//! Interactive terminal runners for quizzes, lessons, and the matching game.

use std::error::Error;
use std::io::Write as _;

use quiz_core::model::{
    ActivityKind, Answer, Lesson, LessonId, LessonSummary, Outcome, Question, QuestionKind,
    SessionLength, Topic,
};
use services::{AppServices, MatchingGame, RevealOutcome, SelectionPolicy, SessionError, SubmitFeedback};
use storage::repository::StorageError;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type RunResult = Result<(), Box<dyn Error>>;

/// Line-oriented prompt over stdin.
pub struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one line. `None` on EOF or a lone `q`.
    async fn prompt(&mut self, label: &str) -> std::io::Result<Option<String>> {
        print!("{label}");
        std::io::stdout().flush()?;
        let Some(line) = self.lines.next_line().await? else {
            return Ok(None);
        };
        if line.trim().eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        Ok(Some(line))
    }

    async fn confirm(&mut self, label: &str) -> std::io::Result<bool> {
        Ok(self
            .prompt(label)
            .await?
            .is_some_and(|line| matches!(line.trim(), "y" | "Y" | "yes")))
    }
}

//
// ─── INPUT ─────────────────────────────────────────────────────────────────────
//

/// Turn a typed line into an answer of the shape `question` expects.
///
/// Multiple-choice accepts a 1-based option number or the option text;
/// true/false accepts `t`/`f`, `true`/`false`, `y`/`n`.
fn parse_answer(question: &Question, input: &str) -> Option<Answer> {
    let trimmed = input.trim();
    match question.kind() {
        QuestionKind::MultipleChoice { options, .. } => {
            let chosen = match trimmed.parse::<usize>() {
                Ok(number) => number.checked_sub(1).and_then(|i| options.get(i)),
                Err(_) => options.iter().find(|o| o.eq_ignore_ascii_case(trimmed)),
            };
            chosen.map(|option| Answer::text(option.clone()))
        }
        QuestionKind::TrueFalse { .. } => match trimmed.to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" => Some(Answer::Bool(true)),
            "f" | "false" | "n" | "no" => Some(Answer::Bool(false)),
            _ => None,
        },
        QuestionKind::Identification { .. } => {
            (!trimmed.is_empty()).then(|| Answer::text(input))
        }
    }
}

fn answer_hint(question: &Question) -> &'static str {
    match question.kind() {
        QuestionKind::MultipleChoice { .. } => "Type an option number.",
        QuestionKind::TrueFalse { .. } => "Type t (true) or f (false).",
        QuestionKind::Identification { .. } => "Type your answer.",
    }
}

async fn read_answer(terminal: &mut Terminal, question: &Question) -> std::io::Result<Option<Answer>> {
    loop {
        let Some(line) = terminal.prompt("> ").await? else {
            return Ok(None);
        };
        if let Some(answer) = parse_answer(question, &line) {
            return Ok(Some(answer));
        }
        println!("{}", answer_hint(question));
    }
}

//
// ─── OUTPUT ────────────────────────────────────────────────────────────────────
//

fn print_question(question: &Question, heading: &str) {
    println!();
    println!("{heading} {}", question.prompt());
    match question.kind() {
        QuestionKind::MultipleChoice { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                println!("   {}) {option}", i + 1);
            }
        }
        QuestionKind::TrueFalse { .. } => println!("   TRUE or FALSE?"),
        QuestionKind::Identification { .. } => {}
    }
}

fn print_feedback(feedback: &SubmitFeedback) {
    if feedback.correct {
        println!("Correct!");
    } else {
        match &feedback.correct_answer {
            Some(answer) => println!("Wrong. Answer: {answer}"),
            None => println!("Wrong."),
        }
    }
}

fn print_outcome(outcome: Outcome) {
    println!();
    println!(
        "Score: {}/{} ({:.0}%) {}",
        outcome.score(),
        outcome.total(),
        outcome.percentage(),
        if outcome.passed() { "PASSED" } else { "FAILED" }
    );
}

/// One line per lesson: id, title, and excerpt when present.
fn catalog_line(lesson: &LessonSummary) -> String {
    match &lesson.excerpt {
        Some(excerpt) => format!("{:<26} {}  ({excerpt})", lesson.id.as_str(), lesson.title),
        None => format!("{:<26} {}", lesson.id.as_str(), lesson.title),
    }
}

pub fn print_catalog(lessons: &[LessonSummary], search: Option<&str>) {
    if lessons.is_empty() {
        match search {
            Some(query) => println!("No lessons match \"{}\".", query.trim()),
            None => println!("No lessons available."),
        }
        return;
    }
    for lesson in lessons {
        println!("{}", catalog_line(lesson));
    }
    println!();
    println!("Open one with: lesson --lesson <id>");
}

fn print_lesson(lesson: &Lesson) {
    println!();
    println!("{}", lesson.title());
    println!("{}", "=".repeat(lesson.title().chars().count()));
    if !lesson.content().trim().is_empty() {
        println!();
        println!("{}", lesson.content().trim());
    }
    if !lesson.images().is_empty() {
        println!();
        for image in lesson.images() {
            println!("[image] {image}");
        }
    }
    if !lesson.sources().is_empty() {
        println!();
        println!("Sources:");
        for source in lesson.sources() {
            println!("  - {source}");
        }
    }
}

fn activity_for(topic: &Topic) -> ActivityKind {
    match topic.section() {
        Some("true_false") => ActivityKind::TrueFalse,
        Some("identification") => ActivityKind::Identification,
        _ => ActivityKind::Assessment,
    }
}

async fn offer_retry(terminal: &mut Terminal, err: &StorageError) -> std::io::Result<bool> {
    println!("Could not save progress: {err}");
    if !err.is_transient() {
        return Ok(false);
    }
    terminal.confirm("Retry? [y/N] ").await
}

//
// ─── RUNNERS ───────────────────────────────────────────────────────────────────
//

pub async fn run_quiz(
    services: &AppServices,
    terminal: &mut Terminal,
    topic: &Topic,
    count: Option<i64>,
    policy: SelectionPolicy,
) -> RunResult {
    let quiz_loop = services.quiz_loop();
    let length = count
        .map(SessionLength::try_from)
        .transpose()
        .map_err(SessionError::from)?;
    let mut session = quiz_loop.start_session(topic, length, policy).await?;
    if session.total() == 0 {
        println!("No questions available for {topic}.");
    }

    while let Some(question) = session.current_question().cloned() {
        let progress = session.progress();
        print_question(&question, &format!("[{}/{}]", progress.position, progress.total));
        let Some(answer) = read_answer(terminal, &question).await? else {
            session.abandon();
            println!("Session abandoned.");
            return Ok(());
        };
        let feedback = session.submit(question.id(), answer)?;
        print_feedback(&feedback);
        session.advance()?;
    }

    print_outcome(session.result()?);
    loop {
        match quiz_loop.finish_session(&session, activity_for(topic)).await {
            Ok(record) => {
                println!("Saved {} point(s).", record.daily_points());
                return Ok(());
            }
            Err(SessionError::Storage(err)) => {
                if !offer_retry(terminal, &err).await? {
                    return Ok(());
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

pub async fn run_lesson(services: &AppServices, terminal: &mut Terminal, lesson: LessonId) -> RunResult {
    let lesson = services.lessons().lesson(&lesson).await?;
    print_lesson(&lesson);

    let quiz_loop = services.quiz_loop();
    let mut assessment = quiz_loop.start_lesson(lesson.id().clone()).await?;
    let questions = assessment.questions().to_vec();
    println!();
    if questions.is_empty() {
        println!("No assessment available for this lesson.");
        return Ok(());
    }
    let label = format!("Take the assessment ({} questions)? [y/N] ", questions.len());
    if !terminal.confirm(&label).await? {
        return Ok(());
    }

    println!("Leave a line blank to skip a question.");
    for (i, question) in questions.iter().enumerate() {
        print_question(question, &format!("{}.", i + 1));
        let Some(line) = terminal.prompt("> ").await? else {
            println!("Assessment abandoned.");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_answer(question, &line) {
            Some(answer) => assessment.record_answer(question.id(), answer)?,
            None => println!("Not understood, left blank. {}", answer_hint(question)),
        }
    }

    let outcome = assessment.submit()?;
    println!();
    for (i, question) in questions.iter().enumerate() {
        let mark = if assessment.is_correct(question.id()) == Some(true) {
            "ok"
        } else {
            "x "
        };
        let answer = question.display_answer().unwrap_or_default();
        println!("{mark} {}. {}  [{answer}]", i + 1, question.prompt());
    }
    print_outcome(outcome);

    loop {
        match quiz_loop.finish_lesson(&assessment).await {
            Ok(record) => {
                println!("Saved {} point(s).", record.daily_points());
                return Ok(());
            }
            Err(SessionError::Storage(err)) => {
                if !offer_retry(terminal, &err).await? {
                    return Ok(());
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn print_board(game: &MatchingGame) {
    println!();
    for (i, card) in game.cards().iter().enumerate() {
        let label = if game.is_face_up(i) { card.label() } else { "?" };
        print!("{:>3}. {:<26}", i + 1, label);
        if (i + 1) % 3 == 0 {
            println!();
        }
    }
    println!();
    println!("Pairs matched: {} | Score: {}", game.pairs_matched(), game.score());
}

fn parse_picks(line: &str) -> Option<(usize, usize)> {
    let picks: Vec<usize> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<usize>().ok()?.checked_sub(1))
        .collect::<Option<_>>()?;
    match picks[..] {
        [first, second] => Some((first, second)),
        _ => None,
    }
}

pub async fn run_matching(services: &AppServices, terminal: &mut Terminal) -> RunResult {
    let mut game = MatchingGame::law_terms();

    while !game.is_complete() {
        print_board(&game);
        let Some(line) = terminal.prompt("Pick two cards (e.g. 3 7), q to stop: ").await? else {
            break;
        };
        let Some((first, second)) = parse_picks(&line) else {
            println!("Enter two card numbers.");
            continue;
        };
        game.reveal(first);
        match game.reveal(second) {
            RevealOutcome::Matched => println!("Match! +10"),
            RevealOutcome::Mismatched => {
                let label = |i: usize| game.cards().get(i).map_or("", |c| c.label()).to_string();
                println!("No match: {} / {}", label(first), label(second));
                game.conceal();
            }
            RevealOutcome::Flipped | RevealOutcome::Ignored => {
                println!("Those cards cannot be flipped.");
                game.conceal();
            }
        }
    }

    println!("Final score: {}", game.score());
    loop {
        match services.quiz_loop().save_matching(&game).await {
            Ok(record) => {
                println!("Score of {} saved!", record.daily_points());
                return Ok(());
            }
            Err(SessionError::Storage(err)) => {
                if !offer_retry(terminal, &err).await? {
                    return Ok(());
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branches() -> Question {
        Question::multiple_choice(
            "mc1",
            "Which branch makes the law?",
            vec!["Executive".into(), "Legislative".into(), "Judiciary".into()],
            "Legislative",
        )
        .unwrap()
    }

    #[test]
    fn multiple_choice_accepts_number_or_text() {
        let q = branches();
        assert_eq!(parse_answer(&q, "2"), Some(Answer::text("Legislative")));
        assert_eq!(parse_answer(&q, " judiciary "), Some(Answer::text("Judiciary")));
        assert_eq!(parse_answer(&q, "0"), None);
        assert_eq!(parse_answer(&q, "4"), None);
        assert_eq!(parse_answer(&q, "Senate"), None);
    }

    #[test]
    fn true_false_accepts_short_forms() {
        let q = Question::true_false("tf1", "Suffrage is the right to vote.", true).unwrap();
        assert_eq!(parse_answer(&q, "T"), Some(Answer::Bool(true)));
        assert_eq!(parse_answer(&q, "no"), Some(Answer::Bool(false)));
        assert_eq!(parse_answer(&q, "maybe"), None);
    }

    #[test]
    fn identification_keeps_raw_text() {
        let q = Question::identification("id1", "Who?", "^corazon aquino$", None).unwrap();
        assert_eq!(parse_answer(&q, " Corazon Aquino "), Some(Answer::text(" Corazon Aquino ")));
        assert_eq!(parse_answer(&q, "   "), None);
    }

    #[test]
    fn picks_are_one_based_pairs() {
        assert_eq!(parse_picks("3 7"), Some((2, 6)));
        assert_eq!(parse_picks("1,2"), Some((0, 1)));
        assert_eq!(parse_picks("0 1"), None);
        assert_eq!(parse_picks("5"), None);
        assert_eq!(parse_picks("a b"), None);
    }

    #[test]
    fn catalog_line_shows_excerpt_when_present() {
        let lesson = Lesson::new("presidents", "Presidents since 1987", "")
            .unwrap()
            .with_excerpt("Short bios and major acts");
        let line = catalog_line(&lesson.summary());
        assert!(line.starts_with("presidents "));
        assert!(line.ends_with("Presidents since 1987  (Short bios and major acts)"));

        let bare = Lesson::new("acts", "Recent Republic Acts", "").unwrap();
        assert!(!catalog_line(&bare.summary()).contains('('));
    }

    #[test]
    fn sections_map_to_activities() {
        assert_eq!(
            activity_for(&Topic::new("interactive_question").with_section("true_false")),
            ActivityKind::TrueFalse
        );
        assert_eq!(activity_for(&Topic::new("quiz_pool")), ActivityKind::Assessment);
    }
}
