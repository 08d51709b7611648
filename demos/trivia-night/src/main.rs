use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::time::sleep;

use quizwire::prelude::*;
use quizwire::{RegistryConfig, RetryPolicy, ScoringConfig};

// ---------------------------------------------------------------------------
// Question pack
// ---------------------------------------------------------------------------

/// The night's pack. A real deployment would pull these from a question
/// provider; the demo plays a fixed one.
fn pack() -> Vec<Question> {
    let mut rng = rand::rng();
    let rows: [(&str, &str, &[&str]); 5] = [
        (
            "Which planet has the shortest day?",
            "Jupiter",
            &["Mercury", "Mars", "Venus"],
        ),
        (
            "Which metal is liquid at room temperature?",
            "Mercury",
            &["Gallium", "Sodium", "Bromine"],
        ),
        (
            "In which year was the first email sent?",
            "1971",
            &["1969", "1978", "1983"],
        ),
        (
            "How many hearts does an octopus have?",
            "Three",
            &["One", "Two", "Four"],
        ),
        (
            "Which language has the most native speakers?",
            "Mandarin",
            &["English", "Spanish", "Hindi"],
        ),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (text, answer, wrong))| {
            Question::new(
                QuestionId(i as u64 + 1),
                text,
                answer,
                wrong.iter().map(|w| w.to_string()).collect(),
                &mut rng,
            )
            .expect("demo pack is well-formed")
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Contestants
// ---------------------------------------------------------------------------

/// A scripted player: answers every question after a fixed delay,
/// correctly with probability `accuracy`.
struct Bot {
    id: ClientId,
    name: &'static str,
    delay: Duration,
    accuracy: f64,
}

impl Bot {
    fn choose(&self, question: &Question) -> String {
        let mut rng = rand::rng();
        let wrong: Vec<&String> = question
            .options()
            .iter()
            .filter(|o| o.as_str() != question.answer())
            .collect();
        if wrong.is_empty() || rng.random_bool(self.accuracy) {
            question.answer().to_owned()
        } else {
            wrong[rng.random_range(0..wrong.len())].clone()
        }
    }
}

fn contestants() -> Vec<Bot> {
    vec![
        Bot {
            id: ClientId::new("bot-ada"),
            name: "Ada",
            delay: Duration::from_millis(1_500),
            accuracy: 0.9,
        },
        Bot {
            id: ClientId::new("bot-grace"),
            name: "Grace",
            delay: Duration::from_millis(3_500),
            accuracy: 0.75,
        },
        Bot {
            id: ClientId::new("bot-linus"),
            name: "Linus",
            delay: Duration::from_millis(6_000),
            accuracy: 0.5,
        },
    ]
}

/// Waits for the next committed session version, riding out lag (every
/// event is a full snapshot, so skipping versions loses nothing).
async fn next_view(feed: &mut Receiver<ChangeEvent>) -> Option<SessionView> {
    loop {
        match feed.recv().await {
            Ok(ChangeEvent::Updated(view)) => return Some(view),
            Ok(ChangeEvent::Removed(_)) | Err(RecvError::Closed) => return None,
            Err(RecvError::Lagged(_)) => continue,
        }
    }
}

impl Bot {
    /// Answers the active question, if this view shows one we haven't
    /// answered yet.
    async fn react(
        &self,
        engine: &QuizEngine<MemoryStore>,
        code: &RoomCode,
        view: &SessionView,
        answered: &mut Option<usize>,
    ) {
        if view.session.status() != SessionStatus::Playing || view.session.is_revealed() {
            return;
        }
        let Some(index) = view.session.current_index() else {
            return;
        };
        if *answered == Some(index) {
            return;
        }
        let Some(question) = view.session.questions().get(index) else {
            return;
        };
        *answered = Some(index);

        sleep(self.delay).await;
        // The deadline may have beaten a slow bot to the reveal; a late
        // answer is accepted but worth nothing.
        let _ = engine
            .submit_answer(code, &self.id, self.choose(question))
            .await;
    }
}

/// One contestant: watches the feed and answers each fresh question once.
async fn run_bot(engine: QuizEngine<MemoryStore>, code: RoomCode, bot: Bot) {
    let Ok(mut feed) = engine.subscribe(&code).await else {
        return;
    };
    // Start from a snapshot: the subscription may open mid-round, after
    // the version that activated the current question already shipped.
    let Ok(mut view) = engine.session_view(&code).await else {
        return;
    };
    let mut answered = None;
    loop {
        bot.react(&engine, &code, &view, &mut answered).await;
        match next_view(&mut feed).await {
            Some(next) => view = next,
            None => return,
        }
    }
}

// ---------------------------------------------------------------------------
// Host driver
// ---------------------------------------------------------------------------

fn announce_question(view: &SessionView) {
    if let (Some(index), Some(question)) =
        (view.session.current_index(), view.session.current_question())
    {
        println!("\nQ{} - {}", index + 1, question.text());
        for option in question.options() {
            println!("    {option}");
        }
    }
}

/// Non-host standings, highest score first.
fn scoreboard(view: &SessionView) -> String {
    let mut rows: Vec<&Player> = view.roster.players().filter(|p| !p.is_host).collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    rows.iter()
        .map(|p| format!("  {:>5}  {}", p.score, p.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drives the rounds: announces questions, waits for each reveal, shows
/// the standings, and advances until the session reaches Results.
async fn run_host(
    engine: &QuizEngine<MemoryStore>,
    code: &RoomCode,
    host: &ClientId,
    reveal_pause: Duration,
) -> Result<SessionView, QuizError> {
    let mut feed = engine.subscribe(code).await?;
    let mut view = engine.session_view(code).await?;
    let mut asked: Option<usize> = None;
    let mut settled: Option<usize> = None;
    loop {
        if view.session.status() == SessionStatus::Playing {
            let index = view.session.current_index();
            if !view.session.is_revealed() {
                if index != asked {
                    asked = index;
                    announce_question(&view);
                }
            } else if index.is_some() && index != settled {
                settled = index;
                if let Some(question) = view.session.current_question() {
                    println!("  answer: {}", question.answer());
                }
                println!("{}", scoreboard(&view));

                sleep(reveal_pause).await;
                if engine.advance(code, host).await? == Advance::Finished {
                    return engine.session_view(code).await;
                }
            }
        }
        view = match next_view(&mut feed).await {
            Some(next) => next,
            None => return engine.session_view(code).await,
        };
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// An 8 second answer window keeps the demo brisk; the scoring decay
/// spans the same window by construction.
fn night_config() -> EngineConfig {
    EngineConfig {
        scoring: ScoringConfig {
            question_duration: Duration::from_secs(8),
            ..ScoringConfig::default()
        },
        registry: RegistryConfig::default(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    quizwire::init_tracing();

    let engine = QuizEngine::new(MemoryStore::new(), Arc::new(SystemClock), night_config());
    let host = ClientId::new("quizmaster");
    let code = engine.create_session(host.clone(), "Quizmaster").await?;
    println!("trivia night: room {code} is open");

    let bots = contestants();
    for bot in &bots {
        engine.join(&code, bot.id.clone(), bot.name).await?;
        println!("  {} sat down", bot.name);
    }

    let loaded = engine
        .load_from_bank(&code, &host, &StaticBank::new(pack()), &RetryPolicy::default())
        .await?;
    println!("  {loaded} questions loaded");

    for bot in bots {
        tokio::spawn(run_bot(engine.clone(), code.clone(), bot));
    }

    engine.start(&code, &host).await?;
    let final_view = run_host(&engine, &code, &host, Duration::from_secs(2)).await?;

    println!("\nfinal standings");
    println!("{}", scoreboard(&final_view));
    engine.end_game(&code, &host).await?;
    Ok(())
}
