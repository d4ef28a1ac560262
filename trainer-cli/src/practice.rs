use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};
use trainer_frontend_rs::presentation::{CHECKING_SENTENCE, EMPTY_SENTENCE};
use trainer_frontend_rs::relay_client::display_text;
use trainer_frontend_rs::{Controller, Drill, Presenter, RelayClient, RelayError, UiEvent};
use vocab_utils::Article;

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Event(UiEvent),
    Check(String),
    Quit,
    Unknown,
}

pub fn parse_input(line: &str, drill: Drill) -> Input {
    let line = line.trim();
    if let Some(sentence) = line.strip_prefix("c ") {
        return Input::Check(sentence.trim().to_string());
    }
    match (line, drill) {
        ("q" | "quit", _) => Input::Quit,
        ("r" | "retrain", _) => Input::Event(UiEvent::RetrainMistakes),
        ("c", Drill::Flashcards) => Input::Check(String::new()),
        ("f" | "flip" | "", Drill::Flashcards) => Input::Event(UiEvent::Flip),
        ("g" | "good", Drill::Flashcards) => Input::Event(UiEvent::Good),
        ("b" | "bad", Drill::Flashcards) => Input::Event(UiEvent::Bad),
        (other, Drill::GenderDrill) => match Article::parse_loose(other) {
            Some(article) => Input::Event(UiEvent::Choose(article)),
            None => Input::Unknown,
        },
        _ => Input::Unknown,
    }
}

/// Runs one practice page until the learner quits or the input ends.
pub async fn run<R, L, P>(
    controller: &mut Controller<R>,
    mut lines: L,
    presenter: &mut P,
    relay: &RelayClient,
) -> anyhow::Result<()>
where
    R: Rng,
    L: AsyncBufRead + Unpin,
    P: Presenter,
{
    let drill = controller.view().drill;
    presenter.render(&controller.view());

    let mut line = String::new();
    loop {
        line.clear();
        if lines.read_line(&mut line).await? == 0 {
            break;
        }

        match parse_input(&line, drill) {
            Input::Quit => break,
            Input::Event(event) => controller.dispatch(event, presenter),
            Input::Check(sentence) if drill == Drill::Flashcards => {
                let text = check_sentence(controller, relay, &sentence).await;
                presenter.notify(&text);
            }
            Input::Check(_) | Input::Unknown => {
                log::debug!("Unrecognised input {line:?}");
                presenter.notify("Unknown command");
            }
        }
    }
    Ok(())
}

async fn check_sentence<R: Rng>(
    controller: &Controller<R>,
    relay: &RelayClient,
    sentence: &str,
) -> String {
    if sentence.trim().is_empty() {
        return EMPTY_SENTENCE.to_string();
    }
    let Some(card) = controller.current_card().cloned() else {
        return "There is no word to practice.".to_string();
    };

    println!("{CHECKING_SENTENCE}");
    let result = relay.check_sentence(&card, sentence).await;
    if let Err(RelayError::Superseded) = result {
        log::debug!("Sentence check was superseded");
    }
    display_text(&result)
}
