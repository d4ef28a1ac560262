mod practice;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use trainer_frontend_rs::persistence::FileStore;
use trainer_frontend_rs::presentation::{self, OVERVIEW_SET_MISSING};
use trainer_frontend_rs::relay_client::{DEFAULT_TIMEOUT, display_text};
use trainer_frontend_rs::{
    Controller, Drill, LaunchError, LaunchTarget, PersistenceBridge, RelayClient,
};
use vocab_utils::{Card, Catalog, VocabularySet};

#[derive(Parser, Debug)]
#[command(name = "vocab-trainer", version, about = "Practice German vocabulary in the terminal")]
struct Cli {
    /// Vocabulary catalog (themes of word sets)
    #[arg(long, global = true, default_value = "vocabulary.json")]
    catalog: PathBuf,

    /// Where the chosen set is remembered between runs
    #[arg(long, global = true, default_value = ".vocab-trainer.json")]
    state: PathBuf,

    /// The relay's getAnswer endpoint
    #[arg(
        long,
        global = true,
        default_value = "http://127.0.0.1:3000/api/getAnswer"
    )]
    relay_url: String,

    /// Seconds to wait for the relay
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List themes and their sets
    Themes,

    /// Choose a set and show its words
    Select { id: String },

    /// Show every entry of a set with its examples
    Overview { id: Option<String> },

    /// Self-graded flashcards over every word of a set
    Flashcards { id: Option<String> },

    /// der/die/das drill over the nouns of a set
    Articles { id: Option<String> },

    /// Ask the relay to check a sentence written with a word of the current set
    Check {
        sentence: String,
        /// The German word being practiced, as it appears in the set
        #[arg(long)]
        word: String,
    },

    /// Ask the relay for a short story using a set's vocabulary
    Story {
        /// `german - english` lines to use instead of a set
        #[arg(long)]
        words: Option<String>,
        id: Option<String>,
    },
}

struct App {
    catalog: Catalog,
    bridge: PersistenceBridge<FileStore>,
    relay: RelayClient,
}

impl App {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let catalog = Catalog::load(&cli.catalog)
            .with_context(|| format!("loading {}", cli.catalog.display()))?;
        Ok(Self {
            catalog,
            bridge: PersistenceBridge::new(FileStore::new(&cli.state)),
            relay: RelayClient::new(&cli.relay_url)
                .with_timeout(Duration::from_secs(cli.timeout_secs)),
        })
    }

    fn find_set(&self, id: &str) -> anyhow::Result<VocabularySet> {
        self.catalog
            .find_set(id)
            .cloned()
            .with_context(|| format!("no set with id {id:?}"))
    }

    /// The set named on the command line, else the one chosen last.
    fn chosen_set(&self, id: Option<&str>) -> anyhow::Result<Option<VocabularySet>> {
        match id {
            Some(id) => self.find_set(id).map(Some),
            None => Ok(self.bridge.restore_selection(&self.catalog)?.cloned()),
        }
    }

    /// Stores the chosen set for a page and reads it back the way the page would.
    fn launch(
        &mut self,
        id: Option<&str>,
        target: LaunchTarget,
    ) -> anyhow::Result<Option<VocabularySet>> {
        let chosen = self.chosen_set(id)?;
        if let Some(set) = &chosen {
            self.bridge.choose_set(set)?;
        }
        match self.bridge.launch(chosen.as_ref(), target) {
            Ok(()) => Ok(self.bridge.selected_set()?),
            Err(e @ LaunchError::Storage(_)) => Err(e.into()),
            Err(e) => {
                println!("{e}");
                Ok(None)
            }
        }
    }

    async fn practice(&mut self, drill: Drill, id: Option<&str>) -> anyhow::Result<()> {
        let target = match drill {
            Drill::Flashcards => LaunchTarget::Flashcards,
            Drill::GenderDrill => LaunchTarget::GenderDrill,
        };
        let Some(set) = self.launch(id, target)? else {
            return Ok(());
        };

        let mut controller = Controller::start(drill, Some(&set), rand::rng());
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        practice::run(
            &mut controller,
            stdin,
            &mut render::TerminalPresenter,
            &self.relay,
        )
        .await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut app = App::open(&cli)?;

    match &cli.command {
        Command::Themes => {
            let last = app.bridge.last_selected_set_id()?;
            render::print_themes(
                &presentation::theme_summaries(&app.catalog),
                last.as_deref(),
            );
        }
        Command::Select { id } => {
            let set = app.find_set(id)?;
            app.bridge.choose_set(&set)?;
            render::print_word_lists(set.display_name(), &presentation::word_lists(&set));
        }
        Command::Overview { id } => match app.launch(id.as_deref(), LaunchTarget::Overview)? {
            Some(set) => render::print_overview(
                set.display_name(),
                &presentation::overview_entries(&set),
            ),
            None => println!("{OVERVIEW_SET_MISSING}"),
        },
        Command::Flashcards { id } => app.practice(Drill::Flashcards, id.as_deref()).await?,
        Command::Articles { id } => app.practice(Drill::GenderDrill, id.as_deref()).await?,
        Command::Check { sentence, word } => {
            let Some(set) = app.chosen_set(None)? else {
                println!("{}", presentation::EmptyState::NoSet.message());
                return Ok(());
            };
            let Some(card) = find_card(&set, word) else {
                bail!("{word:?} is not in {}", set.display_name());
            };
            if sentence.trim().is_empty() {
                println!("{}", presentation::EMPTY_SENTENCE);
                return Ok(());
            }
            println!("{}", presentation::CHECKING_SENTENCE);
            let result = app.relay.check_sentence(&card, sentence.trim()).await;
            println!("{}", display_text(&result));
        }
        Command::Story { words, id } => {
            let vocabulary = match words {
                Some(words) => words.clone(),
                None => match app.chosen_set(id.as_deref())? {
                    Some(set) => set.vocabulary_lines(),
                    None => bail!("choose a set or pass --words"),
                },
            };
            if vocabulary.trim().is_empty() {
                println!("{}", presentation::EMPTY_VOCABULARY);
                return Ok(());
            }
            println!("Loading...");
            match app.relay.generate_story(&vocabulary).await {
                Ok(answer) => render::print_story(&answer),
                Err(e) => println!("Error: {e}"),
            }
        }
    }
    Ok(())
}

fn find_card(set: &VocabularySet, word: &str) -> Option<Card> {
    set.categories()
        .find_map(|(_, words)| words.get(word))
        .map(|entry| Card::new(word, entry.clone()))
}
