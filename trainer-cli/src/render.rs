use trainer_frontend_rs::presentation::{OverviewEntry, ThemeSummary, WordList};
use trainer_frontend_rs::{Drill, Presenter, SessionView, StoryAnswer};

/// Prints session views to stdout.
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn render(&mut self, view: &SessionView) {
        println!("{}", render_view(view));
    }

    fn notify(&mut self, message: &str) {
        println!("! {message}");
    }
}

pub fn render_view(view: &SessionView) -> String {
    let mut out = String::new();
    if let Some(name) = &view.set_name {
        out.push_str(&format!("== {name} ==\n"));
    }

    if let Some(feedback) = &view.feedback {
        match (feedback.correct, feedback.expected) {
            (true, _) => out.push_str("✓ correct\n"),
            (false, Some(expected)) => {
                out.push_str(&format!("✗ it's {expected} {}\n", feedback.word))
            }
            (false, None) => out.push_str("✗ noted\n"),
        }
    }

    if view.total > 0 {
        out.push_str(&format!(
            "[{}/{}] {:.0}%  correct {}  incorrect {}\n",
            view.position, view.total, view.progress, view.correct, view.incorrect
        ));
    }
    out.push_str(&format!("\n    {}\n", view.headline));

    if !view.mistakes.is_empty() {
        out.push_str("\nMistakes:\n");
        for line in &view.mistakes {
            out.push_str(&format!("  {line}\n"));
        }
    }

    if view.controls_enabled {
        out.push_str(&format!("\n{}", controls(view.drill)));
    } else if view.finished {
        out.push_str("\n[r] retrain mistakes  [q] quit");
    }
    out
}

fn controls(drill: Drill) -> &'static str {
    match drill {
        Drill::Flashcards => {
            "[f] flip  [g] good  [b] bad  [r] retrain mistakes  [c <sentence>] check  [q] quit"
        }
        Drill::GenderDrill => "[der] [die] [das]  [r] retrain mistakes  [q] quit",
    }
}

pub fn print_themes(themes: &[ThemeSummary], last_selected: Option<&str>) {
    for theme in themes {
        println!("{}", theme.title);
        for set in &theme.sets {
            let marker = if Some(set.id.as_str()) == last_selected {
                "*"
            } else {
                " "
            };
            println!(
                " {marker} {:<20} {} ({} words)",
                set.id, set.name, set.word_count
            );
        }
    }
}

pub fn print_word_lists(name: &str, lists: &[WordList]) {
    println!("== {name} ==");
    for list in lists {
        println!("\n{}", list.category);
        for line in &list.lines {
            println!("  {line}");
        }
    }
}

pub fn print_overview(name: &str, entries: &[OverviewEntry]) {
    println!("== {name} ==");
    for entry in entries {
        println!("\n{} ({})", entry.german, entry.category);
        println!("  {}", entry.english);
        println!("  {}", entry.example_de);
        println!("  {}", entry.example_en);
    }
}

pub fn print_story(answer: &StoryAnswer) {
    match answer {
        StoryAnswer::Parsed { story, missing } => {
            for (index, sentence) in story.sentences() {
                println!("{index}. {}", sentence.german_text());
                println!("   {}", sentence.english_text());
                for row in &sentence.translations {
                    println!("     {:>2}  {} = {}", row.position, row.german, row.english);
                }
            }
            if !missing.is_empty() {
                println!("\nNot used in the story:");
                for pair in missing {
                    println!("  {}", pair.german);
                }
            }
        }
        StoryAnswer::Raw { text } => println!("{text}"),
    }
}
