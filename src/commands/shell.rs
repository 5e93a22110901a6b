//! Line-oriented driver for the controller.
//!
//! Each stdin line is one command. Outcome events are printed as they are
//! returned; searches wait for the debounced request to complete so that the
//! printed view reflects its result.

use std::path::Path;
use std::time::Duration;

use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};

use super::open_lists;
use crate::config::Config;
use crate::controller::RelatedLists;
use crate::display::{format_event, render_view};
use crate::error::{RelatedListsError, Result};
use crate::events::ControllerEvent;
use crate::types::{CollectionKind, DraftEdit, RowId, SortDirection};

/// Upper bound on waiting for a debounced search, on top of the debounce itself
const SEARCH_WAIT: Duration = Duration::from_secs(30);

const HELP: &str = "\
commands:
  show [collection]                 print one or both collections
  more <collection>                 load the next page
  search <collection> [term...]     search; no term leaves search mode
  sort <collection> <field> [asc|desc]
  edit <collection> <id> field=value...
  save <collection>                 commit pending edits
  cancel <collection>               discard pending edits
  delete <collection> <id>
  refresh                           reload both collections
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Show(Option<CollectionKind>),
    More(CollectionKind),
    Search(CollectionKind, String),
    Sort(CollectionKind, String, SortDirection),
    Edit(CollectionKind, DraftEdit),
    Save(CollectionKind),
    Cancel(CollectionKind),
    Delete(CollectionKind, RowId),
    Refresh,
    Help,
    Quit,
}

fn usage(msg: &str) -> RelatedListsError {
    RelatedListsError::InvalidCommand(msg.to_string())
}

fn collection_arg<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<CollectionKind> {
    words
        .next()
        .ok_or_else(|| usage(&format!("usage: {what}")))?
        .parse()
}

impl ShellCommand {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        if verb.starts_with('#') {
            return Ok(None);
        }

        let command = match verb {
            "show" | "ls" => {
                let kind = match words.next() {
                    Some(word) => Some(word.parse()?),
                    None => None,
                };
                ShellCommand::Show(kind)
            }
            "more" => ShellCommand::More(collection_arg(&mut words, "more <collection>")?),
            "search" => {
                let kind = collection_arg(&mut words, "search <collection> [term...]")?;
                ShellCommand::Search(kind, words.collect::<Vec<_>>().join(" "))
            }
            "sort" => {
                let kind = collection_arg(&mut words, "sort <collection> <field> [asc|desc]")?;
                let field = words
                    .next()
                    .ok_or_else(|| usage("usage: sort <collection> <field> [asc|desc]"))?;
                let direction = match words.next() {
                    Some(d) => d.parse()?,
                    None => SortDirection::default(),
                };
                ShellCommand::Sort(kind, field.to_string(), direction)
            }
            "edit" => {
                let kind = collection_arg(&mut words, "edit <collection> <id> field=value...")?;
                let id = words
                    .next()
                    .ok_or_else(|| usage("usage: edit <collection> <id> field=value..."))?;
                let assignments: Vec<&str> = words.collect();
                ShellCommand::Edit(kind, DraftEdit::parse(id, &assignments)?)
            }
            "save" => ShellCommand::Save(collection_arg(&mut words, "save <collection>")?),
            "cancel" => ShellCommand::Cancel(collection_arg(&mut words, "cancel <collection>")?),
            "delete" | "rm" => {
                let kind = collection_arg(&mut words, "delete <collection> <id>")?;
                let id = words
                    .next()
                    .ok_or_else(|| usage("usage: delete <collection> <id>"))?;
                ShellCommand::Delete(kind, RowId::from(id))
            }
            "refresh" => ShellCommand::Refresh,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => {
                return Err(usage(&format!("unknown command '{other}', try 'help'")));
            }
        };
        Ok(Some(command))
    }
}

fn print_view(lists: &RelatedLists, kind: CollectionKind) {
    let drafts = lists.collection(kind).drafts();
    println!("{}", render_view(&lists.view(kind), &drafts));
}

fn print_event(event: &ControllerEvent) {
    println!("{}", format_event(event));
}

fn is_search_outcome(event: &ControllerEvent, kind: CollectionKind, query: &str) -> bool {
    match event {
        ControllerEvent::SearchCompleted {
            collection, term, ..
        }
        | ControllerEvent::SearchFailed {
            collection, term, ..
        } => *collection == kind && term == query,
        _ => false,
    }
}

/// Wait for the outcome of the debounced search for `query`.
async fn wait_for_search(
    rx: &mut broadcast::Receiver<ControllerEvent>,
    kind: CollectionKind,
    query: &str,
    debounce: Duration,
) -> Option<ControllerEvent> {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(event) if is_search_outcome(&event, kind, query) => return Some(event),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    };
    tokio::time::timeout(debounce + SEARCH_WAIT, wait)
        .await
        .ok()
        .flatten()
}

/// Run one command. Returns false when the shell should exit.
async fn execute(lists: &RelatedLists, command: ShellCommand, config: &Config) -> bool {
    match command {
        ShellCommand::Show(Some(kind)) => print_view(lists, kind),
        ShellCommand::Show(None) => {
            for kind in CollectionKind::ALL {
                print_view(lists, kind);
            }
        }
        ShellCommand::More(kind) => {
            match lists.load_more(kind).await {
                Some(event) => print_event(&event),
                None => println!("{}", "nothing more to load".dimmed()),
            }
            print_view(lists, kind);
        }
        ShellCommand::Search(kind, term) => {
            let query = term.trim().to_string();
            let mut rx = lists.subscribe();
            lists.set_search_term(kind, &term);
            if !query.is_empty() {
                match wait_for_search(&mut rx, kind, &query, config.search_debounce()).await {
                    Some(event) => print_event(&event),
                    None => println!("{}", "search did not complete".yellow()),
                }
            }
            print_view(lists, kind);
        }
        ShellCommand::Sort(kind, field, direction) => {
            lists.apply_sort(kind, &field, direction);
            print_view(lists, kind);
        }
        ShellCommand::Edit(kind, edit) => {
            let id = edit.id.clone();
            lists.stage_edit(kind, edit);
            println!("staged edit for {} in {}", id.cyan(), kind);
        }
        ShellCommand::Save(kind) => {
            print_event(&lists.save(kind).await);
            print_view(lists, kind);
        }
        ShellCommand::Cancel(kind) => {
            lists.cancel_drafts(kind);
            println!("discarded pending {kind} edits");
        }
        ShellCommand::Delete(kind, id) => {
            print_event(&lists.delete(kind, &id).await);
            print_view(lists, kind);
        }
        ShellCommand::Refresh => {
            print_event(&lists.refresh().await);
            for kind in CollectionKind::ALL {
                print_view(lists, kind);
            }
        }
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => return false,
    }
    true
}

/// Interactive loop over stdin until EOF or `quit`
pub async fn cmd_shell(config: &Config, data: &Path, parent: &str) -> Result<()> {
    let lists = open_lists(data, parent, config)?;

    for event in lists.initial_load().await {
        print_event(&event);
    }
    for kind in CollectionKind::ALL {
        print_view(&lists, kind);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ShellCommand::parse(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                if !execute(&lists, command, config).await {
                    break;
                }
            }
            Err(e) => eprintln!("{}", e.to_string().red()),
        }
    }

    lists.dispose();
    Ok(())
}
