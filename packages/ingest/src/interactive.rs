#![allow(clippy::module_name_repetitions)]

//! Interactive explorer for the loaded datasets.
//!
//! Provides a menu-driven interface using `dialoguer` to toggle facets and
//! watch the statistics follow, without re-running the CLI per filter.

use dialoguer::{MultiSelect, Select};
use madrid_map_filter::{FacetKind, FacetToggle};

use crate::report::{format_snapshot, format_summary};
use crate::session::Session;
use crate::store::MarkerStore;

/// Top-level actions available in the explorer menu.
enum ExploreAction {
    Categories,
    Districts,
    Neighborhoods,
    ShowAll,
    ShowStatistics,
    ShowSummary,
    Reload,
    Quit,
}

impl ExploreAction {
    const ALL: &[Self] = &[
        Self::Categories,
        Self::Districts,
        Self::Neighborhoods,
        Self::ShowAll,
        Self::ShowStatistics,
        Self::ShowSummary,
        Self::Reload,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Categories => "Filter categories",
            Self::Districts => "Filter districts",
            Self::Neighborhoods => "Filter neighborhoods",
            Self::ShowAll => "Show everything",
            Self::ShowStatistics => "Show statistics",
            Self::ShowSummary => "Show load summary",
            Self::Reload => "Reload datasets",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the explorer loop over an already loaded session.
///
/// # Errors
///
/// Returns an error if the terminal prompt fails or a reload fails.
pub async fn run<S: MarkerStore>(
    session: &mut Session<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = ExploreAction::ALL.iter().map(ExploreAction::label).collect();

    loop {
        println!("\n{}", format_snapshot(session.snapshot()));

        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match ExploreAction::ALL[idx] {
            ExploreAction::Categories => choose_facets(session, FacetKind::Category)?,
            ExploreAction::Districts => choose_facets(session, FacetKind::District)?,
            ExploreAction::Neighborhoods => choose_facets(session, FacetKind::Neighborhood)?,
            ExploreAction::ShowAll => {
                for kind in FacetKind::all() {
                    session.select_all(*kind);
                }
            }
            ExploreAction::ShowStatistics => {
                println!("{}", serde_json::to_string_pretty(session.snapshot())?);
            }
            ExploreAction::ShowSummary => match session.summary() {
                Some(summary) => println!("{}", format_summary(summary)),
                None => println!("Nothing loaded yet."),
            },
            ExploreAction::Reload => {
                session.load().await?;
            }
            ExploreAction::Quit => return Ok(()),
        }
    }
}

/// Shows every known value of `kind` as a checkbox, pre-checked when
/// active, and applies the user's choice in one batch.
fn choose_facets<S: MarkerStore>(
    session: &mut Session<S>,
    kind: FacetKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let vocabulary = session.filter().vocabulary(kind);
    if vocabulary.is_empty() {
        println!("No {kind} values loaded.");
        return Ok(());
    }

    let labels: Vec<&str> = vocabulary.iter().map(|f| f.value_label()).collect();
    let defaults: Vec<bool> = vocabulary
        .iter()
        .map(|f| session.filter().is_active(f))
        .collect();

    let selected = MultiSelect::new()
        .with_prompt(format!(
            "Visible {kind} values (space=toggle, a=all, enter=confirm)"
        ))
        .items(&labels)
        .defaults(&defaults)
        .max_length(20)
        .interact()?;

    let toggles: Vec<FacetToggle> = vocabulary
        .into_iter()
        .enumerate()
        .map(|(i, facet)| FacetToggle {
            facet,
            selected: selected.contains(&i),
        })
        .collect();
    session.apply_all(&toggles);

    log::info!(
        "{} of {} {kind} values visible",
        selected.len(),
        toggles.len()
    );

    Ok(())
}
