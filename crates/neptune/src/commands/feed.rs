//! `neptune feed <A-D>` / `neptune feed --cancel`
//!
//! One-shot: the controller runs its own feed timer, so no local
//! countdown is kept.

use serde::Serialize;

use neptune_core::{Controller, FeedMode, FeedState};

use crate::cli::{FeedArgs, FeedLetter, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct FeedResult {
    mode: Option<FeedMode>,
    state: FeedState,
}

impl From<FeedLetter> for FeedMode {
    fn from(letter: FeedLetter) -> Self {
        match letter {
            FeedLetter::A => FeedMode::A,
            FeedLetter::B => FeedMode::B,
            FeedLetter::C => FeedMode::C,
            FeedLetter::D => FeedMode::D,
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: FeedArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mode = args.mode.map(FeedMode::from);
    let Some(start) = mode.filter(|_| !args.cancel) else {
        controller.connect().await?;
        // The cancel command carries no mode.
        let state = controller.update_feed_mode(FeedMode::A, true).await;
        return print(global, &FeedResult { mode: None, state });
    };

    controller.connect().await?;
    let state = controller.update_feed_mode(start, false).await;
    print(global, &FeedResult { mode, state })
}

fn print(global: &GlobalOpts, result: &FeedResult) -> Result<(), CliError> {
    let out = output::render_single(global.output, result, |r| match (r.mode, r.state) {
        (Some(mode), FeedState::Active) => format!("Feed {mode} started"),
        _ => "Feed cycle cancelled".into(),
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
