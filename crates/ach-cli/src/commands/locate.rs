//! Locate command for listing cracker unlock files on disk.

use std::io::Write;
use std::path::PathBuf;

use ach_core::{Cracker, Locator};
use anyhow::Result;
use serde::Serialize;

/// One located unlock file.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedFile {
    pub game_id: String,
    pub cracker: Cracker,
    pub path: PathBuf,
    pub exists: bool,
}

/// Finds unlock files, optionally for one cracker and one game.
pub fn find(locator: &Locator, cracker: Option<Cracker>, game: Option<&str>) -> Vec<LocatedFile> {
    let found = match cracker {
        Some(cracker) => locator.locate(cracker, game),
        None => locator.locate_all(game),
    };

    found
        .into_iter()
        .flat_map(|(game_id, files)| {
            files.into_iter().map(move |file| LocatedFile {
                game_id: game_id.clone(),
                cracker: file.cracker,
                exists: file.exists(),
                path: file.path,
            })
        })
        .collect()
}

pub fn run<W: Write>(
    writer: &mut W,
    locator: &Locator,
    cracker: Option<Cracker>,
    game: Option<&str>,
    json: bool,
) -> Result<()> {
    let files = find(locator, cracker, game);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&files)?)?;
        return Ok(());
    }

    if files.is_empty() {
        writeln!(writer, "No unlock files found.")?;
        return Ok(());
    }

    writeln!(writer, "{:<12} {:<10} {:<8} PATH", "GAME", "CRACKER", "FILE")?;
    for file in &files {
        let state = if file.exists { "present" } else { "missing" };
        writeln!(
            writer,
            "{:<12} {:<10} {:<8} {}",
            file.game_id,
            file.cracker,
            state,
            file.path.display()
        )?;
    }
    Ok(())
}
