//! Import command for one-shot ingestion of local unlock files.

use std::io::Write;

use ach_watch::{AchievementObserver, ImportSummary};
use anyhow::Result;

pub async fn run<W: Write>(writer: &mut W, observer: &AchievementObserver) -> Result<()> {
    let summaries = observer.import_local().await?;
    write_summaries(writer, &summaries)
}

fn write_summaries<W: Write>(writer: &mut W, summaries: &[ImportSummary]) -> Result<()> {
    if summaries.is_empty() {
        writeln!(writer, "Nothing to import.")?;
        return Ok(());
    }

    for summary in summaries {
        if summary.total == 0 {
            writeln!(
                writer,
                "{} ({}): no achievement metadata",
                summary.title, summary.game_id
            )?;
        } else {
            writeln!(
                writer,
                "{} ({}): {}/{} unlocked",
                summary.title, summary.game_id, summary.unlocked, summary.total
            )?;
        }
    }
    writeln!(writer, "Imported {} game(s).", summaries.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn import_summary_output() {
        let summaries = vec![
            ImportSummary {
                game_id: "440".to_string(),
                title: "Team Fortress 2".to_string(),
                total: 2,
                unlocked: 1,
                newly_unlocked: 1,
            },
            ImportSummary {
                game_id: "999".to_string(),
                title: "Obscure Game".to_string(),
                total: 0,
                unlocked: 0,
                newly_unlocked: 0,
            },
        ];

        let mut out = Vec::new();
        write_summaries(&mut out, &summaries).unwrap();
        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Team Fortress 2 (440): 1/2 unlocked
        Obscure Game (999): no achievement metadata
        Imported 2 game(s).
        ");
    }

    #[test]
    fn import_with_nothing_to_do() {
        let mut out = Vec::new();
        write_summaries(&mut out, &[]).unwrap();
        assert_snapshot!(String::from_utf8(out).unwrap(), @"Nothing to import.");
    }
}
