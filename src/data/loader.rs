//! Match record normalizer
//!
//! Turns a folder of heterogeneous league CSVs into one chronologically
//! ordered sequence of [`MatchEvent`]s. Malformed rows are dropped and
//! counted; a file whose columns cannot be resolved is skipped with a
//! warning, never fatal to the rest of the league.

use chrono::NaiveDate;
use std::path::Path;

use super::aliases::{canonical_team, COLUMN_ALIASES};
use crate::{FootyError, MatchEvent, Result};

/// Outcome of loading one league folder.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// All events, sorted by date (stable, so input order breaks ties)
    pub events: Vec<MatchEvent>,
    pub files_read: usize,
    pub files_skipped: usize,
    /// Rows dropped for bad dates or home == away
    pub rows_skipped: usize,
}

/// Load and normalize every `*.csv` file in a league directory.
pub fn load_league_dir(dir: &Path, dayfirst: bool) -> Result<LoadReport> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut report = LoadReport::default();
    for path in &paths {
        match load_file(path, dayfirst) {
            Ok((events, skipped)) => {
                log::debug!(
                    "{}: {} events, {} rows skipped",
                    path.display(),
                    events.len(),
                    skipped
                );
                report.events.extend(events);
                report.rows_skipped += skipped;
                report.files_read += 1;
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                report.files_skipped += 1;
            }
        }
    }

    // Stable sort keeps input order for same-day fixtures
    report.events.sort_by_key(|e| e.date);
    Ok(report)
}

/// Parse one CSV file into normalized events plus a skipped-row count.
pub fn load_file(path: &Path, dayfirst: bool) -> Result<(Vec<MatchEvent>, usize)> {
    // Lossy conversion tolerates latin-1 club names in older season files
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    parse_csv(&text, dayfirst)
}

/// Parse CSV text into normalized events plus a skipped-row count.
pub fn parse_csv(text: &str, dayfirst: bool) -> Result<(Vec<MatchEvent>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    let mut events = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        let date = match record.get(columns.date).and_then(|s| parse_date(s, dayfirst)) {
            Some(d) => d,
            None => {
                skipped += 1;
                continue;
            }
        };

        let home_team = canonical_team(record.get(columns.home_team).unwrap_or(""));
        let away_team = canonical_team(record.get(columns.away_team).unwrap_or(""));
        if home_team.is_empty() || away_team.is_empty() || home_team == away_team {
            skipped += 1;
            continue;
        }

        events.push(MatchEvent {
            date,
            home_team,
            away_team,
            home_goals: parse_goals(record.get(columns.home_goals).unwrap_or("")),
            away_goals: parse_goals(record.get(columns.away_goals).unwrap_or("")),
        });
    }

    Ok((events, skipped))
}

/// Resolved column indices for the five required fields.
struct ColumnIndices {
    date: usize,
    home_team: usize,
    away_team: usize,
    home_goals: usize,
    away_goals: usize,
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<ColumnIndices> {
    let mut indices = [0usize; 5];
    for (slot, (field, aliases)) in COLUMN_ALIASES.iter().enumerate() {
        indices[slot] = resolve_column(headers, field, aliases)?;
    }
    Ok(ColumnIndices {
        date: indices[0],
        home_team: indices[1],
        away_team: indices[2],
        home_goals: indices[3],
        away_goals: indices[4],
    })
}

/// Find the header matching a field: exact case-insensitive match over the
/// alias list first, then substring match.
fn resolve_column(
    headers: &csv::StringRecord,
    field: &'static str,
    aliases: &[&str],
) -> Result<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    for alias in aliases {
        if let Some(idx) = lowered.iter().position(|h| h == alias) {
            return Ok(idx);
        }
    }
    for alias in aliases {
        if let Some(idx) = lowered.iter().position(|h| h.contains(alias)) {
            return Ok(idx);
        }
    }
    Err(FootyError::ColumnNotFound { field })
}

/// Lenient goal parser: garbled score data degrades to 0 rather than
/// aborting the file.
fn parse_goals(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v as u32,
        _ => 0,
    }
}

/// Parse a date, honoring the day-first locale flag for slash formats.
/// ISO dates are always accepted.
fn parse_date(raw: &str, dayfirst: bool) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let formats: &[&str] = if dayfirst {
        &["%d/%m/%Y", "%d/%m/%y", "%Y-%m-%d", "%d-%m-%Y"]
    } else {
        &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d/%m/%Y"]
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_alias_columns() {
        let csv = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n\
                   05/01/2024,Arsenal,Chelsea,2,1\n";
        let (events, skipped) = parse_csv(csv, true).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].home_team, "Arsenal");
        assert_eq!(events[0].home_goals, 2);
        assert_eq!(events[0].away_goals, 1);
        assert_eq!(
            events[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }

    #[test]
    fn test_substring_column_match() {
        // "match_date_utc" only matches by substring
        let csv = "match_date_utc,home_team,away_team,home_goals,away_goals\n\
                   2024-01-05,Everton,Fulham,0,0\n";
        let (events, _) = parse_csv(csv, false).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].result(), crate::MatchResult::Draw);
    }

    #[test]
    fn test_missing_column_is_error() {
        let csv = "Date,HomeTeam,AwayTeam,FTHG\n05/01/2024,A,B,1\n";
        let err = parse_csv(csv, true).unwrap_err();
        match err {
            FootyError::ColumnNotFound { field } => assert_eq!(field, "away_goals"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_team_aliasing_applied() {
        let csv = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n\
                   05/01/2024,Man City,Newcastle,3,1\n";
        let (events, _) = parse_csv(csv, true).unwrap();
        assert_eq!(events[0].home_team, "Manchester City");
        assert_eq!(events[0].away_team, "Newcastle United");
    }

    #[test]
    fn test_garbled_goals_default_to_zero() {
        let csv = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n\
                   05/01/2024,Arsenal,Chelsea,abc,\n";
        let (events, skipped) = parse_csv(csv, true).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(events[0].home_goals, 0);
        assert_eq!(events[0].away_goals, 0);
    }

    #[test]
    fn test_bad_rows_dropped() {
        let csv = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n\
                   not-a-date,Arsenal,Chelsea,1,0\n\
                   05/01/2024,Wolverhampton,Wolves,1,0\n\
                   06/01/2024,Arsenal,Chelsea,1,0\n";
        // Row 1 has a bad date; row 2 collapses to Wolves vs Wolves after
        // aliasing; only row 3 survives.
        let (events, skipped) = parse_csv(csv, true).unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_dayfirst_parsing() {
        assert_eq!(
            parse_date("05/01/2024", true),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(
            parse_date("05/01/2024", false),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        // ISO accepted either way
        assert_eq!(
            parse_date("2024-01-05", true),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn test_events_sorted_by_date() {
        let dir = std::env::temp_dir().join(format!("footy_loader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("b.csv"),
            "Date,HomeTeam,AwayTeam,FTHG,FTAG\n02/01/2024,C,D,1,1\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("a.csv"),
            "Date,HomeTeam,AwayTeam,FTHG,FTAG\n08/01/2024,A,B,2,0\n01/01/2024,A,B,0,1\n",
        )
        .unwrap();
        // A file with unusable headers is skipped, not fatal
        std::fs::write(dir.join("junk.csv"), "foo,bar\n1,2\n").unwrap();

        let report = load_league_dir(&dir, true).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(report.files_read, 2);
        assert_eq!(report.files_skipped, 1);
        let dates: Vec<_> = report.events.iter().map(|e| e.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(report.events.len(), 3);
    }
}
