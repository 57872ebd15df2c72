//! Column and team-name alias tables
//!
//! Raw league CSVs differ in header naming (football-data.co.uk uses FTHG,
//! other exports use home_goals) and in how they spell club names across
//! seasons. Both tables feed the normalizer in [`super::loader`].

/// Accepted header spellings per semantic field, matched case-insensitively,
/// exact first then substring.
pub const COLUMN_ALIASES: [(&str, &[&str]); 5] = [
    ("date", &["date", "match_date"]),
    ("home_team", &["home_team", "hometeam", "home"]),
    ("away_team", &["away_team", "awayteam", "away"]),
    ("home_goals", &["home_goals", "fthg", "hg", "home_score", "homegoals"]),
    ("away_goals", &["away_goals", "ftag", "ag", "away_score", "awaygoals"]),
];

/// Raw spelling -> canonical club name. Keeps one club's history from
/// splitting into two identities when sources disagree on naming.
const TEAM_ALIASES: &[(&str, &str)] = &[
    ("Man City", "Manchester City"),
    ("Man United", "Manchester United"),
    ("Nott'm Forest", "Nottingham Forest"),
    ("Newcastle", "Newcastle United"),
    ("Leicester", "Leicester City"),
    ("Ipswich", "Ipswich Town"),
    ("Wolverhampton", "Wolves"),
    ("West Ham United", "West Ham"),
];

/// Resolve a raw team name to its canonical spelling.
pub fn canonical_team(raw: &str) -> String {
    let trimmed = raw.trim();
    for (alias, canonical) in TEAM_ALIASES {
        if *alias == trimmed {
            return (*canonical).to_string();
        }
    }
    trimmed.to_string()
}
