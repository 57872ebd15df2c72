//! League registry
//!
//! Process-wide map from league id to its trained classifier and
//! end-of-history team forms. Built once at startup and read-only
//! thereafter; request handlers share it behind an `Arc` with no locking.
//! Snapshots hold the classifier as extracted plain-array weights, so the
//! whole registry is `Send + Sync`. Unknown leagues and teams degrade to a
//! neutral forecast instead of erroring, which is part of the serving
//! contract.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use burn::backend::ndarray::{NdArray, NdArrayDevice};
use serde::{Deserialize, Serialize};

use crate::data::aliases::canonical_team;
use crate::data::loader;
use crate::features::form::{FormLedger, FormWindow};
use crate::features::projector::{self, FeatureScaler};
use crate::model::{LabelDecoder, OutcomeNet, ServingClassifier};
use crate::{Config, FootyError, Result};

/// Neutral forecast used when a league or team is unknown. The slight home
/// edge matches the long-run home-advantage base rate, so the fallback
/// label is "home".
const FALLBACK_PROBS: OutcomeProbs = OutcomeProbs {
    home: 0.34,
    draw: 0.33,
    away: 0.33,
};

/// Probability distribution over the three outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbs {
    pub home: f32,
    pub draw: f32,
    pub away: f32,
}

impl OutcomeProbs {
    /// Label with the highest probability; ties break in the fixed
    /// home, draw, away order.
    pub fn label(&self) -> &'static str {
        let mut best = ("home", self.home);
        for (label, p) in [("draw", self.draw), ("away", self.away)] {
            if p > best.1 {
                best = (label, p);
            }
        }
        best.0
    }
}

/// Prediction output, serialized as-is on the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub label: String,
    pub probs: OutcomeProbs,
    pub home_form: Vec<char>,
    pub away_form: Vec<char>,
}

impl Forecast {
    fn fallback(home_form: Vec<char>, away_form: Vec<char>) -> Self {
        Forecast {
            label: FALLBACK_PROBS.label().to_string(),
            probs: FALLBACK_PROBS,
            home_form,
            away_form,
        }
    }
}

/// Sidecar metadata persisted next to the classifier weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotBundle {
    pub feature_version: u32,
    pub feature_order: Vec<String>,
    pub scaler: FeatureScaler,
    pub labels: LabelDecoder,
}

impl SnapshotBundle {
    pub fn new(scaler: FeatureScaler, labels: LabelDecoder) -> Self {
        SnapshotBundle {
            feature_version: projector::FEATURE_VERSION,
            feature_order: projector::FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            scaler,
            labels,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let bundle: SnapshotBundle = serde_json::from_str(&json)?;
        bundle.verify()?;
        Ok(bundle)
    }

    /// The feature contract is checked at load time, not discovered as
    /// nonsense probabilities at inference time.
    pub fn verify(&self) -> Result<()> {
        if self.feature_version != projector::FEATURE_VERSION {
            return Err(FootyError::FeatureContract(format!(
                "bundle feature version {} != expected {}",
                self.feature_version,
                projector::FEATURE_VERSION
            )));
        }
        if self.feature_order != projector::FEATURE_ORDER {
            return Err(FootyError::FeatureContract(format!(
                "bundle feature order {:?} != expected {:?}",
                self.feature_order,
                projector::FEATURE_ORDER
            )));
        }
        self.labels.validate()
    }
}

/// One discovered league directory. The id is the lowercased directory
/// name; the path keeps the directory's original spelling so filesystem
/// access works on case-sensitive filesystems.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueDir {
    pub id: String,
    pub path: PathBuf,
}

/// Everything the registry holds for one league.
pub struct LeagueSnapshot {
    pub classifier: ServingClassifier,
    pub scaler: FeatureScaler,
    pub labels: LabelDecoder,
    /// End-of-history form per canonical team name
    pub forms: HashMap<String, FormWindow>,
}

/// Immutable, read-mostly map of league id -> snapshot.
pub struct LeagueRegistry {
    leagues: HashMap<String, LeagueSnapshot>,
}

impl LeagueRegistry {
    pub fn new() -> Self {
        LeagueRegistry {
            leagues: HashMap::new(),
        }
    }

    /// Path of a league's weights file (without burn's extension).
    pub fn classifier_path(config: &Config, league_id: &str) -> PathBuf {
        Path::new(&config.data.model_dir).join(league_id).join("classifier")
    }

    /// Path of a league's sidecar bundle.
    pub fn bundle_path(config: &Config, league_id: &str) -> PathBuf {
        Path::new(&config.data.model_dir).join(league_id).join("bundle.json")
    }

    /// Build the registry from every league under the data dir that has a
    /// trained bundle. Leagues without one are skipped with a warning.
    pub fn load(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        for league in discover_leagues(Path::new(&config.data.data_dir))? {
            match load_league(config, &league) {
                Ok(snapshot) => {
                    log::info!(
                        "Loaded league '{}' ({} teams with form)",
                        league.id,
                        snapshot.forms.len()
                    );
                    registry.leagues.insert(league.id, snapshot);
                }
                Err(FootyError::NoModel(_)) => {
                    log::warn!("League '{}' has no trained model, skipping", league.id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(registry)
    }

    /// Insert a prebuilt snapshot. League ids are case-insensitive.
    pub fn insert(&mut self, league: &str, snapshot: LeagueSnapshot) {
        self.leagues.insert(league.to_lowercase(), snapshot);
    }

    pub fn has(&self, league: &str) -> bool {
        self.leagues.contains_key(&league.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.leagues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }

    pub fn league_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.leagues.keys().map(|k| k.as_str()).collect();
        ids.sort();
        ids
    }

    /// Predict a fixture. Never fails: unknown leagues or teams yield the
    /// neutral fallback, with trails filled from whichever side is known.
    pub fn predict(&self, league: &str, home_team: &str, away_team: &str) -> Forecast {
        let snapshot = match self.leagues.get(&league.to_lowercase()) {
            Some(s) => s,
            None => {
                log::debug!("Unknown league '{}', serving fallback", league);
                return Forecast::fallback(Vec::new(), Vec::new());
            }
        };

        let home = canonical_team(home_team);
        let away = canonical_team(away_team);
        let home_window = snapshot.forms.get(&home);
        let away_window = snapshot.forms.get(&away);

        let home_form = home_window.map(|w| w.trail()).unwrap_or_default();
        let away_form = away_window.map(|w| w.trail()).unwrap_or_default();

        let (home_window, away_window) = match (home_window, away_window) {
            (Some(h), Some(a)) => (h, a),
            _ => {
                log::debug!(
                    "Unknown team in '{}' vs '{}', serving fallback",
                    home,
                    away
                );
                return Forecast::fallback(home_form, away_form);
            }
        };

        let features = snapshot
            .scaler
            .apply(projector::project(home_window, away_window));
        let raw = snapshot.classifier.probabilities(features);

        let probs = OutcomeProbs {
            home: snapshot.labels.probability_of(&raw, "home"),
            draw: snapshot.labels.probability_of(&raw, "draw"),
            away: snapshot.labels.probability_of(&raw, "away"),
        };

        Forecast {
            label: probs.label().to_string(),
            probs,
            home_form,
            away_form,
        }
    }
}

impl Default for LeagueRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Load one league's persisted model and replay its history for forms.
fn load_league(config: &Config, league: &LeagueDir) -> Result<LeagueSnapshot> {
    let classifier_path = LeagueRegistry::classifier_path(config, &league.id);
    let bundle_path = LeagueRegistry::bundle_path(config, &league.id);
    // Burn appends .mpk to the record path
    let weights_file = classifier_path.with_extension("mpk");
    if !weights_file.exists() || !bundle_path.exists() {
        return Err(FootyError::NoModel(league.id.clone()));
    }

    let bundle = SnapshotBundle::load(&bundle_path)?;
    let device = NdArrayDevice::default();
    let classifier = OutcomeNet::<NdArray<f32>>::load(
        &device,
        classifier_path
            .to_str()
            .ok_or_else(|| FootyError::Config("non-utf8 model path".to_string()))?,
    )?
    .export()?;

    // Replay the league's history for end-of-history forms
    let report = loader::load_league_dir(&league.path, config.data.dayfirst)?;
    let mut ledger = FormLedger::new(config.form.window);
    ledger.process(&report.events);

    Ok(LeagueSnapshot {
        classifier,
        scaler: bundle.scaler,
        labels: bundle.labels,
        forms: ledger.into_forms(),
    })
}

/// Enumerate league subdirectories of the data dir, sorted by id. Ids are
/// lowercased; paths keep the on-disk spelling.
pub fn discover_leagues(data_dir: &Path) -> Result<Vec<LeagueDir>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }
    let mut leagues: Vec<LeagueDir> = std::fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            e.file_name().to_str().map(|name| LeagueDir {
                id: name.to_lowercase(),
                path: e.path(),
            })
        })
        .collect();
    leagues.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(leagues)
}

/// Render a forecast for terminal display.
pub fn format_forecast(forecast: &Forecast, home_name: &str, away_name: &str) -> String {
    let trail = |form: &[char]| -> String {
        if form.is_empty() {
            "-".to_string()
        } else {
            form.iter().collect()
        }
    };

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  Call:       {}
│  Home win:   {:.1}%
│  Draw:       {:.1}%
│  Away win:   {:.1}%
│  Form:       {} {} | {} {}
└─────────────────────────────────────────────────┘
"#,
        home_name,
        away_name,
        forecast.label,
        forecast.probs.home * 100.0,
        forecast.probs.draw * 100.0,
        forecast.probs.away * 100.0,
        home_name,
        trail(&forecast.home_form),
        away_name,
        trail(&forecast.away_form),
    )
}
