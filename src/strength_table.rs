//! The persisted team-strength table: one CSV of per-team rows plus a
//! normalized CSV holding each team's recent-form sequence.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PredictError, Result};
use crate::team_strength::{FORM_WINDOW, TeamStrengthRow};

/// Column order of the strength CSV. Producer and consumer both check it.
pub const STRENGTH_COLUMNS: [&str; 24] = [
    "team",
    "position",
    "played",
    "wins",
    "draws",
    "losses",
    "goals_for",
    "goals_against",
    "goal_diff",
    "points",
    "home_wins",
    "home_draws",
    "home_losses",
    "away_wins",
    "away_draws",
    "away_losses",
    "weighted_home_wins",
    "weighted_home_draws",
    "weighted_home_losses",
    "weighted_away_wins",
    "weighted_away_draws",
    "weighted_away_losses",
    "form_total",
    "strength_weighted_form",
];

pub const FORM_COLUMNS: [&str; 3] = ["team", "seq", "result"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FormEntry {
    team: String,
    seq: u32,
    result: i8,
}

/// Read-only lookup over team-strength rows, keyed by exact team name.
#[derive(Debug, Clone, Default)]
pub struct StrengthTable {
    rows: Vec<TeamStrengthRow>,
    index: HashMap<String, usize>,
}

impl StrengthTable {
    /// Later rows with a duplicate name are rejected.
    pub fn from_rows(rows: Vec<TeamStrengthRow>) -> Result<Self> {
        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if index.insert(row.team.clone(), i).is_some() {
                return Err(PredictError::InvalidData(format!(
                    "duplicate team row {:?}",
                    row.team
                )));
            }
        }
        Ok(Self { rows, index })
    }

    pub fn get(&self, team: &str) -> Option<&TeamStrengthRow> {
        self.index.get(team).map(|&i| &self.rows[i])
    }

    /// Exact-key lookup that fails with `UnknownTeam`.
    pub fn require(&self, team: &str) -> Result<&TeamStrengthRow> {
        self.get(team)
            .ok_or_else(|| PredictError::UnknownTeam(team.to_string()))
    }

    pub fn rows(&self) -> &[TeamStrengthRow] {
        &self.rows
    }

    pub fn team_names(&self) -> Vec<&str> {
        let mut names = self.rows.iter().map(|r| r.team.as_str()).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Loads both CSVs and checks their headers and the form sequences.
    pub fn load(stats_path: &Path, form_path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(stats_path)?;
        check_header(stats_path, reader.headers()?, &STRENGTH_COLUMNS)?;
        let rows = reader
            .deserialize::<TeamStrengthRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut table = Self::from_rows(rows)?;

        let mut reader = csv::Reader::from_path(form_path)?;
        check_header(form_path, reader.headers()?, &FORM_COLUMNS)?;
        let mut entries = reader
            .deserialize::<FormEntry>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        entries.sort_by(|a, b| a.team.cmp(&b.team).then(a.seq.cmp(&b.seq)));

        for entry in entries {
            let Some(&i) = table.index.get(&entry.team) else {
                return Err(PredictError::InvalidData(format!(
                    "form row for unknown team {:?}",
                    entry.team
                )));
            };
            if !(-1..=1).contains(&entry.result) {
                return Err(PredictError::InvalidData(format!(
                    "form result {} for {:?} is outside -1..=1",
                    entry.result, entry.team
                )));
            }
            let form = &mut table.rows[i].form_last_5;
            if entry.seq as usize != form.len() || form.len() >= FORM_WINDOW {
                return Err(PredictError::InvalidData(format!(
                    "form sequence for {:?} is not contiguous at seq {}",
                    entry.team, entry.seq
                )));
            }
            form.push(entry.result);
        }

        for row in &table.rows {
            let sum: i32 = row.form_last_5.iter().map(|&r| r as i32).sum();
            if sum != row.form_total {
                return Err(PredictError::InvalidData(format!(
                    "form_total {} for {:?} disagrees with form rows (sum {})",
                    row.form_total, row.team, sum
                )));
            }
        }
        Ok(table)
    }

    /// Writes both CSVs through temp files, renaming only after both are complete.
    pub fn save(&self, stats_path: &Path, form_path: &Path) -> Result<()> {
        let stats_tmp = tmp_path(stats_path);
        let form_tmp = tmp_path(form_path);
        for path in [stats_path, form_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(&stats_tmp)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        if self.rows.is_empty() {
            writer.write_record(STRENGTH_COLUMNS)?;
        }
        writer.flush()?;

        let mut writer = csv::Writer::from_path(&form_tmp)?;
        writer.write_record(FORM_COLUMNS)?;
        for row in &self.rows {
            for (seq, result) in row.form_last_5.iter().enumerate() {
                writer.write_record(&[row.team.clone(), seq.to_string(), result.to_string()])?;
            }
        }
        writer.flush()?;

        commit_pair(&stats_tmp, stats_path, &form_tmp, form_path)
    }
}

/// Renames both temp files into place. If the form rename fails, the previous
/// stats file is put back so the pair on disk stays consistent.
fn commit_pair(stats_tmp: &Path, stats_path: &Path, form_tmp: &Path, form_path: &Path) -> Result<()> {
    let backup = tmp_path(stats_path).with_extension("bak");
    let had_previous = stats_path.exists();
    if had_previous {
        fs::rename(stats_path, &backup)?;
    }
    if let Err(err) = fs::rename(stats_tmp, stats_path) {
        if had_previous {
            let _ = fs::rename(&backup, stats_path);
        }
        return Err(err.into());
    }
    if let Err(err) = fs::rename(form_tmp, form_path) {
        if had_previous {
            let _ = fs::rename(&backup, stats_path);
        } else {
            let _ = fs::remove_file(stats_path);
        }
        let _ = fs::remove_file(form_tmp);
        return Err(err.into());
    }
    if had_previous {
        let _ = fs::remove_file(&backup);
    }
    Ok(())
}

fn check_header(path: &Path, found: &csv::StringRecord, expected: &[&str]) -> Result<()> {
    if found.iter().eq(expected.iter().copied()) {
        return Ok(());
    }
    Err(PredictError::SchemaDrift {
        file: path.to_path_buf(),
        expected: expected.join(","),
        found: found.iter().collect::<Vec<_>>().join(","),
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_header_matches_column_list() {
        let row = TeamStrengthRow {
            team: "Arsenal FC".to_string(),
            position: 1,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_diff: 0,
            points: 0,
            home_wins: 0,
            home_draws: 0,
            home_losses: 0,
            away_wins: 0,
            away_draws: 0,
            away_losses: 0,
            weighted_home_wins: 0.0,
            weighted_home_draws: 0.0,
            weighted_home_losses: 0.0,
            weighted_away_wins: 0.0,
            weighted_away_draws: 0.0,
            weighted_away_losses: 0.0,
            form_total: 0,
            strength_weighted_form: 0.0,
            form_last_5: vec![1, 0],
        };
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&row).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = out.lines().next().unwrap();
        assert_eq!(header, STRENGTH_COLUMNS.join(","));
    }
}
