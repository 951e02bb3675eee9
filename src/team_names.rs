//! Lenient team-name resolution for user input. Prediction itself only
//! accepts exact names; this helper maps codes and fragments onto them.

use std::collections::HashMap;

use crate::error::{PredictError, Result};
use crate::strength_table::StrengthTable;

const TEAM_ALIASES: &[(&str, &str)] = &[
    ("ARS", "Arsenal FC"),
    ("AVL", "Aston Villa FC"),
    ("BOU", "AFC Bournemouth"),
    ("BRE", "Brentford FC"),
    ("BRI", "Brighton & Hove Albion FC"),
    ("BUR", "Burnley FC"),
    ("CHE", "Chelsea FC"),
    ("CRY", "Crystal Palace FC"),
    ("EVE", "Everton FC"),
    ("FUL", "Fulham FC"),
    ("IPS", "Ipswich Town FC"),
    ("LEE", "Leeds United FC"),
    ("LEI", "Leicester City FC"),
    ("LIV", "Liverpool FC"),
    ("MCI", "Manchester City FC"),
    ("MUN", "Manchester United FC"),
    ("NEW", "Newcastle United FC"),
    ("NFO", "Nottingham Forest FC"),
    ("SHU", "Sheffield United FC"),
    ("SOU", "Southampton FC"),
    ("SUN", "Sunderland AFC"),
    ("TOT", "Tottenham Hotspur FC"),
    ("WHU", "West Ham United FC"),
    ("WOL", "Wolverhampton Wanderers FC"),
];

/// Built once from the loaded table and passed to whoever needs it.
#[derive(Debug, Clone)]
pub struct TeamNameResolver {
    /// (lowercase, canonical) in table order.
    names: Vec<(String, String)>,
    aliases: HashMap<&'static str, &'static str>,
}

impl TeamNameResolver {
    pub fn new<'a>(teams: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            names: teams
                .into_iter()
                .map(|t| (t.to_lowercase(), t.to_string()))
                .collect(),
            aliases: TEAM_ALIASES.iter().copied().collect(),
        }
    }

    pub fn from_table(table: &StrengthTable) -> Self {
        Self::new(table.team_names())
    }

    /// Alias code, then case-insensitive exact name, then first name containing
    /// the input. Alias targets absent from the table are skipped.
    pub fn resolve(&self, input: &str) -> Option<&str> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let code = needle.to_uppercase();
        if let Some(target) = self.aliases.get(code.as_str())
            && let Some((_, name)) = self.names.iter().find(|(_, n)| n == target)
        {
            return Some(name.as_str());
        }

        self.names
            .iter()
            .find(|(lower, _)| *lower == needle)
            .or_else(|| self.names.iter().find(|(lower, _)| lower.contains(&needle)))
            .map(|(_, name)| name.as_str())
    }

    /// `resolve`, failing with `UnknownTeam` carrying the raw input.
    pub fn require(&self, input: &str) -> Result<&str> {
        self.resolve(input)
            .ok_or_else(|| PredictError::UnknownTeam(input.trim().to_string()))
    }
}
