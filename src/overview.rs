use crate::team_strength::TeamStrengthRow;

/// Display fields for one team, in presentation order. `Form` is left out
/// when the team has no recorded results.
pub fn team_overview(row: &TeamStrengthRow) -> Vec<(&'static str, String)> {
    let mut out = vec![
        ("Position", row.position.to_string()),
        ("Played", row.played.to_string()),
        ("Wins", row.wins.to_string()),
        ("Draws", row.draws.to_string()),
        ("Losses", row.losses.to_string()),
        ("Goals For", row.goals_for.to_string()),
        ("Goals Against", row.goals_against.to_string()),
        ("Points", row.points.to_string()),
    ];
    if let Some(form) = form_symbols(&row.form_last_5) {
        out.push(("Form", form));
    }
    out
}

/// `[1, 0, -1]` renders as `"W D L"`, oldest first.
pub fn form_symbols(results: &[i8]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let symbols = results
        .iter()
        .map(|r| match r {
            1 => "W",
            0 => "D",
            _ => "L",
        })
        .collect::<Vec<_>>();
    Some(symbols.join(" "))
}
