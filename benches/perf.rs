use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pl_predictor::football_data::parse_matches_json;
use pl_predictor::predictor::Predictor;
use pl_predictor::records::{MatchRecord, MatchStatus, Score, TeamRecord};
use pl_predictor::strength_table::StrengthTable;
use pl_predictor::team_strength::{PriorSeason, build_team_strength};
use pl_predictor::training::{self, TrainConfig};

const TEAM_COUNT: usize = 20;

fn team_name(i: usize) -> String {
    format!("Team {i:02} FC")
}

fn standings() -> Vec<TeamRecord> {
    (0..TEAM_COUNT)
        .map(|i| {
            let wins = (TEAM_COUNT - i) as u32;
            let draws = (i % 4) as u32;
            let losses = 38 - wins - draws;
            TeamRecord {
                team: team_name(i),
                position: i as u32 + 1,
                played: 38,
                wins,
                draws,
                losses,
                goals_for: 40 + wins as i32,
                goals_against: 40 + losses as i32,
                goal_diff: wins as i32 - losses as i32,
                points: 3 * wins as i32 + draws as i32,
            }
        })
        .collect()
}

/// Double round robin with a deterministic scoreline per pairing.
fn season() -> Vec<MatchRecord> {
    let start = Utc.with_ymd_and_hms(2024, 8, 16, 19, 0, 0).unwrap();
    let mut out = Vec::with_capacity(TEAM_COUNT * (TEAM_COUNT - 1));
    for h in 0..TEAM_COUNT {
        for a in 0..TEAM_COUNT {
            if h == a {
                continue;
            }
            out.push(MatchRecord {
                kickoff: start + Duration::hours((out.len() * 7) as i64),
                home_team: team_name(h),
                away_team: team_name(a),
                score: Some(Score {
                    home: ((h * 7 + a) % 4) as u32,
                    away: ((a * 5 + h) % 3) as u32,
                }),
                status: MatchStatus::Finished,
            });
        }
    }
    out
}

fn matches_json(matches: &[MatchRecord]) -> String {
    let rows = matches
        .iter()
        .map(|m| {
            let score = m.score.unwrap_or(Score { home: 0, away: 0 });
            format!(
                r#"{{"utcDate":"{}","status":"FINISHED","homeTeam":{{"name":"{}"}},"awayTeam":{{"name":"{}"}},"score":{{"fullTime":{{"home":{},"away":{}}}}}}}"#,
                m.kickoff.to_rfc3339(),
                m.home_team,
                m.away_team,
                score.home,
                score.away
            )
        })
        .collect::<Vec<_>>();
    format!(r#"{{"matches":[{}]}}"#, rows.join(","))
}

fn bench_matches_parse(c: &mut Criterion) {
    let raw = matches_json(&season());
    c.bench_function("matches_parse", |b| {
        b.iter(|| {
            let rows = parse_matches_json(black_box(&raw)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_team_strength(c: &mut Criterion) {
    let table = standings();
    let matches = season();
    let top = table.iter().map(|r| r.team.clone()).collect::<HashSet<_>>();
    c.bench_function("build_team_strength", |b| {
        b.iter(|| {
            let rows = build_team_strength(
                black_box(&table),
                black_box(&matches),
                PriorSeason {
                    top_flight_teams: &top,
                    top_flight_matches: &matches,
                    lower_division_matches: &[],
                },
            );
            black_box(rows.len());
        })
    });
}

fn bench_predict_all_pairs(c: &mut Criterion) {
    let top = HashSet::new();
    let rows = build_team_strength(
        &standings(),
        &season(),
        PriorSeason {
            top_flight_teams: &top,
            top_flight_matches: &[],
            lower_division_matches: &[],
        },
    );
    let table = StrengthTable::from_rows(rows).unwrap();
    let report = training::train(
        &table,
        TrainConfig {
            max_iters: 200,
            ..TrainConfig::default()
        },
    )
    .unwrap();
    let predictor = Predictor::new(table, report.model);
    let names = predictor
        .table()
        .team_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    c.bench_function("predict_all_pairs", |b| {
        b.iter(|| {
            let mut home_wins = 0usize;
            for home in &names {
                for away in &names {
                    if home != away
                        && predictor.predict(home, away).unwrap().label
                            == pl_predictor::records::Outcome::HomeWin
                    {
                        home_wins += 1;
                    }
                }
            }
            black_box(home_wins);
        })
    });
}

criterion_group!(
    benches,
    bench_matches_parse,
    bench_team_strength,
    bench_predict_all_pairs
);
criterion_main!(benches);
