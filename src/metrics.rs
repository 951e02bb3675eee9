use crate::records::Outcome;

/// Probability triple in `[HomeWin, Draw, AwayWin]` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassReport {
    pub outcome: Outcome,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl Prob3 {
    pub fn from_array(p: [f64; 3]) -> Self {
        Self {
            home: p[0],
            draw: p[1],
            away: p[2],
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.home, self.draw, self.away]
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::HomeWin => self.home,
            Outcome::Draw => self.draw,
            Outcome::AwayWin => self.away,
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    /// Highest probability; exact ties go to the earlier label
    /// (HomeWin, then Draw, then AwayWin).
    pub fn argmax(&self) -> Outcome {
        if self.home >= self.draw && self.home >= self.away {
            Outcome::HomeWin
        } else if self.draw >= self.away {
            Outcome::Draw
        } else {
            Outcome::AwayWin
        }
    }
}

pub fn evaluate_probs(predictions: &[Prob3], outcomes: &[Outcome]) -> Metrics {
    if predictions.is_empty() || outcomes.is_empty() || predictions.len() != outcomes.len() {
        return Metrics {
            samples: 0,
            brier: 0.0,
            log_loss: 0.0,
            accuracy: 0.0,
        };
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let y = one_hot(*outcome);
        brier_sum +=
            (p.home - y.home).powi(2) + (p.draw - y.draw).powi(2) + (p.away - y.away).powi(2);
        log_loss_sum += -p.get(*outcome).clamp(1e-12, 1.0).ln();
        if p.argmax() == *outcome {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

/// Per-class precision / recall / F1, in `Outcome::ORDERED` order.
pub fn classification_report(predicted: &[Outcome], actual: &[Outcome]) -> Vec<ClassReport> {
    Outcome::ORDERED
        .iter()
        .map(|&class| {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_ = 0usize;
            for (p, a) in predicted.iter().zip(actual) {
                match (*p == class, *a == class) {
                    (true, true) => tp += 1,
                    (true, false) => fp += 1,
                    (false, true) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassReport {
                outcome: class,
                precision,
                recall,
                f1,
                support: tp + fn_,
            }
        })
        .collect()
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn one_hot(outcome: Outcome) -> Prob3 {
    let mut p = [0.0; 3];
    p[outcome.index()] = 1.0;
    Prob3::from_array(p)
}
