//! Problem factory
//!
//! Builds one falling arithmetic problem: display text, exact answer,
//! descent speed, spawn x and personality classification. Every family is
//! constructed so its text re-evaluates to the stored answer.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Difficulty;
use crate::consts::{ANSWER_DECIMALS, CHAR_WIDTH};
use crate::tuning::Tuning;

/// Operator families a problem can be drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorFamily {
    Addition,
    Subtraction,
    Multiplication,
    /// Always an exact integer quotient
    Division,
    /// Squares, cubes and 4th powers of small bases
    Exponent,
    /// Square/cube roots of precomputed perfect powers
    Root,
    /// One or two fractions evaluated to a decimal
    Fraction,
    /// One or two operations on one-decimal operands
    Decimal,
    /// Multi-step expression with precedence and grouping
    Complex,
}

impl OperatorFamily {
    pub const ALL: [OperatorFamily; 9] = [
        OperatorFamily::Addition,
        OperatorFamily::Subtraction,
        OperatorFamily::Multiplication,
        OperatorFamily::Division,
        OperatorFamily::Exponent,
        OperatorFamily::Root,
        OperatorFamily::Fraction,
        OperatorFamily::Decimal,
        OperatorFamily::Complex,
    ];

    /// Base complexity used for personality classification
    pub fn complexity(self) -> f32 {
        match self {
            OperatorFamily::Addition => 1.0,
            OperatorFamily::Subtraction => 1.2,
            OperatorFamily::Multiplication => 2.0,
            OperatorFamily::Division => 2.2,
            OperatorFamily::Exponent => 2.8,
            OperatorFamily::Root => 3.0,
            OperatorFamily::Decimal => 3.2,
            OperatorFamily::Fraction => 3.6,
            OperatorFamily::Complex => 4.0,
        }
    }
}

/// Behavioral/visual class of a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Personality {
    Friendly,
    Neutral,
    Aggressive,
    Boss,
}

/// Rendered size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    Giant,
}

impl Personality {
    pub fn size(self) -> SizeClass {
        match self {
            Personality::Friendly => SizeClass::Small,
            Personality::Neutral => SizeClass::Medium,
            Personality::Aggressive => SizeClass::Large,
            Personality::Boss => SizeClass::Giant,
        }
    }

    pub fn hit_points(self) -> u8 {
        match self {
            Personality::Friendly | Personality::Neutral => 1,
            Personality::Aggressive => 2,
            Personality::Boss => 3,
        }
    }

    /// Personalities the random override may pick for a classification tier
    pub fn override_pool(tier: Difficulty) -> &'static [Personality] {
        match tier {
            Difficulty::Easy | Difficulty::Medium => &[Personality::Friendly, Personality::Neutral],
            Difficulty::Hard => &[
                Personality::Neutral,
                Personality::Aggressive,
                Personality::Boss,
            ],
        }
    }
}

/// One falling arithmetic problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: u32,
    pub text: String,
    pub answer: f64,
    pub family: OperatorFamily,
    /// Top-left of the text, y grows downward
    pub pos: Vec2,
    /// Descent speed (px/s), always > 0
    pub speed: f32,
    pub difficulty: Difficulty,
    pub personality: Personality,
    pub size: SizeClass,
    pub hp: u8,
}

impl Problem {
    /// Approximate rendered width of the text
    pub fn text_width(&self) -> f32 {
        estimate_text_width(&self.text)
    }
}

pub fn estimate_text_width(text: &str) -> f32 {
    text.chars().count() as f32 * CHAR_WIDTH
}

/// Round to the answer precision
pub fn round_answer(value: f64) -> f64 {
    let scale = 10f64.powi(ANSWER_DECIMALS as i32);
    (value * scale).round() / scale
}

/// Roots 2..=20 squared
const PERFECT_SQUARES: [u32; 19] = [
    4, 9, 16, 25, 36, 49, 64, 81, 100, 121, 144, 169, 196, 225, 256, 289, 324, 361, 400,
];

/// Roots 2..=10 cubed
const PERFECT_CUBES: [u32; 9] = [8, 27, 64, 125, 216, 343, 512, 729, 1000];

/// Denominators whose fractions terminate within two decimals
const FRACTION_DENOMINATORS: [u32; 6] = [2, 4, 5, 10, 20, 25];

/// Builds problems for one wave/difficulty/viewport combination
#[derive(Debug, Clone, Copy)]
pub struct ProblemFactory<'a> {
    pub tuning: &'a Tuning,
    pub wave: u32,
    pub difficulty: Difficulty,
    /// Tier used for personality thresholds (may exceed `difficulty`)
    pub classification: Difficulty,
    pub viewport_width: f32,
}

impl ProblemFactory<'_> {
    /// Build one problem of the given family
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R, family: OperatorFamily, id: u32) -> Problem {
        let (text, answer) = self.expression(rng, family);
        let personality = self.classify(rng, family);
        let x = self.random_x(rng, &text);
        Problem {
            id,
            answer: round_answer(answer),
            family,
            pos: Vec2::new(x, self.tuning.spawn_y),
            speed: self.descent_speed(rng),
            difficulty: self.difficulty,
            personality,
            size: personality.size(),
            hp: personality.hit_points(),
            text,
        }
    }

    /// `(base + wave term + jitter) × difficulty multiplier`
    pub fn descent_speed<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let t = self.tuning;
        let raw = t.base_speed + self.wave as f32 * t.speed_per_wave + rng.random::<f32>() * t.speed_jitter;
        (raw * t.difficulty(self.difficulty).speed_multiplier).max(1.0)
    }

    /// Uniform x within `[margin, width - text width - margin]`
    pub fn random_x<R: Rng + ?Sized>(&self, rng: &mut R, text: &str) -> f32 {
        let margin = self.tuning.margin_for(self.viewport_width);
        let hi = self.viewport_width - estimate_text_width(text) - margin;
        if hi <= margin {
            margin
        } else {
            rng.random_range(margin..hi)
        }
    }

    /// Threshold classification with a random override
    pub fn classify<R: Rng + ?Sized>(&self, rng: &mut R, family: OperatorFamily) -> Personality {
        let tier = self.tuning.difficulty(self.classification);
        let score = family.complexity() + self.wave as f32 * self.tuning.complexity_per_wave;

        let by_score = if tier.boss_threshold.is_some_and(|b| score >= b) {
            Personality::Boss
        } else if tier.aggressive_threshold.is_some_and(|a| score >= a) {
            Personality::Aggressive
        } else if score >= tier.neutral_threshold {
            Personality::Neutral
        } else {
            Personality::Friendly
        };

        if rng.random_bool(tier.override_chance.clamp(0.0, 1.0)) {
            let pool = Personality::override_pool(self.classification);
            pool[rng.random_range(0..pool.len())]
        } else {
            by_score
        }
    }

    /// Operand upper bound: `(base + (wave-1) × per_wave) × magnitude`
    fn bound(&self, base: f32, per_wave: f32, min: u32, max: u32) -> u32 {
        let magnitude = self.tuning.difficulty(self.difficulty).magnitude_multiplier;
        let raw = (base + self.wave.saturating_sub(1) as f32 * per_wave) * magnitude;
        (raw.floor() as u32).clamp(min, max)
    }

    fn expression<R: Rng + ?Sized>(&self, rng: &mut R, family: OperatorFamily) -> (String, f64) {
        match family {
            OperatorFamily::Addition => {
                let hi = self.bound(10.0, 3.0, 2, 999);
                let a = rng.random_range(1..=hi);
                let b = rng.random_range(1..=hi);
                (format!("{a} + {b}"), (a + b) as f64)
            }
            OperatorFamily::Subtraction => {
                let hi = self.bound(12.0, 3.0, 3, 999);
                let a = rng.random_range(2..=hi);
                let b = rng.random_range(1..a);
                (format!("{a} - {b}"), (a - b) as f64)
            }
            OperatorFamily::Multiplication => {
                let hi = self.bound(9.0, 0.5, 3, 30);
                let a = rng.random_range(2..=hi);
                let b = rng.random_range(2..=hi);
                (format!("{a} × {b}"), (a * b) as f64)
            }
            OperatorFamily::Division => {
                let divisor = rng.random_range(2..=self.bound(6.0, 0.34, 2, 15));
                let quotient = rng.random_range(2..=self.bound(10.0, 0.5, 2, 40));
                let dividend = divisor * quotient;
                (format!("{dividend} ÷ {divisor}"), quotient as f64)
            }
            OperatorFamily::Exponent => {
                let roll = rng.random::<f32>();
                let (power, sup, hi) = if roll < 0.6 {
                    (2, '²', self.bound(6.0, 0.5, 3, 15))
                } else if roll < 0.9 {
                    (3, '³', self.bound(4.0, 0.25, 2, 9))
                } else {
                    (4, '⁴', self.bound(3.0, 0.15, 2, 6))
                };
                let base: u64 = rng.random_range(2..=hi as u64);
                (format!("{base}{sup}"), base.pow(power) as f64)
            }
            OperatorFamily::Root => {
                if self.wave >= 3 && rng.random_bool(0.3) {
                    let max_root = self.bound(4.0, 0.25, 3, 10);
                    let root = rng.random_range(2..=max_root);
                    (format!("∛{}", PERFECT_CUBES[root as usize - 2]), root as f64)
                } else {
                    let max_root = self.bound(8.0, 0.5, 3, 20);
                    let root = rng.random_range(2..=max_root);
                    (format!("√{}", PERFECT_SQUARES[root as usize - 2]), root as f64)
                }
            }
            OperatorFamily::Fraction => {
                let pick = |rng: &mut R| {
                    let d = FRACTION_DENOMINATORS[rng.random_range(0..FRACTION_DENOMINATORS.len())];
                    let n = rng.random_range(1..d * 2);
                    (n, d)
                };
                let (n1, d1) = pick(&mut *rng);
                let sum_chance = (0.2 + self.wave as f64 * 0.05).min(0.7);
                if rng.random_bool(sum_chance) {
                    let (n2, d2) = pick(&mut *rng);
                    let value = n1 as f64 / d1 as f64 + n2 as f64 / d2 as f64;
                    (format!("{n1}/{d1} + {n2}/{d2}"), value)
                } else {
                    (format!("{n1}/{d1}"), n1 as f64 / d1 as f64)
                }
            }
            OperatorFamily::Decimal => {
                let hi = self.bound(50.0, 5.0, 12, 999);
                let mut a = rng.random_range(11..=hi);
                if a % 10 == 0 {
                    a += 1;
                }
                let mut b = rng.random_range(1..a);
                if b % 10 == 0 {
                    b += 1;
                }
                let k = rng.random_range(2..=9u32);
                let (text, tenths) = match rng.random_range(0..4) {
                    0 => (format!("{} + {}", tenths_str(a), tenths_str(b)), a + b),
                    1 if b < a => (format!("{} - {}", tenths_str(a), tenths_str(b)), a - b),
                    1 | 2 => (format!("{} × {k}", tenths_str(a)), a * k),
                    _ => (
                        format!("{} + {} × {k}", tenths_str(a), tenths_str(b)),
                        a + b * k,
                    ),
                };
                (text, tenths as f64 / 10.0)
            }
            OperatorFamily::Complex => {
                let hi = self.bound(12.0, 1.0, 5, 60);
                let small = self.bound(6.0, 0.25, 3, 12);
                let a = rng.random_range(2..=hi);
                let b = rng.random_range(2..=hi);
                let c = rng.random_range(2..=small);
                match rng.random_range(0..5) {
                    0 => {
                        let c = rng.random_range(1..a + b);
                        (format!("({a} + {b}) - {c}"), (a + b - c) as f64)
                    }
                    1 => (format!("{a} + {b} × {c}"), (a + b * c) as f64),
                    2 => (format!("({a} + {b}) × {c}"), ((a + b) * c) as f64),
                    3 => {
                        let d = rng.random_range(1..a * c);
                        (format!("{a} × {c} - {d}"), (a * c - d) as f64)
                    }
                    _ => {
                        let d = rng.random_range(2..=small);
                        (format!("{a} × {c} + {b} × {d}"), (a * c + b * d) as f64)
                    }
                }
            }
        }
    }
}

fn tenths_str(tenths: u32) -> String {
    format!("{}.{}", tenths / 10, tenths % 10)
}
