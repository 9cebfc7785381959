//! In-game calendar - seasons, shichen cycle, weather and the advance rules
//!
//! One shichen is the smallest unit of time advancement. Twelve shichen make
//! a day, thirty days a season, four seasons a year. Weather is re-rolled
//! from a per-season probability table whenever a new day begins.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The four seasons, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Xuan,
    Ha,
    Thu,
    Dong,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Xuan, Season::Ha, Season::Thu, Season::Dong];

    pub fn display_name(&self) -> &'static str {
        match self {
            Season::Xuan => "Xuân",
            Season::Ha => "Hạ",
            Season::Thu => "Thu",
            Season::Dong => "Đông",
        }
    }

    /// The season that follows this one (Đông wraps back to Xuân)
    pub fn next(&self) -> Season {
        match self {
            Season::Xuan => Season::Ha,
            Season::Ha => Season::Thu,
            Season::Thu => Season::Dong,
            Season::Dong => Season::Xuan,
        }
    }

    /// Weighted weather table for this season (weights sum to 100)
    fn weather_table(&self) -> &'static [(Weather, u32)] {
        match self {
            Season::Xuan => &[(Weather::Nang, 40), (Weather::MuaPhun, 40), (Weather::AmU, 20)],
            Season::Ha => &[(Weather::Nang, 50), (Weather::Mua, 30), (Weather::Bao, 20)],
            Season::Thu => &[(Weather::AmU, 40), (Weather::Nang, 40), (Weather::Mua, 20)],
            Season::Dong => &[(Weather::AmU, 50), (Weather::Tuyet, 30), (Weather::Nang, 20)],
        }
    }

    /// Roll weather for a new day in this season
    pub fn roll_weather<R: Rng>(&self, rng: &mut R) -> Weather {
        let mut pick = rng.gen_range(0..100u32);
        for (weather, weight) in self.weather_table() {
            if pick < *weight {
                return *weather;
            }
            pick -= weight;
        }
        // Weights sum to 100, so the loop always returns
        Weather::Nang
    }
}

/// The twelve traditional two-hour blocks of a day, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shichen {
    Ty,
    Suu,
    Dan,
    Mao,
    Thin,
    Ti,
    Ngo,
    Mui,
    Than,
    Dau,
    Tuat,
    Hoi,
}

impl Shichen {
    pub const ALL: [Shichen; 12] = [
        Shichen::Ty,
        Shichen::Suu,
        Shichen::Dan,
        Shichen::Mao,
        Shichen::Thin,
        Shichen::Ti,
        Shichen::Ngo,
        Shichen::Mui,
        Shichen::Than,
        Shichen::Dau,
        Shichen::Tuat,
        Shichen::Hoi,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Shichen::Ty => "Tý",
            Shichen::Suu => "Sửu",
            Shichen::Dan => "Dần",
            Shichen::Mao => "Mão",
            Shichen::Thin => "Thìn",
            Shichen::Ti => "Tỵ",
            Shichen::Ngo => "Ngọ",
            Shichen::Mui => "Mùi",
            Shichen::Than => "Thân",
            Shichen::Dau => "Dậu",
            Shichen::Tuat => "Tuất",
            Shichen::Hoi => "Hợi",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    /// The shichen that follows this one, wrapping Hợi back to Tý
    pub fn next(&self) -> Shichen {
        Self::ALL[(self.index() + 1) % 12]
    }

    /// Broad time-of-day bucket, derived from the shichen index
    pub fn time_of_day(&self) -> TimeOfDay {
        match self {
            Shichen::Hoi | Shichen::Ty | Shichen::Suu => TimeOfDay::Dem,
            Shichen::Dan | Shichen::Mao | Shichen::Thin => TimeOfDay::Sang,
            Shichen::Ti | Shichen::Ngo | Shichen::Mui => TimeOfDay::Trua,
            Shichen::Than | Shichen::Dau | Shichen::Tuat => TimeOfDay::Chieu,
        }
    }
}

/// Coarse time-of-day, derived from the current shichen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Sang,
    Trua,
    Chieu,
    Dem,
}

impl TimeOfDay {
    pub fn display_name(&self) -> &'static str {
        match self {
            TimeOfDay::Sang => "Buổi sáng",
            TimeOfDay::Trua => "Buổi trưa",
            TimeOfDay::Chieu => "Buổi chiều",
            TimeOfDay::Dem => "Ban đêm",
        }
    }
}

/// Weather conditions rolled per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weather {
    Nang,
    AmU,
    MuaPhun,
    Mua,
    Bao,
    Tuyet,
}

impl Weather {
    pub fn display_name(&self) -> &'static str {
        match self {
            Weather::Nang => "Nắng",
            Weather::AmU => "Âm u",
            Weather::MuaPhun => "Mưa phùn",
            Weather::Mua => "Mưa",
            Weather::Bao => "Bão",
            Weather::Tuyet => "Tuyết",
        }
    }
}

/// What a call to [`GameDate::advance`] rolled over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub month_passed: bool,
    pub year_passed: bool,
}

/// The in-game clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDate {
    pub era: String,
    pub year: u32,
    pub season: Season,
    /// Day of the season, always in `[1, 30]`
    pub day: u8,
    pub shichen: Shichen,
    pub weather: Weather,
    pub action_points: u32,
    pub max_action_points: u32,
}

impl GameDate {
    pub fn new(era: impl Into<String>, year: u32, max_action_points: u32) -> Self {
        Self {
            era: era.into(),
            year,
            season: Season::Xuan,
            day: 1,
            shichen: Shichen::Ty,
            weather: Weather::Nang,
            action_points: max_action_points,
            max_action_points,
        }
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.shichen.time_of_day()
    }

    /// Advance the clock by `steps` shichen.
    ///
    /// Each step moves the shichen cycle by one; a Hợi→Tý wrap begins a new
    /// day and re-rolls the weather for the current season. A day past 30
    /// wraps to 1 and advances the season, and a Đông→Xuân wrap advances the
    /// year. Action points are restored to the maximum once per call,
    /// however many steps were taken (including zero).
    pub fn advance<R: Rng>(&mut self, steps: u32, rng: &mut R) -> AdvanceOutcome {
        let mut outcome = AdvanceOutcome::default();

        for _ in 0..steps {
            self.shichen = self.shichen.next();
            if self.shichen == Shichen::Ty {
                self.day += 1;
                self.weather = self.season.roll_weather(rng);
                if self.day > 30 {
                    self.day = 1;
                    outcome.month_passed = true;
                    self.season = self.season.next();
                    if self.season == Season::Xuan {
                        self.year += 1;
                        outcome.year_passed = true;
                    }
                }
            }
        }

        self.action_points = self.max_action_points;
        outcome
    }
}

impl std::fmt::Display for GameDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} năm {}, {} ngày {}, giờ {} ({})",
            self.era,
            self.year,
            self.season.display_name(),
            self.day,
            self.shichen.display_name(),
            self.weather.display_name(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn single_step_moves_one_shichen() {
        let mut date = GameDate::new("Thiên Nguyên", 1, 3);
        let outcome = date.advance(1, &mut rng());
        assert_eq!(date.shichen, Shichen::Suu);
        assert_eq!(date.day, 1);
        assert!(!outcome.month_passed);
        assert!(!outcome.year_passed);
    }

    #[test]
    fn shichen_wrap_begins_a_new_day() {
        let mut date = GameDate::new("Thiên Nguyên", 1, 3);
        date.shichen = Shichen::Hoi;
        date.advance(1, &mut rng());
        assert_eq!(date.shichen, Shichen::Ty);
        assert_eq!(date.day, 2);
    }

    #[test]
    fn day_stays_in_range_over_a_long_run() {
        let mut date = GameDate::new("Thiên Nguyên", 1, 3);
        let mut r = rng();
        for _ in 0..500 {
            date.advance(1, &mut r);
            assert!((1..=30).contains(&date.day));
        }
    }

    #[test]
    fn seasons_cycle_in_order() {
        let mut season = Season::Xuan;
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(season.display_name());
            season = season.next();
        }
        assert_eq!(seen, ["Xuân", "Hạ", "Thu", "Đông", "Xuân"]);
    }

    #[test]
    fn shichen_cycle_returns_to_start_after_twelve() {
        let mut shichen = Shichen::Ty;
        for _ in 0..12 {
            shichen = shichen.next();
        }
        assert_eq!(shichen, Shichen::Ty);
    }

    #[test]
    fn last_shichen_of_the_year_rolls_everything_over() {
        let mut date = GameDate::new("Thiên Nguyên", 5, 4);
        date.season = Season::Dong;
        date.day = 30;
        date.shichen = Shichen::Hoi;
        date.action_points = 0;

        let outcome = date.advance(1, &mut rng());

        assert_eq!(date.day, 1);
        assert_eq!(date.season, Season::Xuan);
        assert_eq!(date.year, 6);
        assert_eq!(date.action_points, date.max_action_points);
        assert!(outcome.month_passed);
        assert!(outcome.year_passed);
    }

    #[test]
    fn action_points_reset_once_per_call_even_with_zero_steps() {
        let mut date = GameDate::new("Thiên Nguyên", 1, 5);
        date.action_points = 1;
        let before = date.shichen;
        date.advance(0, &mut rng());
        assert_eq!(date.shichen, before);
        assert_eq!(date.action_points, 5);
    }

    #[test]
    fn weather_tables_cover_their_full_range() {
        let mut r = rng();
        for season in Season::ALL {
            for _ in 0..50 {
                let _ = season.roll_weather(&mut r);
            }
        }
    }
}
